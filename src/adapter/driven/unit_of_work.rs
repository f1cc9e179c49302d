use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_row::{book_from_row, order_from_row, BOOK_COLUMNS, ORDER_COLUMNS};
use crate::domain::model::{Book, BookId, Order, OrderId, OrderStatus, Sale};
use crate::domain::port::{RepositoryError, UnitOfWork, UnitOfWorkFactory};
use async_trait::async_trait;
use sqlx::{MySql, Pool, Row, Transaction};

/// MySQL作業単位ファクトリ
/// 作業単位ごとに1つのトランザクションを開始する
#[derive(Clone)]
pub struct MySqlUnitOfWorkFactory {
    pool: Pool<MySql>,
}

impl MySqlUnitOfWorkFactory {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for MySqlUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                DatabaseError::ConnectionError(format!("トランザクション開始に失敗しました: {}", e))
            })
            .map_err(RepositoryError::from)?;

        Ok(Box::new(MySqlUnitOfWork { tx }))
    }
}

/// MySQL作業単位
///
/// `SELECT ... FOR UPDATE`で行ロックを取得し、同じ書籍・注文への並行する書き込みを直列化する。
/// コミットされずに破棄されたトランザクションはsqlxによってロールバックされる。
pub struct MySqlUnitOfWork {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl UnitOfWork for MySqlUnitOfWork {
    async fn find_book_for_update(
        &mut self,
        book_id: BookId,
    ) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM books WHERE id = ? FOR UPDATE",
            BOOK_COLUMNS
        ))
        .bind(book_id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("書籍のロック取得に失敗しました", e))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(book_from_row).transpose()
    }

    async fn adjust_stock(&mut self, book_id: BookId, delta: i64) -> Result<(), RepositoryError> {
        // 結果が0未満、またはINT UNSIGNEDの範囲外になる更新は行わない
        let result = sqlx::query(
            r#"
            UPDATE books
            SET stock_quantity = CAST(stock_quantity AS SIGNED) + ?
            WHERE id = ?
              AND CAST(stock_quantity AS SIGNED) + ? BETWEEN 0 AND 4294967295
            "#,
        )
        .bind(delta)
        .bind(book_id.to_string())
        .bind(delta)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("在庫数の更新に失敗しました", e))
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "書籍 {} の在庫数を {} だけ変更できません",
                book_id, delta
            )));
        }

        Ok(())
    }

    async fn count_open_orders_for_book(
        &mut self,
        book_id: BookId,
    ) -> Result<u64, RepositoryError> {
        let open: Vec<&'static str> = OrderStatus::ALL
            .iter()
            .filter(|status| !status.is_terminal())
            .map(|status| status.as_str())
            .collect();
        let placeholders = vec!["?"; open.len()].join(", ");

        let sql = format!(
            "SELECT COUNT(*) AS open_orders FROM orders WHERE book_id = ? AND status IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(book_id.to_string());
        for status in open {
            query = query.bind(status);
        }

        let row = query
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("未完了注文数の取得に失敗しました", e))
            .map_err(RepositoryError::from)?;

        let count: i64 = row.try_get("open_orders").map_err(|e| {
            RepositoryError::FetchFailed(format!("未完了注文数の読み取りに失敗しました: {}", e))
        })?;
        Ok(count.max(0) as u64)
    }

    async fn update_book_details(&mut self, book: &Book) -> Result<(), RepositoryError> {
        // 在庫数は作業単位のadjust_stockでのみ変化する
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = ?, author = ?, domain = ?, price_amount = ?, price_currency = ?
            WHERE id = ?
            "#,
        )
        .bind(book.title())
        .bind(book.author())
        .bind(book.domain())
        .bind(book.price().amount())
        .bind(book.price().currency())
        .bind(book.id().to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("書籍情報の更新に失敗しました", e))
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OperationFailed(format!(
                "書籍 {} の情報を更新できませんでした",
                book.id()
            )));
        }

        Ok(())
    }

    async fn delete_book(&mut self, book_id: BookId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(book_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("書籍の削除に失敗しました", e))
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_order_for_update(
        &mut self,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE id = ? FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(order_id.to_string())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("注文のロック取得に失敗しました", e))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn create_order(&mut self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, book_id, user_id, quantity, price_at_purchase_amount, price_at_purchase_currency, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.book_id().to_string())
        .bind(order.user_id().to_string())
        .bind(order.quantity())
        .bind(order.price_at_purchase().amount())
        .bind(order.price_at_purchase().currency())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("注文の保存に失敗しました", e))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn set_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(order_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("注文ステータスの更新に失敗しました", e))
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OperationFailed(format!(
                "注文 {} のステータスを更新できませんでした",
                order_id
            )));
        }

        Ok(())
    }

    async fn append_sale(&mut self, sale: &Sale) -> Result<(), RepositoryError> {
        // order_idの一意制約により、同じ注文の売上は2件目以降Conflictになる
        sqlx::query(
            r#"
            INSERT INTO sales (id, order_id, book_id, quantity, price_at_sale_amount, price_at_sale_currency, domain, sale_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.id().to_string())
        .bind(sale.order_id().to_string())
        .bind(sale.book_id().to_string())
        .bind(sale.quantity())
        .bind(sale.price_at_sale().amount())
        .bind(sale.price_at_sale().currency())
        .bind(sale.domain())
        .bind(sale.sale_date())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_sqlx("売上記録の保存に失敗しました", e))
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MySqlUnitOfWork { tx } = *self;
        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("トランザクションのコミットに失敗しました", e))
            .map_err(RepositoryError::from)
    }
}
