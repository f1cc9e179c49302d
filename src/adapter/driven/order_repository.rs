use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_row::{order_from_row, ORDER_COLUMNS};
use crate::domain::model::{Order, OrderId, UserId};
use crate::domain::port::{OrderRepository, RepositoryError};
use async_trait::async_trait;

use sqlx::{MySql, Pool};

/// MySQL注文リポジトリ（読み取り側）
/// 注文の作成・ステータス更新は作業単位（`MySqlUnitOfWork`）を通す
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: Pool<MySql>,
}

impl MySqlOrderRepository {
    /// 新しいMySQL注文リポジトリを作成
    ///
    /// # Arguments
    /// * `pool` - MySQLコネクションプール
    ///
    /// # Returns
    /// * MySqlOrderRepositoryのインスタンス
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for MySqlOrderRepository {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS))
            .bind(order_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("注文の取得に失敗しました", e))
            .map_err(RepositoryError::from)?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        // 作成日時の降順で並べる
        let rows = sqlx::query(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC, id ASC",
            ORDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("注文一覧の取得に失敗しました", e))
        .map_err(RepositoryError::from)?;

        rows.iter().map(order_from_row).collect()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE user_id = ? ORDER BY created_at DESC, id ASC",
            ORDER_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("ユーザー別注文一覧の取得に失敗しました", e))
        .map_err(RepositoryError::from)?;

        rows.iter().map(order_from_row).collect()
    }
}
