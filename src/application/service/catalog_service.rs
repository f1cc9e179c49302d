use std::sync::Arc;
use tracing::info;

use crate::application::service::require_admin;
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{Book, BookId, BookQuery, Caller, Money};
use crate::domain::port::{BookRepository, UnitOfWorkFactory};

/// 新規書籍の入力
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub domain: String,
    pub price: Money,
    pub stock_quantity: u32,
}

/// 書籍情報の部分更新（指定された項目のみ変更）
#[derive(Debug, Clone, Default)]
pub struct BookRevision {
    pub title: Option<String>,
    pub author: Option<String>,
    pub domain: Option<String>,
    pub price: Option<Money>,
}

/// カタログサービス
/// 書籍の登録・更新・入荷・削除と参照を提供する
pub struct CatalogService {
    book_repository: Arc<dyn BookRepository>,
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl CatalogService {
    pub fn new(
        book_repository: Arc<dyn BookRepository>,
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
    ) -> Self {
        Self {
            book_repository,
            unit_of_work_factory,
        }
    }

    /// 書籍を登録する（管理者のみ）
    pub async fn add_book(&self, caller: &Caller, new_book: NewBook) -> Result<Book, ApplicationError> {
        require_admin(caller, "書籍の登録")?;

        let book = Book::new(
            BookId::new(),
            new_book.title,
            new_book.author,
            new_book.domain,
            new_book.price,
            new_book.stock_quantity,
        )?;
        self.book_repository.save(&book).await?;

        info!(book_id = %book.id(), stock = book.stock_quantity(), "書籍を登録しました");
        Ok(book)
    }

    /// 書籍情報を更新する（管理者のみ）
    /// 価格を変更しても既存注文の購入時価格には影響しない
    ///
    /// 書籍行をロックした状態で読み取り・更新するため、
    /// 並行する更新が互いの変更を上書きすることはない
    pub async fn revise_book(
        &self,
        caller: &Caller,
        book_id: BookId,
        revision: BookRevision,
    ) -> Result<Book, ApplicationError> {
        require_admin(caller, "書籍情報の更新")?;

        let mut uow = self.unit_of_work_factory.begin().await?;
        let mut book = uow
            .find_book_for_update(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id)))?;

        book.revise(revision.title, revision.author, revision.domain, revision.price)?;
        uow.update_book_details(&book).await?;
        uow.commit().await?;

        info!(book_id = %book_id, price = book.price().amount(), "書籍情報を更新しました");
        Ok(book)
    }

    /// 在庫を追加する（管理者のみ）
    pub async fn restock(
        &self,
        caller: &Caller,
        book_id: BookId,
        quantity: u32,
    ) -> Result<Book, ApplicationError> {
        require_admin(caller, "在庫の追加")?;

        let mut uow = self.unit_of_work_factory.begin().await?;
        let mut book = uow
            .find_book_for_update(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id)))?;

        book.release(quantity)?;
        uow.adjust_stock(book_id, i64::from(quantity)).await?;
        uow.commit().await?;

        info!(book_id = %book_id, quantity, stock = book.stock_quantity(), "在庫を追加しました");
        Ok(book)
    }

    /// 書籍を削除する（管理者のみ）
    /// 未完了（PLACED/CONFIRMED/SHIPPED）の注文が参照している間は削除できない
    pub async fn delete_book(&self, caller: &Caller, book_id: BookId) -> Result<(), ApplicationError> {
        require_admin(caller, "書籍の削除")?;

        let mut uow = self.unit_of_work_factory.begin().await?;
        uow.find_book_for_update(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id)))?;

        let open_orders = uow.count_open_orders_for_book(book_id).await?;
        if open_orders > 0 {
            return Err(DomainError::BookHasOpenOrders(book_id).into());
        }

        uow.delete_book(book_id).await?;
        uow.commit().await?;

        info!(book_id = %book_id, "書籍を削除しました");
        Ok(())
    }

    /// 書籍IDで書籍を取得
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, ApplicationError> {
        self.book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id)))
    }

    /// 検索条件に一致する書籍を取得
    pub async fn list_books(&self, query: &BookQuery) -> Result<Vec<Book>, ApplicationError> {
        self.book_repository
            .search(query)
            .await
            .map_err(ApplicationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryStore;
    use crate::application::service::OrderLifecycleService;
    use crate::domain::model::{UserId, UserRole};

    fn admin() -> Caller {
        Caller::new(UserId::new(), UserRole::Admin)
    }

    fn new_book(stock: u32) -> NewBook {
        NewBook {
            title: "それから".to_string(),
            author: "夏目漱石".to_string(),
            domain: "文学".to_string(),
            price: Money::jpy(100),
            stock_quantity: stock,
        }
    }

    fn services() -> (CatalogService, OrderLifecycleService) {
        let store = Arc::new(InMemoryStore::new());
        (
            CatalogService::new(store.clone(), store.clone()),
            OrderLifecycleService::new(store),
        )
    }

    #[tokio::test]
    async fn test_add_book_requires_admin() {
        let (catalog, _) = services();
        let customer = Caller::new(UserId::new(), UserRole::Customer);
        assert!(matches!(
            catalog.add_book(&customer, new_book(1)).await,
            Err(ApplicationError::Unauthorized(_))
        ));
        assert!(catalog
            .list_books(&BookQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_revise_book_does_not_touch_stock() {
        let (catalog, lifecycle) = services();
        let book = catalog.add_book(&admin(), new_book(5)).await.unwrap();
        let customer = Caller::new(UserId::new(), UserRole::Customer);
        lifecycle.place_order(book.id(), 2, &customer).await.unwrap();

        let revised = catalog
            .revise_book(
                &admin(),
                book.id(),
                BookRevision {
                    price: Some(Money::jpy(250)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(revised.price(), Money::jpy(250));
        assert_eq!(revised.stock_quantity(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_revisions_of_different_fields_both_persist() {
        let (catalog, _) = services();
        let catalog = Arc::new(catalog);
        let book = catalog.add_book(&admin(), new_book(5)).await.unwrap();

        let revisions = [
            BookRevision {
                title: Some("門".to_string()),
                ..Default::default()
            },
            BookRevision {
                price: Some(Money::jpy(900)),
                ..Default::default()
            },
        ];
        let mut handles = Vec::new();
        for revision in revisions {
            let catalog = catalog.clone();
            let book_id = book.id();
            handles.push(tokio::spawn(async move {
                catalog.revise_book(&admin(), book_id, revision).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = catalog.get_book(book.id()).await.unwrap();
        assert_eq!(stored.title(), "門");
        assert_eq!(stored.price(), Money::jpy(900));
        assert_eq!(stored.stock_quantity(), 5);
    }

    #[tokio::test]
    async fn test_revise_unknown_book() {
        let (catalog, _) = services();
        let result = catalog
            .revise_book(&admin(), BookId::new(), BookRevision::default())
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_books_applies_query() {
        use crate::domain::model::{BookSortKey, SortOrder};

        let (catalog, _) = services();
        for (title, domain, price) in [
            ("坑夫", "小説", 400),
            ("文学論", "評論", 1200),
            ("野分", "小説", 600),
        ] {
            catalog
                .add_book(
                    &admin(),
                    NewBook {
                        title: title.to_string(),
                        domain: domain.to_string(),
                        price: Money::jpy(price),
                        ..new_book(1)
                    },
                )
                .await
                .unwrap();
        }

        let query = BookQuery::new(
            Some("小説".to_string()),
            None,
            BookSortKey::Price,
            SortOrder::Desc,
        )
        .unwrap();
        let books = catalog.list_books(&query).await.unwrap();
        let titles: Vec<&str> = books.iter().map(|book| book.title()).collect();
        assert_eq!(titles, vec!["野分", "坑夫"]);
    }

    #[tokio::test]
    async fn test_restock() {
        let (catalog, _) = services();
        let book = catalog.add_book(&admin(), new_book(1)).await.unwrap();
        let restocked = catalog.restock(&admin(), book.id(), 4).await.unwrap();
        assert_eq!(restocked.stock_quantity(), 5);
        assert_eq!(catalog.get_book(book.id()).await.unwrap().stock_quantity(), 5);
    }

    #[tokio::test]
    async fn test_delete_book_with_open_order_is_rejected() {
        let (catalog, lifecycle) = services();
        let book = catalog.add_book(&admin(), new_book(5)).await.unwrap();
        let customer = Caller::new(UserId::new(), UserRole::Customer);
        let order = lifecycle.place_order(book.id(), 1, &customer).await.unwrap();

        let result = catalog.delete_book(&admin(), book.id()).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::BookHasOpenOrders(_)))
        ));

        // 終端状態になれば削除できる
        lifecycle
            .transition_order(order.id(), "CANCELLED", &admin())
            .await
            .unwrap();
        catalog.delete_book(&admin(), book.id()).await.unwrap();
        assert!(matches!(
            catalog.get_book(book.id()).await,
            Err(ApplicationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_book() {
        let (catalog, _) = services();
        assert!(matches!(
            catalog.delete_book(&admin(), BookId::new()).await,
            Err(ApplicationError::NotFound(_))
        ));
    }
}
