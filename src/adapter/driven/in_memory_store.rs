use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::model::{
    Book, BookId, BookQuery, Order, OrderId, OrderStatus, Sale, User, UserId,
};
use crate::domain::port::{
    BookRepository, OrderRepository, RepositoryError, SaleRepository, UnitOfWork,
    UnitOfWorkFactory, UserRepository,
};

#[derive(Debug, Default, Clone)]
struct StoreState {
    books: HashMap<BookId, Book>,
    orders: HashMap<OrderId, Order>,
    sales: Vec<Sale>,
    users: HashMap<UserId, User>,
}

/// インメモリストア
/// すべてのポートを1つの状態で実装する（テスト、`STORAGE_BACKEND=memory`用）
///
/// 作業単位は開始からコミット・破棄までストア全体のロックを保持し、
/// 作業用のコピーに書き込む。コミット時のみコピーを書き戻す。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 次のコミットを失敗させる（ロールバックの検証用）
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

/// インメモリ作業単位
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
    fail_commit: Arc<AtomicBool>,
}

fn stored_copy(order: &Order) -> Order {
    let mut copy = order.clone();
    copy.take_domain_events();
    copy
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            working,
            fail_commit: self.fail_next_commit.clone(),
        }))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_book_for_update(
        &mut self,
        book_id: BookId,
    ) -> Result<Option<Book>, RepositoryError> {
        Ok(self.working.books.get(&book_id).cloned())
    }

    async fn adjust_stock(&mut self, book_id: BookId, delta: i64) -> Result<(), RepositoryError> {
        let book = self.working.books.get(&book_id).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("書籍が存在しません: {}", book_id))
        })?;

        let adjusted = i64::from(book.stock_quantity()) + delta;
        let adjusted = u32::try_from(adjusted).map_err(|_| {
            RepositoryError::Conflict(format!(
                "在庫数が範囲外になる更新は拒否されました: {} ({:+})",
                book_id, delta
            ))
        })?;

        let updated = Book::reconstruct(
            book.id(),
            book.title().to_string(),
            book.author().to_string(),
            book.domain().to_string(),
            book.price(),
            adjusted,
            book.created_at(),
        );
        self.working.books.insert(book_id, updated);
        Ok(())
    }

    async fn count_open_orders_for_book(
        &mut self,
        book_id: BookId,
    ) -> Result<u64, RepositoryError> {
        let count = self
            .working
            .orders
            .values()
            .filter(|order| order.book_id() == book_id && !order.status().is_terminal())
            .count();
        Ok(count as u64)
    }

    async fn update_book_details(&mut self, book: &Book) -> Result<(), RepositoryError> {
        let existing = self.working.books.get(&book.id()).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("書籍が存在しません: {}", book.id()))
        })?;

        let updated = Book::reconstruct(
            book.id(),
            book.title().to_string(),
            book.author().to_string(),
            book.domain().to_string(),
            book.price(),
            existing.stock_quantity(),
            existing.created_at(),
        );
        self.working.books.insert(book.id(), updated);
        Ok(())
    }

    async fn delete_book(&mut self, book_id: BookId) -> Result<(), RepositoryError> {
        self.working.books.remove(&book_id);
        Ok(())
    }

    async fn find_order_for_update(
        &mut self,
        order_id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self.working.orders.get(&order_id).cloned())
    }

    async fn create_order(&mut self, order: &Order) -> Result<(), RepositoryError> {
        if self.working.orders.contains_key(&order.id()) {
            return Err(RepositoryError::Conflict(format!(
                "注文IDが重複しています: {}",
                order.id()
            )));
        }
        self.working.orders.insert(order.id(), stored_copy(order));
        Ok(())
    }

    async fn set_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let order = self.working.orders.get(&order_id).ok_or_else(|| {
            RepositoryError::OperationFailed(format!("注文が存在しません: {}", order_id))
        })?;

        let updated = Order::reconstruct(
            order.id(),
            order.book_id(),
            order.user_id(),
            order.quantity(),
            order.price_at_purchase(),
            status,
            order.created_at(),
        )
        .map_err(|e| RepositoryError::OperationFailed(e.to_string()))?;
        self.working.orders.insert(order_id, updated);
        Ok(())
    }

    async fn append_sale(&mut self, sale: &Sale) -> Result<(), RepositoryError> {
        if self
            .working
            .sales
            .iter()
            .any(|existing| existing.order_id() == sale.order_id())
        {
            return Err(RepositoryError::Conflict(format!(
                "注文の売上記録は既に存在します: {}",
                sale.order_id()
            )));
        }
        self.working.sales.push(sale.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryUnitOfWork {
            mut guard,
            working,
            fail_commit,
        } = *self;

        if fail_commit.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::OperationFailed(
                "コミットに失敗しました".to_string(),
            ));
        }

        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryStore {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = match state.books.get(&book.id()) {
            // 既存の書籍は在庫数を保持したままカタログ情報のみ更新
            Some(existing) => Book::reconstruct(
                book.id(),
                book.title().to_string(),
                book.author().to_string(),
                book.domain().to_string(),
                book.price(),
                existing.stock_quantity(),
                existing.created_at(),
            ),
            None => book.clone(),
        };
        state.books.insert(book.id(), stored);
        Ok(())
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.books.get(&book_id).cloned())
    }

    async fn search(&self, query: &BookQuery) -> Result<Vec<Book>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(query.apply(state.books.values().cloned()))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.user_id() == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }
}

#[async_trait]
impl SaleRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Sale>, RepositoryError> {
        let state = self.state.lock().await;
        let mut sales: Vec<Sale> = state.sales.iter().rev().cloned().collect();
        // 安定ソートなので同日の記録は追記の新しい順のまま
        sales.sort_by(|a, b| b.sale_date().cmp(&a.sale_date()));
        Ok(sales)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|existing| existing.username() == user.username() && existing.id() != user.id())
        {
            return Err(RepositoryError::Conflict(format!(
                "ユーザー名が重複しています: {}",
                user.username()
            )));
        }
        state.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|user| user.username() == username)
            .cloned())
    }
}
