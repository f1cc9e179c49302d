// ドメインモデル（エンティティと値オブジェクト）

mod value_objects;
mod book;
mod book_query;
mod order;
mod sale;
mod user;

pub use value_objects::{
    OrderId, BookId, UserId, SaleId,
    Money,
    OrderStatus,
};

pub use book::Book;
pub use book_query::{BookQuery, BookSortKey, SortOrder};
pub use order::Order;
pub use sale::Sale;
pub use user::{Caller, User, UserRole};
