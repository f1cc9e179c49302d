// 駆動される側アダプター（リポジトリ・作業単位の実装）

mod book_repository;
mod in_memory_store;
mod mysql_row;
mod order_repository;
mod sale_repository;
mod unit_of_work;
mod user_repository;

pub use book_repository::MySqlBookRepository;
pub use in_memory_store::{InMemoryStore, InMemoryUnitOfWork};
pub use order_repository::MySqlOrderRepository;
pub use sale_repository::MySqlSaleRepository;
pub use unit_of_work::{MySqlUnitOfWork, MySqlUnitOfWorkFactory};
pub use user_repository::MySqlUserRepository;
