// MySQLの行からドメインオブジェクトを再構築する

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::Row;

use crate::domain::model::{
    Book, BookId, Money, Order, OrderId, OrderStatus, Sale, SaleId, User, UserId, UserRole,
};
use crate::domain::port::RepositoryError;

pub(super) const BOOK_COLUMNS: &str =
    "id, title, author, domain, price_amount, price_currency, stock_quantity, created_at";

pub(super) const ORDER_COLUMNS: &str = "id, book_id, user_id, quantity, price_at_purchase_amount, price_at_purchase_currency, status, created_at";

pub(super) const SALE_COLUMNS: &str = "id, order_id, book_id, quantity, price_at_sale_amount, price_at_sale_currency, domain, sale_date";

pub(super) const USER_COLUMNS: &str = "id, username, role, is_active";

fn column<'r, T>(row: &'r MySqlRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::FetchFailed(format!("列 {} の読み取りに失敗しました: {}", name, e)))
}

fn money(row: &MySqlRow, amount: &str, currency: &str) -> Result<Money, RepositoryError> {
    Money::new(column(row, amount)?, column(row, currency)?)
        .map_err(|e| RepositoryError::FetchFailed(format!("金額の構築に失敗しました: {}", e)))
}

pub(super) fn book_from_row(row: &MySqlRow) -> Result<Book, RepositoryError> {
    let id = BookId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e)))?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    Ok(Book::reconstruct(
        id,
        column(row, "title")?,
        column(row, "author")?,
        column(row, "domain")?,
        money(row, "price_amount", "price_currency")?,
        column(row, "stock_quantity")?,
        created_at,
    ))
}

pub(super) fn order_from_row(row: &MySqlRow) -> Result<Order, RepositoryError> {
    let id = OrderId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("注文IDの解析に失敗しました: {}", e)))?;
    let book_id = BookId::from_string(&column::<String>(row, "book_id")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e)))?;
    let user_id = UserId::from_string(&column::<String>(row, "user_id")?).map_err(|e| {
        RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
    })?;
    let status = OrderStatus::from_string(&column::<String>(row, "status")?).map_err(|e| {
        RepositoryError::FetchFailed(format!("注文ステータスの解析に失敗しました: {}", e))
    })?;
    let created_at: DateTime<Utc> = column(row, "created_at")?;

    Order::reconstruct(
        id,
        book_id,
        user_id,
        column(row, "quantity")?,
        money(row, "price_at_purchase_amount", "price_at_purchase_currency")?,
        status,
        created_at,
    )
    .map_err(|e| RepositoryError::FetchFailed(format!("注文の再構築に失敗しました: {}", e)))
}

pub(super) fn sale_from_row(row: &MySqlRow) -> Result<Sale, RepositoryError> {
    let id = SaleId::from_string(&column::<String>(row, "id")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("売上IDの解析に失敗しました: {}", e)))?;
    let order_id = OrderId::from_string(&column::<String>(row, "order_id")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("注文IDの解析に失敗しました: {}", e)))?;
    let book_id = BookId::from_string(&column::<String>(row, "book_id")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("書籍IDの解析に失敗しました: {}", e)))?;
    let sale_date: NaiveDate = column(row, "sale_date")?;

    Ok(Sale::reconstruct(
        id,
        order_id,
        book_id,
        column(row, "quantity")?,
        money(row, "price_at_sale_amount", "price_at_sale_currency")?,
        column(row, "domain")?,
        sale_date,
    ))
}

pub(super) fn user_from_row(row: &MySqlRow) -> Result<User, RepositoryError> {
    let id = UserId::from_string(&column::<String>(row, "id")?).map_err(|e| {
        RepositoryError::FetchFailed(format!("ユーザーIDの解析に失敗しました: {}", e))
    })?;
    let role = UserRole::from_string(&column::<String>(row, "role")?)
        .map_err(|e| RepositoryError::FetchFailed(format!("ロールの解析に失敗しました: {}", e)))?;

    Ok(User::reconstruct(
        id,
        column(row, "username")?,
        role,
        column(row, "is_active")?,
    ))
}
