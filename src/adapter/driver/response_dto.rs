use crate::domain::error::DomainError;
use crate::domain::model::{Book, Order, Sale, User};
use serde::Serialize;

/// ユーザー用のレスポンスDTO
#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

/// 書籍用のレスポンスDTO
#[derive(Serialize)]
pub struct BookResponse {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub domain: String,
    pub price_amount: i64,
    pub price_currency: String,
    pub stock_quantity: u32,
    pub created_at: String,
}

/// 注文用のレスポンスDTO
#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub book_id: String,
    pub user_id: String,
    pub quantity: u32,
    pub price_at_purchase_amount: i64,
    pub total_amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: String,
}

/// ステータス変更結果のレスポンスDTO
#[derive(Serialize)]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub status: String,
}

/// 売上記録用のレスポンスDTO
#[derive(Serialize)]
pub struct SaleResponse {
    pub sale_id: String,
    pub order_id: String,
    pub book_id: String,
    pub quantity: u32,
    pub price_at_sale_amount: i64,
    pub revenue_amount: i64,
    pub currency: String,
    pub domain: String,
    pub sale_date: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id().to_string(),
            username: user.username().to_string(),
            role: user.role().to_string(),
        }
    }
}

impl BookResponse {
    /// ドメインオブジェクトからBookResponseを作成
    pub fn from_book(book: &Book) -> Self {
        Self {
            book_id: book.id().to_string(),
            title: book.title().to_string(),
            author: book.author().to_string(),
            domain: book.domain().to_string(),
            price_amount: book.price().amount(),
            price_currency: book.price().currency(),
            stock_quantity: book.stock_quantity(),
            created_at: book.created_at().to_rfc3339(),
        }
    }
}

impl OrderResponse {
    /// ドメインオブジェクトからOrderResponseを作成
    pub fn from_order(order: &Order) -> Result<Self, DomainError> {
        let total = order.total()?;
        Ok(Self {
            order_id: order.id().to_string(),
            book_id: order.book_id().to_string(),
            user_id: order.user_id().to_string(),
            quantity: order.quantity(),
            price_at_purchase_amount: order.price_at_purchase().amount(),
            total_amount: total.amount(),
            currency: total.currency(),
            status: order.status().to_string(),
            created_at: order.created_at().to_rfc3339(),
        })
    }
}

impl OrderStatusResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            status: order.status().to_string(),
        }
    }
}

impl SaleResponse {
    /// ドメインオブジェクトからSaleResponseを作成
    pub fn from_sale(sale: &Sale) -> Result<Self, DomainError> {
        let revenue = sale.revenue()?;
        Ok(Self {
            sale_id: sale.id().to_string(),
            order_id: sale.order_id().to_string(),
            book_id: sale.book_id().to_string(),
            quantity: sale.quantity(),
            price_at_sale_amount: sale.price_at_sale().amount(),
            revenue_amount: revenue.amount(),
            currency: revenue.currency(),
            domain: sale.domain().to_string(),
            sale_date: sale.sale_date().format("%Y-%m-%d").to_string(),
        })
    }
}
