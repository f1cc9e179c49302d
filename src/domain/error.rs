use crate::domain::model::{BookId, OrderStatus};

/// ドメイン層のエラー型
/// ビジネスルール違反を表現する
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// 認識できない注文ステータス文字列
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),
    /// 遷移表で許可されていないステータス遷移（同一ステータスへの遷移、終端状態からの遷移を含む）
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    /// 在庫不足
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    /// 無効な数量（0以下）
    #[error("Invalid quantity")]
    InvalidQuantity,
    /// 金額計算の桁あふれ（価格 × 数量がi64に収まらない）
    #[error("Amount overflow")]
    AmountOverflow,
    /// 在庫数の上限超過
    #[error("Stock quantity overflow")]
    StockOverflow,
    /// 未完了の注文が参照している書籍は削除できない
    #[error("Book {0} is referenced by open orders")]
    BookHasOpenOrders(BookId),
    /// ユーザー名の重複
    #[error("Username already taken: {0}")]
    UsernameTaken(String),
    /// 無効な値
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
