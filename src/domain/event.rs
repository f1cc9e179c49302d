use chrono::{DateTime, Utc};
use crate::domain::model::{BookId, Money, OrderId, OrderStatus, UserId};

/// ドメインイベント列挙型
/// 注文集約が受付・遷移のたびに記録する
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// 注文が受け付けられた（在庫予約済み）
    OrderPlaced(OrderPlaced),
    /// 注文が確認された
    OrderConfirmed(OrderStatusChanged),
    /// 注文が発送された
    OrderShipped(OrderStatusChanged),
    /// 注文が配達完了した
    OrderDelivered(OrderDelivered),
    /// 注文がキャンセルされた
    OrderCancelled(OrderCancelled),
}

impl DomainEvent {
    /// イベント種別名
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::OrderPlaced(_) => "OrderPlaced",
            DomainEvent::OrderConfirmed(_) => "OrderConfirmed",
            DomainEvent::OrderShipped(_) => "OrderShipped",
            DomainEvent::OrderDelivered(_) => "OrderDelivered",
            DomainEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }

    /// 対象の注文ID
    pub fn order_id(&self) -> OrderId {
        match self {
            DomainEvent::OrderPlaced(e) => e.order_id,
            DomainEvent::OrderConfirmed(e) | DomainEvent::OrderShipped(e) => e.order_id,
            DomainEvent::OrderDelivered(e) => e.order_id,
            DomainEvent::OrderCancelled(e) => e.order_id,
        }
    }
}

/// 注文受付イベント
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: u32,
    pub price_at_purchase: Money,
    pub occurred_at: DateTime<Utc>,
}

/// 副作用を伴わないステータス変更イベント（確認・発送）
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// 注文配達完了イベント
/// 売上記録の作成に必要な情報を持つ
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDelivered {
    pub order_id: OrderId,
    pub book_id: BookId,
    pub quantity: u32,
    pub price_at_purchase: Money,
    pub occurred_at: DateTime<Utc>,
}

/// 注文キャンセルイベント
/// 在庫を戻すための書籍IDと数量を持つ
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub book_id: BookId,
    pub quantity: u32,
    pub from: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}
