use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::event::{
    DomainEvent, OrderCancelled, OrderDelivered, OrderPlaced, OrderStatusChanged,
};
use crate::domain::model::{Book, BookId, Money, OrderId, OrderStatus, UserId};

/// Order集約
/// 注文のライフサイクルを管理し、遷移表を適用する
#[derive(Debug, Clone)]
pub struct Order {
    id: OrderId,
    book_id: BookId,
    user_id: UserId,
    quantity: u32,
    price_at_purchase: Money,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    domain_events: Vec<DomainEvent>,
}

impl Order {
    /// 注文を受け付ける
    /// 書籍の在庫を予約し、現在価格を購入時価格として記録する
    /// 初期ステータスはPLACED
    ///
    /// # Returns
    /// * `Ok(Order)` - 受付成功（書籍の在庫は減算済み）
    /// * `Err(DomainError::InvalidQuantity)` - 数量が0
    /// * `Err(DomainError::InsufficientStock)` - 在庫不足（書籍は変更されない）
    /// * `Err(DomainError::AmountOverflow)` - 合計金額が表現できない（書籍は変更されない）
    pub fn place(
        id: OrderId,
        user_id: UserId,
        book: &mut Book,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        // 合計金額が計算できない注文は在庫に触れる前に拒否する
        book.price().multiply(quantity)?;
        book.reserve(quantity)?;

        let created_at = Utc::now();
        let price_at_purchase = book.price();
        let event = OrderPlaced {
            order_id: id,
            user_id,
            book_id: book.id(),
            quantity,
            price_at_purchase,
            occurred_at: created_at,
        };

        Ok(Self {
            id,
            book_id: book.id(),
            user_id,
            quantity,
            price_at_purchase,
            status: OrderStatus::Placed,
            created_at,
            domain_events: vec![DomainEvent::OrderPlaced(event)],
        })
    }

    /// データベースから取得したデータで注文を再構築
    /// リポジトリでの使用を想定
    pub fn reconstruct(
        id: OrderId,
        book_id: BookId,
        user_id: UserId,
        quantity: u32,
        price_at_purchase: Money,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity);
        }
        price_at_purchase.multiply(quantity)?;
        Ok(Self {
            id,
            book_id,
            user_id,
            quantity,
            price_at_purchase,
            status,
            created_at,
            domain_events: Vec::new(),
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// 購入時価格（受付後は変更されない）
    pub fn price_at_purchase(&self) -> Money {
        self.price_at_purchase
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 合計金額（購入時価格 × 数量）
    pub fn total(&self) -> Result<Money, DomainError> {
        self.price_at_purchase.multiply(self.quantity)
    }

    /// ドメインイベントを取得してクリア
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    /// 注文ステータスを遷移させる
    /// 遷移表にない遷移（同一ステータス、終端状態からの遷移を含む）は拒否する
    ///
    /// CANCELLEDへの遷移では在庫返却のため`OrderCancelled`を、
    /// DELIVEREDへの遷移では売上記録のため`OrderDelivered`を記録する
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        let from = self.status;
        if !from.can_transition_to(next) {
            return Err(DomainError::IllegalTransition { from, to: next });
        }

        self.status = next;
        let occurred_at = Utc::now();

        let event = match next {
            OrderStatus::Confirmed => DomainEvent::OrderConfirmed(OrderStatusChanged {
                order_id: self.id,
                from,
                occurred_at,
            }),
            OrderStatus::Shipped => DomainEvent::OrderShipped(OrderStatusChanged {
                order_id: self.id,
                from,
                occurred_at,
            }),
            OrderStatus::Delivered => DomainEvent::OrderDelivered(OrderDelivered {
                order_id: self.id,
                book_id: self.book_id,
                quantity: self.quantity,
                price_at_purchase: self.price_at_purchase,
                occurred_at,
            }),
            OrderStatus::Cancelled => DomainEvent::OrderCancelled(OrderCancelled {
                order_id: self.id,
                book_id: self.book_id,
                quantity: self.quantity,
                from,
                occurred_at,
            }),
            // PLACEDはどの遷移先集合にも含まれない
            OrderStatus::Placed => return Err(DomainError::IllegalTransition { from, to: next }),
        };
        self.domain_events.push(event);

        Ok(())
    }
}
