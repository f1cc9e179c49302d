use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::service::require_admin;
use crate::application::ApplicationError;
use crate::domain::event::DomainEvent;
use crate::domain::model::{Book, BookId, Caller, Order, OrderId, OrderStatus, Sale, SaleId};
use crate::domain::port::{UnitOfWork, UnitOfWorkFactory};

/// 注文ライフサイクルサービス
/// 注文受付とステータス遷移を、それぞれ1つの作業単位として実行する
pub struct OrderLifecycleService {
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl OrderLifecycleService {
    /// 新しい注文ライフサイクルサービスを作成
    ///
    /// # Arguments
    /// * `unit_of_work_factory` - トランザクション境界を提供するストア
    pub fn new(unit_of_work_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            unit_of_work_factory,
        }
    }

    /// 注文を受け付ける
    /// 在庫の減算と注文の作成は同一トランザクションで確定する
    ///
    /// # Arguments
    /// * `book_id` - 書籍ID
    /// * `quantity` - 数量（1以上）
    /// * `caller` - 注文者
    ///
    /// # Returns
    /// * `Ok(Order)` - 作成された注文（ステータスPLACED）
    /// * `Err(ApplicationError::NotFound)` - 書籍が存在しない
    /// * `Err(ApplicationError::DomainError(InsufficientStock))` - 在庫不足
    pub async fn place_order(
        &self,
        book_id: BookId,
        quantity: u32,
        caller: &Caller,
    ) -> Result<Order, ApplicationError> {
        let mut uow = self.unit_of_work_factory.begin().await?;

        let mut book = uow
            .find_book_for_update(book_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("書籍が見つかりません: {}", book_id)))?;

        let mut order = Order::place(OrderId::new(), caller.user_id(), &mut book, quantity)?;

        uow.create_order(&order).await?;
        uow.adjust_stock(book_id, -i64::from(quantity)).await?;
        uow.commit().await?;

        for event in order.take_domain_events() {
            info!(
                event_type = event.event_type(),
                order_id = %order.id(),
                book_id = %book_id,
                quantity,
                remaining_stock = book.stock_quantity(),
                "注文を受け付けました"
            );
        }

        Ok(order)
    }

    /// 注文ステータスを遷移させる（管理者のみ）
    ///
    /// 検証順序: 権限 → 注文の存在 → ステータス文字列 → 遷移表。
    /// CANCELLEDへの遷移では数量分の在庫を戻し、DELIVEREDへの遷移では売上記録を1件作成する。
    /// 検証・副作用・ステータス更新はすべて1つのトランザクションで確定し、失敗時は何も残らない。
    ///
    /// # Returns
    /// * `Ok(Order)` - 更新後の注文
    /// * `Err(ApplicationError::Unauthorized)` - 管理者でない
    /// * `Err(ApplicationError::NotFound)` - 注文が存在しない
    /// * `Err(ApplicationError::DomainError(InvalidStatus))` - 未知のステータス文字列
    /// * `Err(ApplicationError::DomainError(IllegalTransition))` - 遷移表にない遷移
    /// * `Err(ApplicationError::InternalConsistency)` - 注文が参照する書籍が存在しない
    pub async fn transition_order(
        &self,
        order_id: OrderId,
        requested_status: &str,
        caller: &Caller,
    ) -> Result<Order, ApplicationError> {
        require_admin(caller, "注文ステータスの変更")?;

        let mut uow = self.unit_of_work_factory.begin().await?;

        let mut order = uow
            .find_order_for_update(order_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", order_id)))?;

        let requested = OrderStatus::from_string(requested_status)?;
        let previous = order.status();

        if let Err(err) = order.transition_to(requested) {
            warn!(order_id = %order_id, from = %previous, to = %requested, "遷移表にないステータス遷移を拒否しました");
            return Err(err.into());
        }

        let events = order.take_domain_events();
        for event in &events {
            self.apply_side_effect(uow.as_mut(), &order, event).await?;
        }

        uow.set_status(order.id(), order.status()).await?;
        uow.commit().await?;

        for event in &events {
            info!(
                event_type = event.event_type(),
                order_id = %event.order_id(),
                from = %previous,
                to = %order.status(),
                "注文ステータスを更新しました"
            );
        }

        Ok(order)
    }

    /// 遷移イベントに対応する在庫・売上の副作用を作業単位内で適用する
    async fn apply_side_effect(
        &self,
        uow: &mut dyn UnitOfWork,
        order: &Order,
        event: &DomainEvent,
    ) -> Result<(), ApplicationError> {
        match event {
            DomainEvent::OrderCancelled(cancelled) => {
                let mut book = self
                    .resolve_referenced_book(uow, order, cancelled.book_id)
                    .await?;
                book.release(cancelled.quantity)?;
                uow.adjust_stock(cancelled.book_id, i64::from(cancelled.quantity))
                    .await?;
                Ok(())
            }
            DomainEvent::OrderDelivered(delivered) => {
                let book = self
                    .resolve_referenced_book(uow, order, delivered.book_id)
                    .await?;
                let sale = Sale::record_delivery(
                    SaleId::new(),
                    order,
                    &book,
                    delivered.occurred_at.date_naive(),
                )?;
                uow.append_sale(&sale).await?;
                Ok(())
            }
            DomainEvent::OrderPlaced(_)
            | DomainEvent::OrderConfirmed(_)
            | DomainEvent::OrderShipped(_) => Ok(()),
        }
    }

    /// 注文が参照する書籍を解決する
    /// 見つからない場合は参照整合性違反として扱う
    async fn resolve_referenced_book(
        &self,
        uow: &mut dyn UnitOfWork,
        order: &Order,
        book_id: BookId,
    ) -> Result<Book, ApplicationError> {
        match uow.find_book_for_update(book_id).await? {
            Some(book) => Ok(book),
            None => {
                error!(order_id = %order.id(), book_id = %book_id, "注文が参照する書籍が存在しません");
                Err(ApplicationError::InternalConsistency(format!(
                    "注文 {} が参照する書籍 {} が存在しません",
                    order.id(),
                    book_id
                )))
            }
        }
    }
}
