use crate::application::service::require_admin;
use crate::application::ApplicationError;
use crate::domain::model::{Caller, Order, OrderId};
use crate::domain::port::OrderRepository;
use std::sync::Arc;

/// 注文クエリサービス
/// 読み取り専用の注文操作を提供する
pub struct OrderQueryService {
    order_repository: Arc<dyn OrderRepository>,
}

impl OrderQueryService {
    /// 新しい注文クエリサービスを作成
    ///
    /// # Arguments
    /// * `order_repository` - 注文リポジトリ
    pub fn new(order_repository: Arc<dyn OrderRepository>) -> Self {
        Self { order_repository }
    }

    /// 注文IDで注文を取得
    /// 注文者本人または管理者のみ参照できる
    ///
    /// # Returns
    /// * `Ok(Order)` - 注文が見つかった
    /// * `Err(ApplicationError::NotFound)` - 注文が見つからなかった
    /// * `Err(ApplicationError::Unauthorized)` - 他人の注文
    pub async fn get_order(&self, id: OrderId, caller: &Caller) -> Result<Order, ApplicationError> {
        let order = self
            .order_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("注文が見つかりません: {}", id)))?;

        if order.user_id() != caller.user_id() && !caller.is_admin() {
            return Err(ApplicationError::Unauthorized(
                "他のユーザーの注文は参照できません".to_string(),
            ));
        }
        Ok(order)
    }

    /// 呼び出し元自身の注文を取得
    /// 作成日時の降順で並べて返す
    pub async fn get_my_orders(&self, caller: &Caller) -> Result<Vec<Order>, ApplicationError> {
        self.order_repository
            .find_by_user(caller.user_id())
            .await
            .map_err(ApplicationError::from)
    }

    /// すべての注文を取得（管理者のみ）
    /// 作成日時の降順で並べて返す
    pub async fn get_all_orders(&self, caller: &Caller) -> Result<Vec<Order>, ApplicationError> {
        require_admin(caller, "全注文の参照")?;
        self.order_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}
