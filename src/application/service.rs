// アプリケーションサービス

mod catalog_service;
mod identity_service;
mod order_lifecycle_service;
mod order_query_service;
mod sales_query_service;

pub use catalog_service::{BookRevision, CatalogService, NewBook};
pub use identity_service::IdentityService;
pub use order_lifecycle_service::OrderLifecycleService;
pub use order_query_service::OrderQueryService;
pub use sales_query_service::SalesQueryService;

use crate::application::ApplicationError;
use crate::domain::model::Caller;

/// 管理者権限の認可チェック
/// 変更を伴う処理では、いかなる読み書きよりも先に一度だけ評価する
pub(crate) fn require_admin(caller: &Caller, action: &str) -> Result<(), ApplicationError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(ApplicationError::Unauthorized(format!(
            "{}には管理者権限が必要です",
            action
        )))
    }
}
