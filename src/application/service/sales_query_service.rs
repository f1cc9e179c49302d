use crate::application::service::require_admin;
use crate::application::ApplicationError;
use crate::domain::model::{Caller, Sale};
use crate::domain::port::SaleRepository;
use std::sync::Arc;

/// 売上クエリサービス
/// 売上台帳の読み取りを提供する（管理者のみ）
pub struct SalesQueryService {
    sale_repository: Arc<dyn SaleRepository>,
}

impl SalesQueryService {
    pub fn new(sale_repository: Arc<dyn SaleRepository>) -> Self {
        Self { sale_repository }
    }

    /// すべての売上記録を取得
    /// 販売日の降順で並べて返す
    pub async fn list_sales(&self, caller: &Caller) -> Result<Vec<Sale>, ApplicationError> {
        require_admin(caller, "売上台帳の参照")?;
        self.sale_repository
            .find_all()
            .await
            .map_err(ApplicationError::from)
    }
}
