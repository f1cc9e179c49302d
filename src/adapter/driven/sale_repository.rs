use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_row::{sale_from_row, SALE_COLUMNS};
use crate::domain::model::Sale;
use crate::domain::port::{RepositoryError, SaleRepository};
use async_trait::async_trait;

use sqlx::{MySql, Pool};

/// MySQL売上台帳（読み取り側）
#[derive(Clone)]
pub struct MySqlSaleRepository {
    pool: Pool<MySql>,
}

impl MySqlSaleRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SaleRepository for MySqlSaleRepository {
    async fn find_all(&self) -> Result<Vec<Sale>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM sales ORDER BY sale_date DESC, created_at DESC",
            SALE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("売上一覧の取得に失敗しました", e))
        .map_err(RepositoryError::from)?;

        rows.iter().map(sale_from_row).collect()
    }
}
