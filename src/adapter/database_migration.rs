use sqlx::{MySql, Pool};
use tracing::info;

use crate::adapter::database_error::DatabaseError;

/// データベースマイグレーションを管理する構造体
pub struct DatabaseMigration {
    pool: Pool<MySql>,
}

impl DatabaseMigration {
    /// 新しいDatabaseMigrationインスタンスを作成
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    /// マイグレーションを実行
    /// べき等性を保証（CREATE TABLE IF NOT EXISTS）
    pub async fn run(&self) -> Result<(), DatabaseError> {
        let migrations = [
            include_str!("../../migrations/001_create_users_table.sql"),
            include_str!("../../migrations/002_create_books_table.sql"),
            include_str!("../../migrations/003_create_orders_table.sql"),
            include_str!("../../migrations/004_create_sales_table.sql"),
        ];

        for (index, migration_sql) in migrations.iter().enumerate() {
            sqlx::query(migration_sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DatabaseError::MigrationError(format!("Migration {} failed: {}", index + 1, e))
                })?;
            info!(migration = index + 1, "マイグレーションを実行しました");
        }

        Ok(())
    }
}
