use crate::adapter::database_error::DatabaseError;
use crate::adapter::driven::mysql_row::{user_from_row, USER_COLUMNS};
use crate::domain::model::{User, UserId};
use crate::domain::port::{RepositoryError, UserRepository};
use async_trait::async_trait;

use sqlx::{MySql, Pool};

/// MySQLユーザーリポジトリ
#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: Pool<MySql>,
}

impl MySqlUserRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        // usernameの一意制約違反はConflictになる
        sqlx::query("INSERT INTO users (id, username, role, is_active) VALUES (?, ?, ?, ?)")
            .bind(user.id().to_string())
            .bind(user.username())
            .bind(user.role().as_str())
            .bind(user.is_active())
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ユーザーの保存に失敗しました", e))
            .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("ユーザーの取得に失敗しました", e))
            .map_err(RepositoryError::from)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("ユーザーの取得に失敗しました", e))
        .map_err(RepositoryError::from)?;

        row.as_ref().map(user_from_row).transpose()
    }
}
