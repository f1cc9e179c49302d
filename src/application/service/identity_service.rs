use std::sync::Arc;
use tracing::{info, warn};

use crate::application::service::require_admin;
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{Caller, User, UserId, UserRole};
use crate::domain::port::UserRepository;

/// 識別サービス
/// ユーザー登録と、ユーザーIDから呼び出し元（ID・ロール）への解決を行う
/// トークンの発行・検証は扱わない
pub struct IdentityService {
    user_repository: Arc<dyn UserRepository>,
}

impl IdentityService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// ユーザーを登録する
    ///
    /// # Returns
    /// * `Ok(User)` - 登録されたユーザー
    /// * `Err(ApplicationError::DomainError(UsernameTaken))` - ユーザー名の重複
    pub async fn register(&self, username: String, role: UserRole) -> Result<User, ApplicationError> {
        let user = User::register(UserId::new(), username, role)?;

        if self
            .user_repository
            .find_by_username(user.username())
            .await?
            .is_some()
        {
            return Err(DomainError::UsernameTaken(user.username().to_string()).into());
        }

        self.user_repository.save(&user).await?;
        info!(user_id = %user.id(), role = %user.role(), "ユーザーを登録しました");
        Ok(user)
    }

    /// 管理者が別のユーザーを登録する（管理者ロールの付与に使う）
    pub async fn register_by_admin(
        &self,
        caller: &Caller,
        username: String,
        role: UserRole,
    ) -> Result<User, ApplicationError> {
        require_admin(caller, "管理者によるユーザー登録")?;
        self.register(username, role).await
    }

    /// 起動時の初期管理者を用意する
    /// 同名のユーザーが既にいればそのまま返す
    pub async fn ensure_admin(&self, username: &str) -> Result<User, ApplicationError> {
        if let Some(existing) = self.user_repository.find_by_username(username).await? {
            if existing.role() != UserRole::Admin {
                warn!(user_id = %existing.id(), "初期管理者と同名の一般ユーザーが存在します");
            }
            return Ok(existing);
        }
        self.register(username.to_string(), UserRole::Admin).await
    }

    /// ユーザーIDを呼び出し元に解決する
    /// 存在しない、または無効化されたユーザーは`Unauthorized`
    pub async fn resolve_caller(&self, user_id: UserId) -> Result<Caller, ApplicationError> {
        match self.user_repository.find_by_id(user_id).await? {
            Some(user) if user.is_active() => Ok(user.as_caller()),
            Some(_) => {
                warn!(user_id = %user_id, "無効化されたユーザーからのリクエストを拒否しました");
                Err(ApplicationError::Unauthorized(
                    "ユーザーは無効化されています".to_string(),
                ))
            }
            None => Err(ApplicationError::Unauthorized(
                "認証されていません".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::driven::InMemoryStore;

    fn service() -> (Arc<InMemoryStore>, IdentityService) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), IdentityService::new(store))
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let (_store, identity) = service();
        let user = identity
            .register("admin".to_string(), UserRole::Admin)
            .await
            .unwrap();

        let caller = identity.resolve_caller(user.id()).await.unwrap();
        assert_eq!(caller.user_id(), user.id());
        assert!(caller.is_admin());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (_store, identity) = service();
        identity
            .register("alice".to_string(), UserRole::Customer)
            .await
            .unwrap();
        let result = identity.register("alice".to_string(), UserRole::Admin).await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::UsernameTaken(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_by_admin_requires_admin() {
        let (_store, identity) = service();
        let customer = identity
            .register("carol".to_string(), UserRole::Customer)
            .await
            .unwrap();

        let result = identity
            .register_by_admin(&customer.as_caller(), "mallory".to_string(), UserRole::Admin)
            .await;
        assert!(matches!(result, Err(ApplicationError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (_store, identity) = service();
        let first = identity.ensure_admin("root").await.unwrap();
        let second = identity.ensure_admin("root").await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(first.role(), UserRole::Admin);
    }

    #[tokio::test]
    async fn test_resolve_unknown_user() {
        let (_store, identity) = service();
        assert!(matches!(
            identity.resolve_caller(UserId::new()).await,
            Err(ApplicationError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_inactive_user() {
        let (store, identity) = service();
        let inactive = User::reconstruct(UserId::new(), "bob".to_string(), UserRole::Admin, false);
        UserRepository::save(store.as_ref(), &inactive).await.unwrap();

        assert!(matches!(
            identity.resolve_caller(inactive.id()).await,
            Err(ApplicationError::Unauthorized(_))
        ));
    }
}
