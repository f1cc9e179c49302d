use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::DomainError;
use crate::domain::model::UserId;

/// ユーザーのロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 一般顧客
    Customer,
    /// 管理者
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Admin => "admin",
        }
    }

    /// 文字列からUserRoleを作成
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        match s {
            "customer" => Ok(UserRole::Customer),
            "admin" => Ok(UserRole::Admin),
            _ => Err(DomainError::InvalidValue(format!("無効なロール: {}", s))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ユーザー
/// 注文ライフサイクルからは読み取り専用
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    username: String,
    role: UserRole,
    is_active: bool,
}

impl User {
    /// 新しいユーザーを登録
    pub fn register(id: UserId, username: String, role: UserRole) -> Result<Self, DomainError> {
        let username = username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::InvalidValue(
                "ユーザー名は空にできません".to_string(),
            ));
        }
        Ok(Self {
            id,
            username,
            role,
            is_active: true,
        })
    }

    pub fn reconstruct(id: UserId, username: String, role: UserRole, is_active: bool) -> Self {
        Self {
            id,
            username,
            role,
            is_active,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// 呼び出し元としての識別情報
    pub fn as_caller(&self) -> Caller {
        Caller::new(self.id, self.role)
    }
}

/// 呼び出し元の識別情報（ユーザーIDとロール）
/// 認証基盤から与えられる事実として扱う
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
    role: UserRole,
}

impl Caller {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    /// 管理者権限を持つか
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
