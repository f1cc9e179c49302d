use crate::domain::error::DomainError;
use crate::domain::port::RepositoryError;

/// アプリケーション層のエラー型
/// ドメインエラー、リポジトリエラー、認可・参照解決の失敗をラップする
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    /// ドメインエラー（ビジネスルール違反）
    #[error("Domain error: {0}")]
    DomainError(#[from] DomainError),
    /// リポジトリエラー（永続化の失敗）
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    /// エンティティが見つからない
    #[error("Not found: {0}")]
    NotFound(String),
    /// 呼び出し元に必要な権限がない
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// 参照整合性の前提が崩れている（利用者が回復できない内部エラー）
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
}
