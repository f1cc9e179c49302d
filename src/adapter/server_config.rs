use std::env;

use crate::adapter::database_config::{ConfigError, StorageConfig};

/// HTTPサーバーの設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    /// 起動時に用意する管理者のユーザー名
    pub bootstrap_admin: Option<String>,
}

impl ServerConfig {
    /// 環境変数から設定を読み取る
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// 設定値の取得元から設定を読み取る
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid SERVER_PORT: {}", e)))?,
            None => 8000,
        };

        let storage = StorageConfig::from_lookup(lookup)?;

        let bootstrap_admin = lookup("BOOTSTRAP_ADMIN_USERNAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Self {
            host,
            port,
            storage,
            bootstrap_admin,
        })
    }

    /// 待ち受けアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
