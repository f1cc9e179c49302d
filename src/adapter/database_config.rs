use std::str::FromStr;
use std::time::Duration;

use sqlx::mysql::MySqlConnectOptions;

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// 永続化の設定
/// `STORAGE_BACKEND`で選択する（既定は`mysql`）
#[derive(Debug, Clone)]
pub enum StorageConfig {
    MySql(DatabaseConfig),
    /// プロセス内のみ（再起動で消える）
    Memory,
}

impl StorageConfig {
    /// 設定値の取得元から永続化の設定を読み取る
    /// `memory`を選んだ場合、データベース関連の変数は読まない
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("mysql") => {
                Ok(Self::MySql(DatabaseConfig::from_lookup(lookup)?))
            }
            Some("memory") => Ok(Self::Memory),
            Some(other) => Err(ConfigError::InvalidValue(format!(
                "Invalid STORAGE_BACKEND: {} (mysql or memory)",
                other
            ))),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::MySql(_) => "mysql",
            StorageConfig::Memory => "memory",
        }
    }
}

/// 接続先の指定方法
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseTarget {
    /// `DATABASE_URL`による指定（個別の変数より優先）
    Url(String),
    Parts {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: Option<String>,
    },
}

/// 注文ライフサイクル用データベースの接続設定
///
/// 作業単位ごとに1接続を専有し、行ロックを保持したまま待つことがあるため、
/// 接続の取得待ちには上限を設ける。
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub target: DatabaseTarget,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

const DEFAULT_DATABASE: &str = "order_lifecycle";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

impl DatabaseConfig {
    /// 設定値の取得元から接続設定を読み取る
    ///
    /// `DATABASE_URL`があればそれを使い、なければ`DATABASE_HOST`/`DATABASE_PORT`/
    /// `DATABASE_NAME`/`DATABASE_USER`/`DATABASE_PASSWORD`から組み立てる。
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let target = match url {
            Some(url) => {
                let url = url.trim().to_string();
                if !(url.starts_with("mysql://") || url.starts_with("mariadb://")) {
                    return Err(ConfigError::InvalidValue(
                        "Invalid DATABASE_URL: mysql:// で始まる必要があります".to_string(),
                    ));
                }
                DatabaseTarget::Url(url)
            }
            None => DatabaseTarget::Parts {
                host: lookup("DATABASE_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_var(lookup, "DATABASE_PORT", 3306u16)?,
                database: lookup("DATABASE_NAME")
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                username: lookup("DATABASE_USER")
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                password: lookup("DATABASE_PASSWORD").filter(|password| !password.is_empty()),
            },
        };

        let max_connections =
            parse_var(lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "Invalid DATABASE_MAX_CONNECTIONS: 1以上である必要があります".to_string(),
            ));
        }

        let acquire_timeout_secs = parse_var(
            lookup,
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            target,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }

    /// sqlxの接続オプションを作成する
    /// 個別指定のパスワードはURLに埋め込まないため、記号を含んでいてもそのまま使える
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, ConfigError> {
        match &self.target {
            DatabaseTarget::Url(url) => MySqlConnectOptions::from_str(url)
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid DATABASE_URL: {}", e))),
            DatabaseTarget::Parts {
                host,
                port,
                database,
                username,
                password,
            } => {
                let options = MySqlConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .database(database)
                    .username(username);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
        }
    }

    /// ログ出力用の接続先（パスワードは伏せる）
    pub fn redacted_target(&self) -> String {
        match &self.target {
            DatabaseTarget::Url(url) => redact_url(url),
            DatabaseTarget::Parts {
                host,
                port,
                database,
                username,
                ..
            } => format!("mysql://{}@{}:{}/{}", username, host, port, database),
        }
    }
}

fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "***".to_string();
    };
    match rest.rsplit_once('@') {
        Some((userinfo, location)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, location)
        }
        None => url.to_string(),
    }
}
