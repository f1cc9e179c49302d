use bookstore_order_lifecycle::adapter::driven::{
    InMemoryStore, MySqlBookRepository, MySqlOrderRepository, MySqlSaleRepository,
    MySqlUnitOfWorkFactory, MySqlUserRepository,
};
use bookstore_order_lifecycle::adapter::driver::rest_api::{create_router, AppState};
use bookstore_order_lifecycle::adapter::{DatabaseMigration, ServerConfig, StorageConfig};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// ログ出力を初期化する
/// `RUST_LOG`で出力レベル、`LOG_FORMAT=json`でJSON形式を指定できる
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bookstore_order_lifecycle=info,tower_http=info,sqlx=warn".into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

async fn build_state(config: &ServerConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    match &config.storage {
        StorageConfig::MySql(db_config) => {
            info!(
                database = %db_config.redacted_target(),
                max_connections = db_config.max_connections,
                "データベース設定を読み込みました"
            );

            // 接続プールを作成
            let pool = MySqlPoolOptions::new()
                .max_connections(db_config.max_connections)
                .acquire_timeout(db_config.acquire_timeout)
                .connect_with(db_config.connect_options()?)
                .await?;

            // マイグレーションを実行
            DatabaseMigration::new(pool.clone()).run().await?;

            Ok(AppState::from_ports(
                Arc::new(MySqlBookRepository::new(pool.clone())),
                Arc::new(MySqlOrderRepository::new(pool.clone())),
                Arc::new(MySqlSaleRepository::new(pool.clone())),
                Arc::new(MySqlUserRepository::new(pool.clone())),
                Arc::new(MySqlUnitOfWorkFactory::new(pool)),
            ))
        }
        StorageConfig::Memory => {
            warn!("インメモリストアで起動します（データは再起動で失われます）");
            let store = Arc::new(InMemoryStore::new());
            Ok(AppState::from_ports(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                store,
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let state = build_state(&config).await?;

    if let Some(username) = &config.bootstrap_admin {
        let admin = state.identity_service.ensure_admin(username).await?;
        info!(user_id = %admin.id(), username = %admin.username(), "初期管理者を用意しました");
    }

    // REST APIルーターを作成
    let app = create_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), backend = config.storage.backend_name(), "REST APIサーバーが起動しました");

    axum::serve(listener, app).await?;

    Ok(())
}
