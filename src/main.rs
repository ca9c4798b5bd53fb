use taskflow::{
    application::record_service::RecordServiceImpl,
    config::{prepare_sqlite_file, ServerConfig},
    http::routing,
    infrastructure::sqlite_store::SqliteStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;
    prepare_sqlite_file(&config.database_url)?;
    let store = SqliteStore::connect(&config.database_url).await?;
    store.init().await?;
    let service = RecordServiceImpl::with_mode(store, config.validation);
    let router = routing::app(service);

    tracing::info!(addr = %config.addr, validation = ?config.validation, "listening");
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::ctrl_c;
    let _ = ctrl_c().await;
    tracing::info!("shutdown");
}
