pub mod api;
pub mod config;
pub mod credential;
pub mod db;
pub mod error;
pub mod history;
pub mod icd;
pub mod models;
pub mod patients;
pub mod records;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::api::{start_api_server, ApiContext};
use crate::config::{AppConfig, HTTP_TIMEOUT};
use crate::credential::{ClientCredentialsExchange, CredentialCache, SqliteTokenStore};
use crate::db::DbHandle;
use crate::error::StartupError;
use crate::icd::{DiseaseSearch, IcdClient};
use crate::store::{DocumentStore, SqliteDocumentStore};

pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("MedChart starting v{}", config::APP_VERSION);

    if let Err(e) = serve() {
        tracing::error!("MedChart failed: {e}");
        std::process::exit(1);
    }
}

/// Wire the stores and clients, then serve the API until Ctrl-C.
///
/// The blocking HTTP clients are built and finally dropped outside the
/// tokio runtime; handlers reach them through `spawn_blocking`.
fn serve() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    tracing::info!(db = %config.db_path.display(), language = %config.language, "Configuration loaded");

    let db = Arc::new(DbHandle::open(&config.db_path)?);
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(db.clone()));

    let exchange = ClientCredentialsExchange::new(
        &config.token_url,
        &config.client_id,
        &config.client_secret,
        HTTP_TIMEOUT,
    )?;
    tracing::info!(token_url = exchange.token_url(), "Token endpoint configured");
    let credentials = Arc::new(CredentialCache::new(exchange, SqliteTokenStore::new(db)));
    let icd = Arc::new(IcdClient::new(
        &config.search_url,
        &config.api_version,
        credentials,
        HTTP_TIMEOUT,
    )?);
    tracing::info!(search_url = icd.search_url(), api_version = %config.api_version, "ICD-11 search configured");
    let diseases: Arc<dyn DiseaseSearch> = icd.clone();

    let ctx = ApiContext::new(store, diseases, config.language.clone());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let server = start_api_server(ctx, config.bind_addr)
            .await
            .map_err(StartupError::Server)?;
        tracing::info!(addr = %server.session.server_addr, "Serving /api");

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        server.stop().await;
        Ok::<_, StartupError>(())
    })?;
    drop(runtime);
    drop(icd);

    tracing::info!("MedChart stopped");
    Ok(())
}
