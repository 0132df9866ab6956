//! Visa Navigator: an HTTP service for publishing visa requirements and
//! tracking applications, backed by MongoDB or an in-process document store.
pub mod config;
pub mod document;
pub mod errors;
pub mod logger;
pub mod query;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
pub mod visa;

pub use config::{CliArgs, Config, ConfigError, StoreKind};
pub use errors::DbError;
pub use service::VisaService;
pub use store::{DocumentStore, MemoryStore, MongoStore};
pub use types::DocumentId;

/// Load configuration, install logging and open the configured store.
///
/// The store is pinged once; a failed ping is logged and startup continues.
///
/// # Errors
/// Returns an error if configuration, logging or the store client cannot be set up.
pub async fn init(cli: &CliArgs) -> Result<(Config, VisaService), Box<dyn std::error::Error>> {
    let cfg = Config::load(cli)?;
    logger::configure_logging(cfg.log_dir.as_deref(), &cfg.log_level)?;
    log::debug!("loaded {cfg:?}");

    let store = store::connect(&cfg).await?;
    match store.ping().await {
        Ok(()) => log::info!("Pinged your deployment ({}). Store connection is live.", store.backend()),
        Err(e) => log::warn!("Store ping failed ({}): {e}", store.backend()),
    }
    Ok((cfg, VisaService::new(store)))
}
