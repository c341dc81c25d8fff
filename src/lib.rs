pub mod api;
pub mod assets;
pub mod auth;
pub mod config;
pub mod db;
pub mod services;

pub use db::DbPool;

use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::assets::AssetStore;
use crate::auth::SessionIssuer;
use crate::db::AccountStore;
use crate::services::{AccountDirectory, BranchManager};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub sessions: SessionIssuer,
    pub assets: AssetStore,
    pub branches: BranchManager,
    pub accounts: AccountDirectory,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let store = AccountStore::new(db.clone());
        let assets = AssetStore::new(
            config.storage.upload_dir.clone(),
            &config.storage.public_prefix,
        );
        let sessions = SessionIssuer::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_ttl_hours,
        );

        let branches = BranchManager::new(store.clone(), assets.clone(), config.timeouts.clone());
        let accounts = AccountDirectory::new(
            store,
            assets.clone(),
            sessions.clone(),
            config.timeouts.clone(),
        );

        Self {
            config,
            db,
            sessions,
            assets,
            branches,
            accounts,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
