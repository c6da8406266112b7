use std::sync::Arc;

use crate::clients::{
    build_http_client, CatalogClient, RegistryClient, SourcesClient, StorageClient,
};
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: StorageClient,
    pub catalog: CatalogClient,
    pub registry: RegistryClient,
    pub sources: SourcesClient,
    /// Last refreshed KPI dataset and suggestion tables.
    pub session: SessionStore,
}

impl AppState {
    /// Build every client from `config`, sharing one HTTP connection pool.
    pub fn new(config: Config) -> Result<Self> {
        let http = build_http_client(config.http.timeout_secs)?;

        Ok(Self {
            storage: StorageClient::new(http.clone(), &config.storage),
            catalog: CatalogClient::new(http.clone(), &config.catalog),
            registry: RegistryClient::new(http.clone(), &config.registry),
            sources: SourcesClient::new(http, &config.sources),
            session: SessionStore::new(),
            config: Arc::new(config),
        })
    }
}
