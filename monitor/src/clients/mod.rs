//! HTTP clients for the systems the monitor reads from and writes back to.

mod catalog;
mod registry;
mod sources;
mod storage;

pub use catalog::{Badge, CatalogClient, Member, MemberUser, Organization};
pub use registry::RegistryClient;
pub use sources::{HvdCatalogue, HvdCatalogueEntry, SourcesClient};
pub use storage::StorageClient;

use std::time::Duration;

use reqwest::Client;

use crate::error::{MonitorError, Result};

/// Build the shared HTTP client with the configured request timeout.
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("monitor/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| MonitorError::Internal(format!("Failed to create HTTP client: {e}")))
}

/// Turn a non-success response into an error carrying its status and body.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(MonitorError::Catalog {
        status: status.as_u16(),
        message: body,
    })
}
