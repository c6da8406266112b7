//! Per-process cache of the last fetched datasets and suggestion tables.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::dashboards::certification::CertificationSuggestion;
use crate::dashboards::kpi::KpiDataset;
use crate::dashboards::siret::SiretSuggestion;

#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub refreshed_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    fn now(value: T) -> Self {
        Self {
            value,
            refreshed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionData {
    kpis: Option<Cached<KpiDataset>>,
    certification: Option<Cached<Vec<CertificationSuggestion>>>,
    siret: Option<Cached<Vec<SiretSuggestion>>>,
}

/// Shared, cloneable handle on the session cache. Each entry is replaced
/// wholesale by its refresh.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionData>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a freshly fetched KPI dataset and return its refresh time.
    pub async fn set_kpis(&self, kpis: KpiDataset) -> DateTime<Utc> {
        let cached = Cached::now(kpis);
        let refreshed_at = cached.refreshed_at;
        self.inner.write().await.kpis = Some(cached);
        refreshed_at
    }

    pub async fn kpis(&self) -> Option<Cached<KpiDataset>> {
        self.inner.read().await.kpis.clone()
    }

    pub async fn set_certification(
        &self,
        suggestions: Vec<CertificationSuggestion>,
    ) -> DateTime<Utc> {
        let cached = Cached::now(suggestions);
        let refreshed_at = cached.refreshed_at;
        self.inner.write().await.certification = Some(cached);
        refreshed_at
    }

    pub async fn certification(&self) -> Option<Cached<Vec<CertificationSuggestion>>> {
        self.inner.read().await.certification.clone()
    }

    pub async fn set_siret(&self, suggestions: Vec<SiretSuggestion>) -> DateTime<Utc> {
        let cached = Cached::now(suggestions);
        let refreshed_at = cached.refreshed_at;
        self.inner.write().await.siret = Some(cached);
        refreshed_at
    }

    pub async fn siret(&self) -> Option<Cached<Vec<SiretSuggestion>>> {
        self.inner.read().await.siret.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_start_empty_and_are_replaced() {
        let session = SessionStore::new();
        assert!(session.kpis().await.is_none());
        assert!(session.siret().await.is_none());

        let refreshed_at = session.set_siret(Vec::new()).await;
        let first = session.siret().await.unwrap();
        assert!(first.value.is_empty());
        assert_eq!(first.refreshed_at, refreshed_at);

        let clone = session.clone();
        clone.set_kpis(KpiDataset::default()).await;
        assert!(session.kpis().await.is_some());
    }
}
