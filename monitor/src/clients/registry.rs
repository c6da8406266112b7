use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<CompanyResult>,
}

#[derive(Debug, Deserialize)]
struct CompanyResult {
    siege: Headquarters,
}

#[derive(Debug, Deserialize)]
struct Headquarters {
    siret: Option<String>,
}

/// Client for the company registry search API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(client: Client, config: &RegistryConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Resolve the headquarters SIRET of a SIREN.
    ///
    /// A transport failure (connection error, timeout) is retried exactly
    /// once after the configured delay. Any outcome short of a single
    /// unambiguous result (second failure, error status, zero or several
    /// results) is reported as unresolved with `None`.
    pub async fn siret_from_siren(&self, siren: &str) -> Option<String> {
        let resp = match self.search(siren).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Registry lookup for {} failed, retrying once: {}", siren, e);
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                match self.search(siren).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!("Registry lookup for {} failed again: {}", siren, e);
                        return None;
                    }
                }
            }
        };

        if !resp.status().is_success() {
            debug!("Registry lookup for {} returned {}", siren, resp.status());
            return None;
        }

        let body: SearchResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Unreadable registry response for {}: {}", siren, e);
                return None;
            }
        };

        match body.results.as_slice() {
            [] => {
                info!("No registry result for {}", siren);
                None
            }
            [single] => single.siege.siret.clone(),
            several => {
                info!("Ambiguous registry result for {}: {}", siren, several.len());
                None
            }
        }
    }

    async fn search(&self, query: &str) -> reqwest::Result<Response> {
        self.client
            .get(&self.config.search_url)
            .query(&[("q", query)])
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer, timeout: Duration) -> RegistryClient {
        let client = Client::builder().timeout(timeout).build().unwrap();
        RegistryClient::new(
            client,
            &RegistryConfig {
                search_url: format!("{}/search", server.uri()),
                retry_delay_ms: 10,
            },
        )
    }

    fn result(siret: &str) -> serde_json::Value {
        json!({"siren": &siret[..9], "siege": {"siret": siret}})
    }

    #[tokio::test]
    async fn single_result_returns_siret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "123456789"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [result("12345678900011")]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let siret = registry(&server, Duration::from_secs(5))
            .siret_from_siren("123456789")
            .await;
        assert_eq!(siret.as_deref(), Some("12345678900011"));
    }

    #[tokio::test]
    async fn no_result_is_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let siret = registry(&server, Duration::from_secs(5))
            .siret_from_siren("123456789")
            .await;
        assert!(siret.is_none());
    }

    #[tokio::test]
    async fn several_results_are_unresolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [result("12345678900011"), result("12345678900029")]
            })))
            .mount(&server)
            .await;

        let siret = registry(&server, Duration::from_secs(5))
            .siret_from_siren("123456789")
            .await;
        assert!(siret.is_none());
    }

    #[tokio::test]
    async fn error_status_is_unresolved_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let siret = registry(&server, Duration::from_secs(5))
            .siret_from_siren("123456789")
            .await;
        assert!(siret.is_none());
    }

    #[tokio::test]
    async fn transient_failure_is_attempted_exactly_twice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [result("12345678900011")]}))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let siret = registry(&server, Duration::from_millis(50))
            .siret_from_siren("123456789")
            .await;
        assert!(siret.is_none());
    }

    #[tokio::test]
    async fn retry_recovers_from_a_single_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [result("98765432100017")]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let siret = registry(&server, Duration::from_millis(100))
            .siret_from_siren("987654321")
            .await;
        assert_eq!(siret.as_deref(), Some("98765432100017"));
    }
}
