#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;
use wiremock::MockServer;

use monitor::api::{create_router, AppState};
use monitor::config::Config;

pub const API_KEY: &str = "integration-key";

/// Configuration pointing every upstream at one mock server.
pub fn config_for(server: &MockServer) -> Config {
    let base = server.uri();
    let mut config = Config::default();
    config.server.api_keys = vec![API_KEY.to_string()];
    config.storage.endpoint = base.clone();
    config.storage.bucket = "dataeng-open".to_string();
    config.storage.folder = "dashboard/".to_string();
    config.storage.pipeline_bucket = "data-pipeline-open".to_string();
    config.storage.hvd_prefix = "hvd/".to_string();
    config.catalog.api_url = format!("{base}/api/1");
    config.catalog.site_url = "https://www.data.gouv.fr/fr".to_string();
    config.catalog.api_key = Some("catalog-secret".to_string());
    config.registry.search_url = format!("{base}/search");
    config.registry.retry_delay_ms = 0;
    config.sources.kpi_csv_url = format!("{base}/kpis.csv");
    config.sources.irve_csv_url = format!("{base}/irve.csv");
    config.sources.tabular_api_url = format!("{base}/tabular");
    config.sources.hvd_records_url = format!("{base}/grist/records");
    config.dashboard.max_displayed_suggestions = 10;
    config.dashboard.siret_threshold = 70;
    config
}

pub fn app_for(server: &MockServer) -> (Router, AppState) {
    let state = AppState::new(config_for(server)).expect("state");
    (create_router(state.clone()), state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {API_KEY}"))
        .body(Body::empty())
        .expect("request")
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {API_KEY}"))
        .body(Body::empty())
        .expect("request")
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {API_KEY}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn send(app: Router, request: Request<Body>) -> (u16, serde_json::Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status().as_u16();
    (status, json_body(response).await)
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
