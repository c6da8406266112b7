use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{app_for, get, post, send, text_body};

const IRVE_CSV: &str = "\
nom_amenageur,siren_amenageur,datagouv_organization_or_owner
Ville de Paris,217500016,ville-de-paris-2
Ville de Paris,217500016,ville-de-paris-2
Garage Martin,111222333,acme-energie
";

async fn mount_sources(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/irve.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IRVE_CSV))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "217500016"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"siege": {"siret": "21750001600019"}}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn refresh_suggests_then_exports_siret() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/1/organizations/ville-de-paris-2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Ville de Paris",
            "business_number_id": null
        })))
        .mount(&server)
        .await;
    let (app, state) = app_for(&server);

    let (status, json) = send(app.clone(), post("/api/v1/siret:refresh")).await;
    assert_eq!(status, 200);
    assert_eq!(json["meta"]["total"], 1);
    let suggestion = &json["data"][0];
    assert_eq!(suggestion["row"], 0);
    assert_eq!(suggestion["organizationId"], "ville-de-paris-2");
    assert_eq!(suggestion["siret"], "21750001600019");
    assert_eq!(
        suggestion["url"],
        "https://www.data.gouv.fr/fr/organizations/ville-de-paris-2/"
    );

    let cached = state.session.siret().await.expect("cached suggestions");
    assert_eq!(cached.value.len(), 1);
    assert_eq!(
        json["meta"]["refreshedAt"],
        serde_json::to_value(cached.refreshed_at).unwrap()
    );

    let response = app.oneshot(get("/api/v1/siret/export")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let csv = text_body(response).await;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("organization_id,name,matched_name,score,siren,siret,url")
    );
    assert!(lines.next().unwrap().contains("21750001600019"));
}

#[tokio::test]
async fn organizations_with_a_business_number_are_skipped() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/1/organizations/ville-de-paris-2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Ville de Paris",
            "business_number_id": "21750001600019"
        })))
        .mount(&server)
        .await;
    let (app, _) = app_for(&server);

    let (status, json) = send(app, post("/api/v1/siret:refresh")).await;
    assert_eq!(status, 200);
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn threshold_out_of_range_is_rejected() {
    let server = MockServer::start().await;
    let (app, _) = app_for(&server);

    let (status, json) = send(app, post("/api/v1/siret:refresh?threshold=120")).await;
    assert_eq!(status, 400);
    assert_eq!(json["error"]["code"], "invalid_request");
}
