use std::collections::{HashMap, HashSet};

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::ensure_success;
use crate::config::SourcesConfig;
use crate::error::Result;

/// One row of the HVD opening catalogue: a published URL with the dataset
/// family and theme it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct HvdCatalogueEntry {
    pub url: String,
    /// `datasets` for download links, `dataservices` for API links.
    pub object_type: &'static str,
    pub ensemble: Option<String>,
    pub thematique: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HvdCatalogue {
    pub entries: Vec<HvdCatalogueEntry>,
    /// Theme slug (as used in catalog tags) to theme label.
    pub categories: HashMap<String, String>,
}

impl HvdCatalogue {
    pub fn entry_for(&self, url: &str) -> Option<&HvdCatalogueEntry> {
        self.entries.iter().find(|e| e.url == url)
    }

    /// Labels of the HVD themes among `tags`, joined with `, `.
    pub fn theme_labels<S: AsRef<str>>(&self, tags: &[S]) -> String {
        tags.iter()
            .filter_map(|t| self.categories.get(t.as_ref()))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct GristRecords {
    records: Vec<GristRecord>,
}

#[derive(Debug, Deserialize)]
struct GristRecord {
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TabularPage {
    #[serde(default)]
    data: Vec<TabularRow>,
}

#[derive(Debug, Deserialize)]
struct TabularRow {
    #[serde(default)]
    domain_email: Option<String>,
}

/// Column suffix of each link kind in the Grist table.
const LINK_KINDS: [(&str, &str); 2] = [("Telechargement", "datasets"), ("API", "dataservices")];

/// Public open-data endpoints: stable resource downloads, the tabular API and
/// the HVD opening table.
#[derive(Debug, Clone)]
pub struct SourcesClient {
    client: Client,
    config: SourcesConfig,
}

impl SourcesClient {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &SourcesConfig {
        &self.config
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        debug!("Downloading {}", url);
        let resp = self.client.get(url).send().await?;
        Ok(ensure_success(resp).await?.text().await?)
    }

    /// Email domains registered for a SIRET in the public extract.
    pub async fn valid_email_domains(&self, siret: Option<&str>) -> Result<HashSet<String>> {
        let Some(siret) = siret.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(HashSet::new());
        };

        let url = format!(
            "{}/resources/{}/data/",
            self.config.tabular_api_url.trim_end_matches('/'),
            self.config.email_domains_resource
        );
        let resp = self
            .client
            .get(&url)
            .query(&[("siret__exact", siret), ("page_size", "50")])
            .send()
            .await?;
        let page: TabularPage = ensure_success(resp).await?.json().await?;

        Ok(page
            .data
            .into_iter()
            .filter_map(|row| row.domain_email)
            .collect())
    }

    /// Fetch and flatten the HVD opening catalogue.
    pub async fn hvd_catalogue(&self) -> Result<HvdCatalogue> {
        let resp = self.client.get(&self.config.hvd_records_url).send().await?;
        let body: GristRecords = ensure_success(resp).await?.json().await?;
        let catalogue = flatten_records(body.records);
        debug!(
            "HVD catalogue has {} links over {} themes",
            catalogue.entries.len(),
            catalogue.categories.len()
        );
        Ok(catalogue)
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn flatten_records(records: Vec<GristRecord>) -> HvdCatalogue {
    let mut categories = HashMap::new();
    for record in &records {
        if let Some(theme) = text_field(&record.fields, "Thematique") {
            categories.insert(slugify(&theme), theme);
        }
    }

    let mut entries = Vec::new();
    for (suffix, object_type) in LINK_KINDS {
        for record in &records {
            let Some(url) = text_field(&record.fields, &format!("URL_{suffix}")) else {
                continue;
            };
            entries.push(HvdCatalogueEntry {
                url,
                object_type,
                ensemble: text_field(&record.fields, "Ensemble_de_donnees"),
                thematique: text_field(&record.fields, "Thematique"),
            });
        }
    }

    HvdCatalogue {
        entries,
        categories,
    }
}

/// Tag form of a theme label: `Géospatial` → `geospatial`, `Mobilité d'été`
/// → `mobilite-d-ete`.
pub fn slugify(label: &str) -> String {
    deunicode::deunicode(&label.to_lowercase().replace([' ', '\''], "-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sources(server: &MockServer) -> SourcesClient {
        SourcesClient::new(
            Client::new(),
            &SourcesConfig {
                kpi_csv_url: format!("{}/kpi.csv", server.uri()),
                irve_csv_url: format!("{}/irve.csv", server.uri()),
                tabular_api_url: format!("{}/api", server.uri()),
                email_domains_resource: "res-1".to_string(),
                hvd_records_url: format!("{}/grist/records", server.uri()),
            },
        )
    }

    #[test]
    fn slugify_matches_tag_format() {
        assert_eq!(slugify("Géospatial"), "geospatial");
        assert_eq!(slugify("Observation de la terre"), "observation-de-la-terre");
        assert_eq!(slugify("Mobilité d'été"), "mobilite-d-ete");
    }

    #[tokio::test]
    async fn email_domains_for_siret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resources/res-1/data/"))
            .and(query_param("siret__exact", "12345678900011"))
            .and(query_param("page_size", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"siret": "12345678900011", "domain_email": "paris.fr"},
                    {"siret": "12345678900011", "domain_email": "paris.fr"},
                    {"siret": "12345678900011", "domain_email": "ville.paris"}
                ]
            })))
            .mount(&server)
            .await;

        let domains = sources(&server)
            .valid_email_domains(Some("12345678900011"))
            .await
            .unwrap();
        assert_eq!(domains.len(), 2);
        assert!(domains.contains("ville.paris"));
    }

    #[tokio::test]
    async fn no_siret_means_no_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let domains = sources(&server).valid_email_domains(None).await.unwrap();
        assert!(domains.is_empty());
        let domains = sources(&server).valid_email_domains(Some("")).await.unwrap();
        assert!(domains.is_empty());
    }

    #[tokio::test]
    async fn hvd_catalogue_flattens_both_link_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/grist/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    {"id": 1, "fields": {
                        "Titre": "Adresses",
                        "Ensemble_de_donnees": "BAN",
                        "Thematique": "Géospatial",
                        "URL_Telechargement": "https://www.data.gouv.fr/fr/datasets/ban/",
                        "URL_API": "https://www.data.gouv.fr/fr/dataservices/api-adresse/"
                    }},
                    {"id": 2, "fields": {
                        "Titre": "Météo",
                        "Ensemble_de_donnees": "Observations",
                        "Thematique": "Météorologie",
                        "URL_Telechargement": "https://www.data.gouv.fr/fr/datasets/meteo/",
                        "URL_API": null
                    }}
                ]
            })))
            .mount(&server)
            .await;

        let catalogue = sources(&server).hvd_catalogue().await.unwrap();
        assert_eq!(catalogue.entries.len(), 3);
        assert_eq!(catalogue.entries[0].object_type, "datasets");
        assert_eq!(catalogue.entries[2].object_type, "dataservices");

        let api = catalogue
            .entry_for("https://www.data.gouv.fr/fr/dataservices/api-adresse/")
            .unwrap();
        assert_eq!(api.ensemble.as_deref(), Some("BAN"));

        assert_eq!(
            catalogue.categories.get("meteorologie").map(String::as_str),
            Some("Météorologie")
        );
        assert_eq!(
            catalogue.theme_labels(&["hvd", "geospatial", "meteorologie"]),
            "Géospatial, Météorologie"
        );
    }

    #[tokio::test]
    async fn get_text_propagates_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = sources(&server);
        let url = client.config().kpi_csv_url.clone();
        assert!(client.get_text(&url).await.is_err());
    }
}
