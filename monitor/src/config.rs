use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_or(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Read an optional secret, treating an empty value as unset.
fn env_opt(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub catalog: CatalogConfig,
    pub registry: RegistryConfig,
    pub sources: SourcesConfig,
    pub http: HttpConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

/// Public S3-compatible bucket holding the dashboard snapshots.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    /// Key prefix of every dashboard file, with its trailing slash.
    pub folder: String,
    pub pipeline_bucket: String,
    pub hvd_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub api_url: String,
    pub site_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub search_url: String,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub kpi_csv_url: String,
    pub irve_csv_url: String,
    pub tabular_api_url: String,
    pub email_domains_resource: String,
    pub hvd_records_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub max_displayed_suggestions: usize,
    pub siret_threshold: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("MONITOR_HOST", "0.0.0.0"),
                port: parse_env_or("MONITOR_PORT", 8053),
                api_keys: env::var("MONITOR_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            storage: StorageConfig {
                endpoint: env_or("STORAGE_ENDPOINT", "https://object.files.data.gouv.fr"),
                bucket: env_or("STORAGE_BUCKET", "dataeng-open"),
                folder: normalize_folder(&env_or("STORAGE_FOLDER", "dashboard/")),
                pipeline_bucket: env_or("STORAGE_PIPELINE_BUCKET", "data-pipeline-open"),
                hvd_prefix: normalize_folder(&env_or("STORAGE_HVD_PREFIX", "hvd/")),
            },
            catalog: CatalogConfig {
                api_url: env_or("DATAGOUV_API_URL", "https://www.data.gouv.fr/api/1"),
                site_url: env_or("DATAGOUV_SITE_URL", "https://www.data.gouv.fr/fr"),
                api_key: env_opt("DATAGOUV_API_KEY"),
            },
            registry: RegistryConfig {
                search_url: env_or(
                    "ENTREPRISES_API_URL",
                    "https://recherche-entreprises.api.gouv.fr/search",
                ),
                retry_delay_ms: parse_env_or("ENTREPRISES_RETRY_DELAY_MS", 1000),
            },
            sources: SourcesConfig {
                kpi_csv_url: env_or(
                    "KPI_CSV_URL",
                    "https://www.data.gouv.fr/fr/datasets/r/79e2c14d-8278-4407-84b5-e8c279fc578c",
                ),
                irve_csv_url: env_or(
                    "IRVE_CSV_URL",
                    "https://www.data.gouv.fr/fr/datasets/r/eb76d20a-8501-400e-b336-d85724de5435",
                ),
                tabular_api_url: env_or(
                    "TABULAR_API_URL",
                    "https://tabular-api.data.gouv.fr/api",
                ),
                email_domains_resource: env_or(
                    "EMAIL_DOMAINS_RESOURCE",
                    "4208f064-e655-4bad-93c9-9a3977f3f8cc",
                ),
                hvd_records_url: env_or(
                    "HVD_RECORDS_URL",
                    "https://grist.numerique.gouv.fr/api/docs/eJxok2H2va3E/tables/Hvd/records",
                ),
            },
            http: HttpConfig {
                timeout_secs: parse_env_or("HTTP_TIMEOUT", 30),
            },
            dashboard: DashboardConfig {
                max_displayed_suggestions: parse_env_or("MAX_DISPLAYED_SUGGESTIONS", 10),
                siret_threshold: parse_env_or("SIRET_MATCH_THRESHOLD", 70),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Key prefixes are compared by string concatenation, so they always end with `/`.
fn normalize_folder(folder: &str) -> String {
    let trimmed = folder.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_storage_config_defaults() {
        std::env::remove_var("STORAGE_BUCKET");
        std::env::remove_var("STORAGE_FOLDER");

        let config = Config::default();
        assert_eq!(config.storage.bucket, "dataeng-open");
        assert_eq!(config.storage.folder, "dashboard/");
        assert_eq!(config.storage.hvd_prefix, "hvd/");
    }

    #[test]
    #[serial]
    fn test_storage_folder_gets_trailing_slash() {
        std::env::set_var("STORAGE_FOLDER", "/monitoring");
        let config = Config::default();
        assert_eq!(config.storage.folder, "monitoring/");
        std::env::remove_var("STORAGE_FOLDER");
    }

    #[test]
    #[serial]
    fn test_api_keys_from_env() {
        std::env::set_var("MONITOR_API_KEYS", "alpha, beta,,");
        let config = Config::default();
        assert_eq!(config.server.api_keys, vec!["alpha", "beta"]);
        std::env::remove_var("MONITOR_API_KEYS");
    }

    #[test]
    #[serial]
    fn test_empty_catalog_api_key_is_unset() {
        std::env::set_var("DATAGOUV_API_KEY", "  ");
        let config = Config::default();
        assert!(config.catalog.api_key.is_none());
        std::env::remove_var("DATAGOUV_API_KEY");
    }

    #[test]
    #[serial]
    fn test_dashboard_defaults() {
        std::env::remove_var("MAX_DISPLAYED_SUGGESTIONS");
        std::env::remove_var("SIRET_MATCH_THRESHOLD");
        let config = Config::default();
        assert_eq!(config.dashboard.max_displayed_suggestions, 10);
        assert_eq!(config.dashboard.siret_threshold, 70);
        assert_eq!(config.registry.retry_delay_ms, 1000);
    }

    #[test]
    #[serial]
    fn test_parse_env_or_invalid_value_falls_back() {
        std::env::set_var("__TEST_MONITOR_PORT", "not-a-port");
        let result: u16 = parse_env_or("__TEST_MONITOR_PORT", 8053);
        assert_eq!(result, 8053);
        std::env::remove_var("__TEST_MONITOR_PORT");
    }
}
