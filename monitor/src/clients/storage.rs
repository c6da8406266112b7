use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::config::StorageConfig;
use crate::error::{MonitorError, Result};

/// Read-only client for the public S3-compatible bucket holding the
/// dashboard snapshots. Objects are fetched anonymously.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    config: StorageConfig,
}

#[derive(Debug, Default, PartialEq)]
struct ListPage {
    keys: Vec<String>,
    prefixes: Vec<String>,
    next_token: Option<String>,
}

impl StorageClient {
    pub fn new(client: Client, config: &StorageConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Fetch an object as UTF-8 text.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<String> {
        let url = format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            bucket,
            key
        );
        debug!("Fetching object {}", url);

        let resp = self.client.get(&url).send().await?;
        match resp.status() {
            status if status.is_success() => Ok(resp.text().await?),
            StatusCode::NOT_FOUND => Err(MonitorError::NotFound(format!(
                "Object {key} not found in bucket {bucket}"
            ))),
            status => Err(MonitorError::Storage(format!(
                "Fetching {bucket}/{key} returned {status}"
            ))),
        }
    }

    /// Fetch a file from the dashboard folder of the dashboard bucket.
    pub async fn get_file_content(&self, path: &str) -> Result<String> {
        let key = format!("{}{}", self.config.folder, path);
        self.get_object(&self.config.bucket, &key).await
    }

    /// List keys under `prefix`.
    ///
    /// A non-recursive listing stops at the next `/` and also returns the
    /// "directories" (common prefixes, with their trailing slash) after the
    /// plain objects.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<String>> {
        let base = format!("{}/{}", self.config.endpoint.trim_end_matches('/'), bucket);
        let mut keys = Vec::new();
        let mut prefixes = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut url = Url::parse(&base)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("list-type", "2");
                query.append_pair("prefix", prefix);
                if !recursive {
                    query.append_pair("delimiter", "/");
                }
                if let Some(ref t) = token {
                    query.append_pair("continuation-token", t);
                }
            }

            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(MonitorError::Storage(format!(
                    "Listing {bucket}/{prefix} returned {status}"
                )));
            }

            let page = parse_list_page(&resp.text().await?)?;
            keys.extend(page.keys);
            prefixes.extend(page.prefixes);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(
            "Listed {} objects and {} prefixes under {}/{}",
            keys.len(),
            prefixes.len(),
            bucket,
            prefix
        );
        keys.extend(prefixes);
        Ok(keys)
    }

    /// Names of the entries directly under the dashboard folder, without the
    /// folder prefix and without trailing slashes.
    pub async fn list_dashboard_entries(&self) -> Result<Vec<String>> {
        let folder = &self.config.folder;
        let entries = self
            .list_objects(&self.config.bucket, folder, false)
            .await?
            .into_iter()
            .map(|key| {
                key.strip_prefix(folder.as_str())
                    .unwrap_or(&key)
                    .trim_end_matches('/')
                    .to_string()
            })
            .filter(|name| !name.is_empty())
            .collect();
        Ok(entries)
    }
}

fn parse_list_page(xml: &str) -> Result<ListPage> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = ListPage::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut truncated = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                text.clear();
            }
            Ok(Event::Text(e)) => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) => {
                text.push_str(match &*e {
                    b"amp" => "&",
                    b"lt" => "<",
                    b"gt" => ">",
                    b"apos" => "'",
                    b"quot" => "\"",
                    _ => "",
                });
            }
            Ok(Event::End(_)) => {
                let value = std::mem::take(&mut text);
                let parent = path.len().checked_sub(2).and_then(|i| path.get(i));
                match (parent.map(String::as_str), path.last().map(String::as_str)) {
                    (Some("Contents"), Some("Key")) => page.keys.push(value),
                    (Some("CommonPrefixes"), Some("Prefix")) => page.prefixes.push(value),
                    (Some("ListBucketResult"), Some("IsTruncated")) => {
                        truncated = value.eq_ignore_ascii_case("true")
                    }
                    (Some("ListBucketResult"), Some("NextContinuationToken")) => {
                        page.next_token = Some(value)
                    }
                    _ => {}
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MonitorError::Parse(format!(
                    "Invalid bucket listing at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !truncated {
        page.next_token = None;
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn storage_config(endpoint: String) -> StorageConfig {
        StorageConfig {
            endpoint,
            bucket: "dataeng-open".to_string(),
            folder: "dashboard/".to_string(),
            pipeline_bucket: "data-pipeline-open".to_string(),
            hvd_prefix: "hvd/".to_string(),
        }
    }

    const PAGE_ONE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>dataeng-open</Name>
  <Prefix>dashboard/</Prefix>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>tok-2</NextContinuationToken>
  <Contents><Key>dashboard/stats_support.csv</Key><Size>12</Size></Contents>
  <CommonPrefixes><Prefix>dashboard/2024-01-05/</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    const PAGE_TWO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Name>dataeng-open</Name>
  <IsTruncated>false</IsTruncated>
  <Contents><Key>dashboard/R&amp;D.json</Key></Contents>
  <CommonPrefixes><Prefix>dashboard/2024-01-20/</Prefix></CommonPrefixes>
</ListBucketResult>"#;

    #[test]
    fn parses_listing_page() {
        let page = parse_list_page(PAGE_ONE).unwrap();
        assert_eq!(page.keys, vec!["dashboard/stats_support.csv"]);
        assert_eq!(page.prefixes, vec!["dashboard/2024-01-05/"]);
        assert_eq!(page.next_token.as_deref(), Some("tok-2"));
    }

    #[test]
    fn parses_escaped_keys_and_last_page() {
        let page = parse_list_page(PAGE_TWO).unwrap();
        assert_eq!(page.keys, vec!["dashboard/R&D.json"]);
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn follows_continuation_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dataeng-open"))
            .and(query_param("continuation-token", "tok-2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_TWO))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/dataeng-open"))
            .and(query_param("delimiter", "/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_ONE))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let client = StorageClient::new(Client::new(), &storage_config(server.uri()));
        let entries = client.list_dashboard_entries().await.unwrap();

        assert_eq!(
            entries,
            vec!["stats_support.csv", "R&D.json", "2024-01-05", "2024-01-20"]
        );
    }

    #[tokio::test]
    async fn get_file_content_prefixes_folder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataeng-open/dashboard/stats_support.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
            .mount(&server)
            .await;

        let client = StorageClient::new(Client::new(), &storage_config(server.uri()));
        let content = client.get_file_content("stats_support.csv").await.unwrap();
        assert_eq!(content, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = StorageClient::new(Client::new(), &storage_config(server.uri()));
        let err = client.get_file_content("missing.json").await.unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
    }
}
