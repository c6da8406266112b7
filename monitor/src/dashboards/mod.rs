//! Dashboard pipelines.
//!
//! Each module pairs pure transforms (parsed inputs to [`Chart`]s or
//! suggestion rows) with a thin async loader fetching those inputs. Loaders
//! take the clients they need explicitly and keep no state of their own.
//!
//! [`Chart`]: crate::charts::Chart

pub mod catalog;
pub mod certification;
pub mod hvd;
pub mod kpi;
pub mod reports;
pub mod reuses;
pub mod siret;
pub mod support;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::clients::StorageClient;
use crate::error::{MonitorError, Result};

/// A JSON snapshot history: snapshot key to that day's document.
pub type SnapshotDocument = BTreeMap<String, Value>;

/// Fetch a dashboard JSON file whose top level is keyed by snapshot date.
pub async fn snapshot_document(storage: &StorageClient, file: &str) -> Result<SnapshotDocument> {
    parse_snapshot_document(&storage.get_file_content(file).await?)
        .map_err(|e| MonitorError::Parse(format!("{file}: {e}")))
}

pub fn parse_snapshot_document(text: &str) -> Result<SnapshotDocument> {
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(MonitorError::Parse(
            "Snapshot document is not an object".to_string(),
        )),
    }
}

/// Numeric value at `path`, `None` when any step is missing or not a number.
pub(crate) fn number_at(value: &Value, path: &[&str]) -> Option<f64> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_at_walks_nested_keys() {
        let doc = json!({"all": {"score": 0.5}, "count": {"all": 10}});
        assert_eq!(number_at(&doc, &["all", "score"]), Some(0.5));
        assert_eq!(number_at(&doc, &["count", "all"]), Some(10.0));
        assert_eq!(number_at(&doc, &["hvd", "score"]), None);
    }

    #[test]
    fn snapshot_document_must_be_an_object() {
        assert!(parse_snapshot_document("[1, 2]").is_err());
        let doc = parse_snapshot_document(r#"{"2024-01-01": {}}"#).unwrap();
        assert!(doc.contains_key("2024-01-01"));
    }
}
