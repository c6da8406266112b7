pub mod actions;
pub mod catalog;
pub mod certification;
pub(crate) mod health;
pub mod hvd;
pub mod kpis;
pub mod reports;
pub mod reuses;
pub mod siret;
pub mod support;

pub use health::health_check;

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// A CSV body served as a file download.
pub(crate) fn csv_download(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}
