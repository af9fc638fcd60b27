//! Route handlers, one module per resource

pub mod health;
pub mod monitors;
pub mod schedule;
pub mod services;
pub mod stats;

use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Wrap a CSV document as a download
pub(crate) fn csv_response(filename: &str, body: String) -> Response {
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
