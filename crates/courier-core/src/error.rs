use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body returned for every error response.
///
/// `kind` is a stable SCREAMING_CASE code for programmatic matching; `message` is the
/// human-readable text clients display.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub kind: &'a str,
    pub message: &'a str,
}

/// Build an error response. Service error enums call this from their `IntoResponse`.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = ErrorBody { kind, message };
    (status, axum::Json(body)).into_response()
}
