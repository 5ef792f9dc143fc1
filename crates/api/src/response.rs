//! Response envelope.
//!
//! Success: `{"success": true, "data": ...}`.
//! Validation failure: `{"success": false, "errors": [...]}`.
//! Any other failure: `{"success": false, "error", "code", "retryable"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use bursar_shared::{AppError, ErrorKind};

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

/// 201 with `data`.
pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// Renders an error into the envelope with its HTTP status.
pub fn error_response(err: impl Into<AppError>) -> Response {
    let err = err.into();
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(code = err.error_code(), error = %err, "Request failed");
    } else {
        warn!(code = err.error_code(), error = %err, "Request rejected");
    }

    let body = if err.kind() == ErrorKind::Validation {
        json!({ "success": false, "errors": err.messages() })
    } else {
        json!({
            "success": false,
            "error": err.to_string(),
            "code": err.error_code(),
            "retryable": err.is_retryable(),
        })
    };
    (status, Json(body)).into_response()
}

/// Wraps a `Result` from a repository into a response.
pub fn respond<T: Serialize, E: Into<AppError>>(result: Result<T, E>) -> Response {
    match result {
        Ok(data) => ok(data),
        Err(e) => error_response(e),
    }
}

/// Like [`respond`], answering 201 on success.
pub fn respond_created<T: Serialize, E: Into<AppError>>(result: Result<T, E>) -> Response {
    match result {
        Ok(data) => created(data),
        Err(e) => error_response(e),
    }
}
