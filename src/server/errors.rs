use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::server::dto::ErrorResponse;

/// `{ success: false, error, details? }`; `details` only when debug errors are enabled.
pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
    details: Option<String>,
) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: message.into(),
            details,
        }),
    )
        .into_response()
}

/// The error chain of `err`, if the server is configured to expose it.
pub fn error_details<E: std::fmt::Debug>(debug_errors: bool, err: &E) -> Option<String> {
    debug_errors.then(|| format!("{err:#?}"))
}
