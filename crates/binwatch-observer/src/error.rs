//! Error types for the dashboard API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Storage
//! failures are logged where they happen and reach the client only as a
//! short per-endpoint message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use binwatch_core::SimulationError;
use binwatch_db::DbError;
use tracing::error;

/// Errors returned by API handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request body, query, or path was malformed or out of range.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested bin does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The storage backend failed. Carries the generic client message.
    #[error("storage failure: {0}")]
    Storage(&'static str),
}

impl ApiError {
    /// Map a [`DbError`] to a generic 500, logging the detail.
    pub fn storage(message: &'static str) -> impl FnOnce(DbError) -> Self {
        move |e| {
            error!(error = %e, "{message}");
            Self::Storage(message)
        }
    }

    /// Map a [`SimulationError`]: validation becomes a 400, storage a
    /// generic 500.
    pub fn simulation(message: &'static str) -> impl FnOnce(SimulationError) -> Self {
        move |e| match e {
            SimulationError::Validation(v) => Self::BadRequest(format!("Invalid configuration: {v}")),
            SimulationError::Storage(db) => Self::storage(message)(db),
        }
    }

    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg,
            Self::Storage(msg) => msg.to_owned(),
        };

        let body = serde_json::json!({
            "message": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use binwatch_types::ValidationError;

    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::simulation("Failed to update simulation config")(
            SimulationError::Validation(ValidationError::UpdateInterval(2)),
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_hides_detail() {
        let err = ApiError::storage("Failed to fetch bins")(DbError::Corrupt(
            "status column held \"full\"".to_owned(),
        ));
        assert_eq!(err, ApiError::Storage("Failed to fetch bins"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
