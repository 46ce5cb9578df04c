//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// An error rendered as `{"detail": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn status_for(err: &armory::Error) -> StatusCode {
    if err.is_authentication_error() {
        StatusCode::UNAUTHORIZED
    } else if err.is_permission_denied() {
        StatusCode::FORBIDDEN
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_validation_error() || err.is_duplicate_relation() {
        StatusCode::BAD_REQUEST
    } else if err.is_conflict() {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<armory::Error> for ApiError {
    fn from(err: armory::Error) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(module = err.module(), error = %err, "Request failed");
            return Self::new(status, "Internal server error.");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
