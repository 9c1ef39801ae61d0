use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use watchtower_core::error::{ClientCode, WatchtowerError};

/// `WatchtowerError` as an HTTP response: `{"code": "...", "detail": "..."}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub WatchtowerError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.client_code() {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = json!({
            "code": self.0.client_code().as_str(),
            "detail": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
