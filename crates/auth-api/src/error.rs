use auth_core::error::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

pub enum ApiError {
    /// Malformed JSON or a validation failure on the request body.
    BadRequest(String),
    /// Missing/invalid bearer, missing/invalid refresh cookie, or an
    /// access-denied verdict from the token service.
    Forbidden(String),
    /// Any other service failure.
    Internal(String),
}

impl ApiError {
    pub fn with_request_id(self, request_id: Uuid) -> ApiErrorWithContext {
        ApiErrorWithContext {
            inner: self,
            request_id: Some(request_id),
        }
    }
}

pub struct ApiErrorWithContext {
    inner: ApiError,
    request_id: Option<Uuid>,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccessDenied(msg) => ApiError::Forbidden(msg),
            AuthError::ParseError(msg) => ApiError::Forbidden(msg),
            AuthError::NotFound => {
                ApiError::Internal("refresh token not found unexpectedly".into())
            }
            AuthError::StorageError(msg) => ApiError::Internal(msg),
            AuthError::Cancelled => ApiError::Internal("operation cancelled".into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiErrorWithContext {
            inner: self,
            request_id: None,
        }
        .into_response()
    }
}

impl IntoResponse for ApiErrorWithContext {
    fn into_response(self) -> Response {
        let (status, message) = match self.inner {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        let body = ErrorResponse {
            message,
            request_id: self.request_id.map(|id| id.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
