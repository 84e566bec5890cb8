//! Error responses for the HTTP surface

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Message returned for failures whose details stay in the logs
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";

/// Error categories reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    UpstreamError,
    ServerError,
}

impl ApiErrorType {
    fn for_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFoundError,
            StatusCode::BAD_GATEWAY => Self::UpstreamError,
            s if s.is_client_error() => Self::InvalidRequestError,
            _ => Self::ServerError,
        }
    }
}

/// Error body: `{"error": {"message", "type", "param"?, "code"?}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Error returned by handlers; the `type` follows from the status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let error = ApiErrorDetail {
            message: message.into(),
            error_type: ApiErrorType::for_status(status),
            param: None,
            code: None,
        };

        Self {
            status,
            response: ApiErrorResponse { error },
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnsupportedProvider { .. } => {
                Self::new(StatusCode::NOT_FOUND, err.to_string()).with_param("chat_model_name")
            }
            DomainError::Upstream { provider, .. } => {
                Self::new(StatusCode::BAD_GATEWAY, GENERIC_ERROR_MESSAGE).with_code(provider)
            }
            DomainError::Credential { .. }
            | DomainError::Configuration { .. }
            | DomainError::Internal { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE)
            }
        }
    }
}
