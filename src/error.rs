use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::validation::ValidationError;

/// ErrorCategory
///
/// How a failure reaches the user: network/backend failures and validation
/// failures become an inline message, authorization failures become a
/// silent redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Network,
    Validation,
    Authorization,
}

/// PortalError
///
/// Every failure a portal operation can end in. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("backend unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Backend { status: StatusCode, message: String },
    #[error("{0}")]
    GraphQl(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not signed in")]
    Unauthorized,
}

impl PortalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PortalError::Network(_) | PortalError::Backend { .. } | PortalError::GraphQl(_) => {
                ErrorCategory::Network
            }
            PortalError::Validation(_) => ErrorCategory::Validation,
            PortalError::Unauthorized => ErrorCategory::Authorization,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            PortalError::Network(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            PortalError::Network(_) | PortalError::GraphQl(_) => StatusCode::BAD_GATEWAY,
            // Client errors from the backend (bad credentials, duplicates) pass through.
            PortalError::Backend { status, .. } if status.is_client_error() => *status,
            PortalError::Backend { .. } => StatusCode::BAD_GATEWAY,
            PortalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

/// ErrorBody
///
/// JSON shape of every error the portal returns, and of the backend's own
/// error bodies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "portal operation failed");
        } else {
            tracing::debug!(error = %self, "portal operation rejected");
        }
        let body = ErrorBody {
            message: self.to_string(),
            category: Some(self.category()),
        };
        (status, Json(body)).into_response()
    }
}
