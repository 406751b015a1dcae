//! Error envelope returned for every non-2xx response

use crate::auth::AuthError;
use crate::results::timestamp;
use crate::search::{FieldError, SearchError, SearchKind, ValidationError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failure of an HTTP request, rendered as the JSON error envelope
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body or query string could not be decoded
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        /// `"body"` or `"query"`, whichever failed to decode
        field: &'static str,
        message: String,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Upstream failure. The source is logged, never returned.
    #[error("{} failed", .kind.label())]
    Search {
        kind: SearchKind,
        #[source]
        source: SearchError,
    },
    #[error("Not Found")]
    NotFound,
    #[error("An unexpected error occurred")]
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    status_code: u16,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn search(kind: SearchKind, source: SearchError) -> Self {
        Self::Search { kind, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Auth(AuthError::Missing) => StatusCode::FORBIDDEN,
            Self::Auth(AuthError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::Misconfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Search { .. } | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Rejected { .. } | Self::Validation(_) => "Validation Error",
            Self::Internal => "Internal Server Error",
            _ => "HTTP Exception",
        }
    }

    fn details(&self) -> Option<Vec<FieldError>> {
        match self {
            Self::Validation(e) => Some(e.errors.clone()),
            Self::Rejected { field, message, .. } => {
                Some(vec![FieldError::new(*field, message.clone())])
            }
            _ => None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            field: "body",
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        // malformed query strings are field errors, same as bad JSON values
        Self::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            field: "query",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            Self::Search { kind, source } => {
                tracing::error!(kind = %kind, error = %source, "Search request failed")
            }
            Self::Auth(AuthError::Misconfigured) => {
                tracing::error!("Search request refused: no API token configured")
            }
            Self::Auth(e) => tracing::warn!("Search request refused: {}", e),
            Self::Rejected { .. } | Self::Validation(_) => {
                tracing::debug!("Invalid request: {}", self)
            }
            _ => {}
        }

        let body = ErrorBody {
            success: false,
            error: self.label(),
            message: self.to_string(),
            status_code: status.as_u16(),
            timestamp: timestamp(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_statuses() {
        assert_eq!(ApiError::from(AuthError::Missing).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(AuthError::Unauthorized).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::Misconfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_search_message_hides_upstream_text() {
        let err = ApiError::search(
            SearchKind::Images,
            SearchError::operation("secret upstream detail"),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Image search failed");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_validation_details() {
        let err = ApiError::from(ValidationError::single("query", "field required"));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.label(), "Validation Error");
        assert_eq!(
            err.details(),
            Some(vec![FieldError::new("query", "field required")])
        );
    }
}
