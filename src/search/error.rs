//! Error types for request validation and dispatch

use serde::Serialize;
use thiserror::Error;

/// A single rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Request rejected before dispatch
#[derive(Debug, Clone, Error)]
#[error("request validation failed: {}", summary(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Uniform failure of an upstream search operation.
///
/// Every failure inside the dispatch layer (session setup, the call itself,
/// a worker panic, a timeout) is flattened into this one variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search operation failed: {0}")]
    OperationFailed(String),
}

impl SearchError {
    pub fn operation(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }
}
