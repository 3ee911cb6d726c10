//! # Search Error Types Module
//!
//! This module defines the error types used throughout recipe resolution.
//! `SourceError` covers faults from external or local sources and is always
//! recovered by the fallback chain. `ResolutionError` is what a caller can see.

use thiserror::Error;

/// Recoverable failures reported by a single recipe source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Network failure, timeout, non-2xx status, missing credentials or an open circuit
    #[error("Source unavailable: {0}")]
    Unavailable(String),
    /// The source answered with data that cannot be normalized
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl SourceError {
    pub fn timeout(source: &str) -> Self {
        SourceError::Unavailable(format!("{source} timed out"))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::MalformedResponse(err.to_string())
        } else {
            SourceError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedResponse(err.to_string())
    }
}

/// Errors surfaced by the recipe service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The request cannot be served by any fallback (e.g. no ingredients supplied)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// No source knows a recipe with this identifier
    #[error("Recipe {0} not found")]
    NotFound(i64),
    /// Internal state could not be trusted (e.g. a poisoned cache lock)
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SourceError::timeout("live search").to_string(),
            "Source unavailable: live search timed out"
        );
        assert_eq!(
            ResolutionError::InvalidRequest("no ingredients supplied".into()).to_string(),
            "Invalid request: no ingredients supplied"
        );
        assert_eq!(ResolutionError::NotFound(42).to_string(), "Recipe 42 not found");
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            SourceError::from(err),
            SourceError::MalformedResponse(_)
        ));
    }
}
