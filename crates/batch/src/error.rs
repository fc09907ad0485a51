//! Error taxonomy for bulk operations.
//!
//! The engines never look inside errors: whatever `execute` or
//! `fetch_next_page` returns is attached to the iteration context as an
//! `anyhow::Error`. Handlers call [`classify`] to decide whether to carry on.

use std::time::Duration;
use thiserror::Error;

/// Anticipated failure modes of the third-party API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<Duration> },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized: session is missing or expired")]
    Unauthorized,

    #[error("Forbidden: the account is not allowed to do this")]
    Forbidden,
}

/// Stable codes for the expected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RateLimit,
    NotFound,
    Unauthorized,
    Forbidden,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RateLimit => "rateLimit",
            ErrorCode::NotFound => "notFound",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Expected(ErrorCode),
    Unexpected,
}

impl ApiError {
    /// Map an HTTP status to an expected error, if it is one.
    pub fn from_status(status: u16, resource: &str) -> Option<Self> {
        match status {
            401 => Some(ApiError::Unauthorized),
            403 => Some(ApiError::Forbidden),
            404 => Some(ApiError::NotFound {
                resource: resource.to_string(),
            }),
            429 => Some(ApiError::RateLimit { retry_after: None }),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::RateLimit { .. } => ErrorCode::RateLimit,
            ApiError::NotFound { .. } => ErrorCode::NotFound,
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::Forbidden => ErrorCode::Forbidden,
        }
    }
}

/// Classify an error by searching its whole chain for an [`ApiError`].
///
/// Context added with `anyhow::Context` does not hide the code.
pub fn classify(err: &anyhow::Error) -> ErrorClass {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .map(|api| ErrorClass::Expected(api.code()))
        .unwrap_or(ErrorClass::Unexpected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn test_from_status() {
        assert_eq!(ApiError::from_status(401, "x"), Some(ApiError::Unauthorized));
        assert_eq!(ApiError::from_status(403, "x"), Some(ApiError::Forbidden));
        assert_eq!(
            ApiError::from_status(404, "user 1"),
            Some(ApiError::NotFound {
                resource: "user 1".to_string()
            })
        );
        assert_eq!(
            ApiError::from_status(429, "x").map(|e| e.code()),
            Some(ErrorCode::RateLimit)
        );
        assert_eq!(ApiError::from_status(500, "x"), None);
    }

    #[test]
    fn test_classify_direct() {
        let err = anyhow::Error::new(ApiError::Forbidden);
        assert_eq!(classify(&err), ErrorClass::Expected(ErrorCode::Forbidden));
    }

    #[test]
    fn test_classify_through_context() {
        let result: Result<(), ApiError> = Err(ApiError::NotFound {
            resource: "user 9".to_string(),
        });
        let err = result.context("blocking user 9").unwrap_err();

        assert_eq!(classify(&err), ErrorClass::Expected(ErrorCode::NotFound));
    }

    #[test]
    fn test_classify_unexpected() {
        let err = anyhow!("connection reset");
        assert_eq!(classify(&err), ErrorClass::Unexpected);
        assert_eq!(ErrorCode::RateLimit.as_str(), "rateLimit");
    }
}
