//! Error types for the pipeline crate.

use thiserror::Error;

/// Errors raised while loading or building a pipeline configuration
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The configuration is not valid JSON for the expected shape
    #[error("Invalid pipeline config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A rule's parameters make no sense
    #[error("Invalid parameters for rule {rule}: {reason}")]
    InvalidRule { rule: String, reason: String },
}

/// Convenience type alias for Results with PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;
