//! Error types for the entities crate.

use thiserror::Error;

/// Errors raised while turning a matched subtree into an entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    /// A field every entity of this kind must carry is absent
    #[error("Missing field {field} in {entity}")]
    MissingField { entity: &'static str, field: String },

    /// A field is present but holds something unusable
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The subtree does not look like the requested entity at all
    #[error("Not a {entity} object")]
    ShapeMismatch { entity: &'static str },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EntityError>;
