//! Error types for item validation, enumeration parsing and feed configuration.

use thiserror::Error;

/// A string did not match any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {enumeration} \"{value}\"")]
pub struct ParseError {
    /// Name of the enumeration that was targeted, e.g. `"category"`.
    pub enumeration: &'static str,
    /// The raw, unmodified input.
    pub value: String,
}

impl ParseError {
    pub fn new(enumeration: &'static str, value: impl Into<String>) -> Self {
        Self {
            enumeration,
            value: value.into(),
        }
    }
}

/// A raw item field is structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{field}` is missing")]
    Missing { field: &'static str },

    #[error("field `{field}` is empty")]
    Empty { field: &'static str },

    #[error("field `{field}` is not an integer: {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("field `{field}` is not a valid timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("field `{field}` is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::Empty { field }
            | Self::NotAnInteger { field, .. }
            | Self::InvalidTimestamp { field, .. }
            | Self::InvalidUrl { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("aggregate feed requires a home page URL")]
    MissingHomePageUrl,

    #[error("`{field}` is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Umbrella error for the pure core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type FeedResult<T> = Result<T, FeedError>;
