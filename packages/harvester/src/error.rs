//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with detailed error context, and `TransportError` for the single
//! request/response primitive underneath it.

use std::fmt;

use thiserror::Error;

/// What went wrong in a single provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection failure, timeout, or non-2xx status.
    Network,
    /// The body was not JSON or did not match the requested shape.
    Parse,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("network"),
            Self::Parse => f.write_str("parse"),
        }
    }
}

/// Failure of one provider request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} error fetching {url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Network,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Parse,
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// A provider request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Payload parsed but is semantically unusable.
    #[error("Unexpected payload in {context}: {message}")]
    Schema { context: String, message: String },

    /// One step of an extraction sequence failed.
    #[error("Extraction of {identity} in category '{category}' failed: {source}")]
    Extraction {
        category: String,
        identity: String,
        #[source]
        source: Box<HarvesterError>,
    },

    /// `size()`, `version()` or `extract_all()` called before `init()`.
    #[error("Extractor for category '{0}' has not been initialized")]
    NotInitialized(String),

    /// `extract_all()` called a second time without a fresh `init()`.
    #[error("Extraction sequence for category '{0}' was already consumed; call init() again")]
    SequenceConsumed(String),

    /// Category name not present in the registry.
    #[error("Unknown category: '{0}'. Use `list` to see the available categories")]
    UnknownCategory(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (state file) error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HarvesterError {
    /// Build a schema error for a payload at `context`.
    pub fn schema(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            context: context.into(),
            message: message.into(),
        }
    }

    /// The entity identity carried by an extraction failure, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        match self {
            Self::Extraction { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// The URL of the underlying transport failure, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Transport(e) => Some(&e.url),
            Self::Extraction { source, .. } => source.url(),
            _ => None,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
