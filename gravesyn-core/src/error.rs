//! Typed error handling for gravesyn.
//!
//! Errors fall into two classes that callers treat differently:
//! per-item input errors (a bad card record, a self-pair) are recorded and
//! the batch keeps going, while configuration errors (a rule that does not
//! compile) abort before any classification runs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gravesyn operations.
#[derive(Error, Debug)]
pub enum GravesynError {
    /// Malformed card record: empty id, empty text, or a duplicate id
    #[error("Invalid card '{card_id}': {message}")]
    InvalidCard { card_id: String, message: String },

    /// A candidate pair naming the same card twice
    #[error("Self-pair rejected for card '{card_id}'")]
    SelfPair { card_id: String },

    /// A candidate pair naming a card absent from the batch
    #[error("Unknown card '{card_id}' in candidate pair")]
    UnknownCard { card_id: String },

    /// A Pattern Library rule that cannot be compiled or registered
    #[error("Invalid rule '{rule_id}': {message}")]
    InvalidRule { rule_id: String, message: String },

    /// Scoring policy with a non-positive or non-finite weight
    #[error("Invalid scoring policy: {message}")]
    InvalidPolicy { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// I/O error when reading configuration or input files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl GravesynError {
    /// Create an invalid-card error.
    pub fn invalid_card(card_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCard {
            card_id: card_id.into(),
            message: message.into(),
        }
    }

    /// Create a self-pair error.
    pub fn self_pair(card_id: impl Into<String>) -> Self {
        Self::SelfPair {
            card_id: card_id.into(),
        }
    }

    /// Create an unknown-card error.
    pub fn unknown_card(card_id: impl Into<String>) -> Self {
        Self::UnknownCard {
            card_id: card_id.into(),
        }
    }

    /// Create an invalid-rule error.
    pub fn invalid_rule(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-policy error.
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Check if this is a per-item error the batch can continue past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidCard { .. } | Self::SelfPair { .. } | Self::UnknownCard { .. }
        )
    }

    /// Get the card associated with this error, if any.
    pub fn card_id(&self) -> Option<&str> {
        match self {
            Self::InvalidCard { card_id, .. } => Some(card_id),
            Self::SelfPair { card_id } => Some(card_id),
            Self::UnknownCard { card_id } => Some(card_id),
            _ => None,
        }
    }
}

/// Convenience type alias for gravesyn results.
pub type GravesynResult<T> = Result<T, GravesynError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> GravesynResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> GravesynResult<T> {
        self.map_err(|e| GravesynError::io(path, e))
    }
}
