//! Error types for nano-decode.

use thiserror::Error;

/// Result type alias for nano-decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nano-decode.
#[derive(Error, Debug)]
pub enum Error {
    /// Prompt contains tokens the tokenizer cannot resolve.
    #[error("tokenization error: {0}")]
    Tokenization(String),

    /// The model inference port failed, timed out, or returned
    /// malformed logits.
    #[error("inference error: {0}")]
    Inference(String),

    /// The policy pipeline pruned the candidate set to empty and no
    /// fallback was configured.
    #[error("no candidates left after filtering")]
    NoCandidates,

    /// Invalid decode state transition.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Configuration error, fatal at request setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
