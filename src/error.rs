//! Error types for PDP communication.

use thiserror::Error;

/// Errors raised by the decision and constraint clients.
///
/// The decision path folds most of these into its fail-open/fail-closed
/// policy; the constraint path surfaces them to the caller unchanged.
#[derive(Debug, Error)]
pub enum PdpError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The request could not be delivered.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The request did not complete within the configured deadline.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The PDP answered with a non-success status.
    #[error("PDP returned HTTP {status}")]
    Status { status: u16 },

    /// The PDP answered 200 but the body did not match the expected shape.
    #[error("invalid PDP response: {message}")]
    InvalidResponse { message: String },

    /// Action name outside the closed advisory vocabulary.
    #[error("unsupported action: {name}")]
    UnsupportedAction { name: String },
}

/// Result alias for PDP operations.
pub type PdpResult<T> = Result<T, PdpError>;
