//! Unified error type for engine operations.
//!
//! Every failure is surfaced synchronously to the caller and mirrored on the
//! event stream as an `error` event; the stream is an observability
//! side-channel, never the primary delivery mechanism.

use crate::registry::KeyRole;
use crate::telemetry::Operation;
use thiserror::Error;


/// Typed failure for every engine operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The requested algorithm name is absent from the catalog or has no
    /// backing scheme.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No stored key under this id and role.
    #[error("key not found: {key_id} ({role})")]
    KeyNotFound {
        /// The id that failed to resolve.
        key_id: String,
        /// The role that was requested.
        role: KeyRole,
    },

    /// The stored key's algorithm kind does not support the requested
    /// operation (e.g. signing with a KEM key).
    #[error("operation {operation} not supported for {algorithm}")]
    OperationNotSupported {
        /// Algorithm of the stored key.
        algorithm: String,
        /// The operation that was attempted.
        operation: Operation,
    },

    /// The signing rejection-sampling loop hit its attempt cap.
    #[error("signature generation exhausted after {attempts} attempts")]
    SignatureGenerationExhausted {
        /// Attempts consumed before giving up.
        attempts: u32,
    },

    /// The caller's cancellation token fired before signing completed.
    #[error("operation cancelled by caller")]
    OperationCancelled,

    /// An operation was issued before [`crate::engine::Engine::initialize`].
    #[error("engine not initialized")]
    EngineNotInitialized,

    /// A byte buffer had the wrong shape for its declared algorithm.
    #[error("malformed input: {0}")]
    MalformedInput(&'static str),

    /// The system random number generator failed.
    #[error("random number generator failure")]
    RngFailure,
}

impl EngineError {
    /// Stable kind tag carried on `error` events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            EngineError::KeyNotFound { .. } => "key_not_found",
            EngineError::OperationNotSupported { .. } => "operation_not_supported",
            EngineError::SignatureGenerationExhausted { .. } => "signature_generation_exhausted",
            EngineError::OperationCancelled => "operation_cancelled",
            EngineError::EngineNotInitialized => "engine_not_initialized",
            EngineError::MalformedInput(_) => "malformed_input",
            EngineError::RngFailure => "rng_failure",
        }
    }
}

/// Alias for fallible engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
