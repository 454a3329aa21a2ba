//! Lifecycle event stream. External collaborators (identity/orchestration
//! services) observe the engine exclusively through this surface and the
//! public operation set; one event is published per completed operation,
//! success or failure.

use serde::Serialize;
use std::time::SystemTime;


/// Discriminant of an [`EngineEvent`], matching the wire `type` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Engine finished initialization.
    Initialized,
    /// A key pair was generated and stored.
    KeyPairGenerated,
    /// A shared secret was encapsulated.
    DataEncapsulated,
    /// A shared secret was recovered.
    DataDecapsulated,
    /// A message was signed.
    MessageSigned,
    /// A signature was checked (in either direction).
    SignatureVerified,
    /// An operation failed.
    Error,
}

/// Everything observers need to follow the engine's lifecycle flows through
/// this enum.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Engine finished initialization and is accepting operations.
    Initialized {
        /// Number of catalog entries.
        algorithms_supported: usize,
        /// Emission instant.
        timestamp: SystemTime,
    },
    /// A key pair was generated and stored under `key_id`.
    KeyPairGenerated {
        /// Pair identifier.
        key_id: String,
        /// Generating algorithm.
        algorithm: String,
        /// Wall-clock cost of the operation.
        duration_ms: f64,
        /// Emission instant.
        timestamp: SystemTime,
    },
    /// A shared secret was encapsulated to a stored public key.
    DataEncapsulated {
        /// Pair identifier of the public key used.
        key_id: String,
        /// Algorithm of the key.
        algorithm: String,
        /// Caller-supplied context, carried through verbatim.
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<Vec<u8>>,
        /// Wall-clock cost of the operation.
        duration_ms: f64,
        /// Emission instant.
        timestamp: SystemTime,
    },
    /// A shared secret was recovered with a stored private key.
    DataDecapsulated {
        /// Pair identifier of the private key used.
        key_id: String,
        /// Algorithm of the key.
        algorithm: String,
        /// Wall-clock cost of the operation.
        duration_ms: f64,
        /// Emission instant.
        timestamp: SystemTime,
    },
    /// A message was signed with a stored private key.
    MessageSigned {
        /// Pair identifier of the private key used.
        key_id: String,
        /// Algorithm of the key.
        algorithm: String,
        /// Wall-clock cost of the operation.
        duration_ms: f64,
        /// Emission instant.
        timestamp: SystemTime,
    },
    /// A signature was checked against a stored public key.
    SignatureVerified {
        /// Pair identifier of the public key used.
        key_id: String,
        /// Algorithm of the key.
        algorithm: String,
        /// Whether the signature was accepted.
        accepted: bool,
        /// Wall-clock cost of the operation.
        duration_ms: f64,
        /// Emission instant.
        timestamp: SystemTime,
    },
    /// An operation failed; the same error was returned to the caller.
    Error {
        /// Name of the originating operation.
        operation: String,
        /// Stable error-kind tag.
        kind: String,
        /// Key id involved, when one was resolved.
        #[serde(skip_serializing_if = "Option::is_none")]
        key_id: Option<String>,
        /// Algorithm involved, when one was resolved.
        #[serde(skip_serializing_if = "Option::is_none")]
        algorithm: Option<String>,
        /// Emission instant.
        timestamp: SystemTime,
    },
}

impl EngineEvent {
    /// The event's discriminant.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Initialized { .. } => EventKind::Initialized,
            EngineEvent::KeyPairGenerated { .. } => EventKind::KeyPairGenerated,
            EngineEvent::DataEncapsulated { .. } => EventKind::DataEncapsulated,
            EngineEvent::DataDecapsulated { .. } => EventKind::DataDecapsulated,
            EngineEvent::MessageSigned { .. } => EventKind::MessageSigned,
            EngineEvent::SignatureVerified { .. } => EventKind::SignatureVerified,
            EngineEvent::Error { .. } => EventKind::Error,
        }
    }

    /// Emission instant, uniform across variants.
    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        match self {
            EngineEvent::Initialized { timestamp, .. }
            | EngineEvent::KeyPairGenerated { timestamp, .. }
            | EngineEvent::DataEncapsulated { timestamp, .. }
            | EngineEvent::DataDecapsulated { timestamp, .. }
            | EngineEvent::MessageSigned { timestamp, .. }
            | EngineEvent::SignatureVerified { timestamp, .. }
            | EngineEvent::Error { timestamp, .. } => *timestamp,
        }
    }
}


/// Observer seam: implementors receive every published event, synchronously,
/// in emission order.
pub trait EventSink: Send + Sync {
    /// Called once per published event.
    fn on_event(&self, event: &EngineEvent);
}
