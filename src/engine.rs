//! Engine façade: the single entry point that dispatches to the scheme
//! instances, manages stored key material, updates telemetry, and publishes
//! lifecycle events.
//!
//! All collaborator state (catalog, registry, telemetry, subscribers) is
//! owned by the engine instance; tests build as many isolated engines as
//! they need.

use crate::catalog::{AlgorithmDescriptor, Catalog};
use crate::dsa::{CancelToken, Dsa, SignError};
use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventSink};
use crate::kem::Kem;
use crate::params::{lookup, SchemeParams};
use crate::registry::{CryptographicKey, KeyMetadata, KeyRegistry, KeyRole, KeyUsage};
use crate::telemetry::{Operation, Telemetry, TelemetrySnapshot};
use parking_lot::Mutex;
use rand_core::{CryptoRngCore, OsRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info, warn};


/// Engine construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Hard cap on signing rejection-sampling attempts.
    pub max_sign_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self { Self { max_sign_attempts: 1000 } }
}


/// Per-call signing overrides.
#[derive(Clone, Debug, Default)]
pub struct SignOptions {
    /// Overrides the configured attempt cap when set.
    pub max_attempts: Option<u32>,
    /// Cooperative cancellation, checked between rejection attempts.
    pub cancel: Option<CancelToken>,
}


/// Result of [`Engine::generate_key_pair`].
#[derive(Clone, Debug)]
pub struct GeneratedKeyPair {
    /// Pair identifier under which both roles are stored.
    pub key_id: String,
    /// Packed public key.
    pub public_key: Vec<u8>,
    /// Packed private key.
    pub private_key: Vec<u8>,
}

/// Ephemeral value object returned by [`Engine::encapsulate`]; never stored.
#[derive(Clone, Debug)]
pub struct EncryptionResult {
    /// Algorithm of the key used.
    pub algorithm: String,
    /// Packed ciphertext.
    pub ciphertext: Vec<u8>,
    /// Derived shared secret.
    pub shared_secret: Vec<u8>,
    /// Completion instant.
    pub timestamp: SystemTime,
    /// Pair identifier of the key used.
    pub key_id: String,
    /// Security category of the algorithm.
    pub security_level: u8,
}

/// Ephemeral value object returned by [`Engine::sign`]; never stored.
#[derive(Clone, Debug)]
pub struct SignatureResult {
    /// Algorithm of the key used.
    pub algorithm: String,
    /// Packed signature.
    pub signature: Vec<u8>,
    /// Packed public key of the pair, for downstream verification.
    pub public_key_used: Vec<u8>,
    /// The signed message, echoed back.
    pub message: Vec<u8>,
    /// Completion instant.
    pub timestamp: SystemTime,
    /// Pair identifier of the key used.
    pub key_id: String,
    /// Security category of the algorithm.
    pub security_level: u8,
}

/// Aggregate engine statistics.
#[derive(Clone, Debug, Serialize)]
pub struct EngineStatistics {
    /// Stored key records (roles, not pairs).
    pub total_keys: usize,
    /// Catalog size.
    pub algorithms_supported: usize,
    /// Stored-record count per algorithm.
    pub usage_breakdown: BTreeMap<String, u64>,
    /// Telemetry snapshot.
    pub performance: TelemetrySnapshot,
}


/// The engine façade. Construct with [`Engine::new`], arm with
/// [`Engine::initialize`], then drive through the operation set.
pub struct Engine {
    config: EngineConfig,
    catalog: Catalog,
    registry: KeyRegistry,
    telemetry: Telemetry,
    sinks: Mutex<Vec<Arc<dyn EventSink>>>,
    ready: AtomicBool,
}

impl Default for Engine {
    fn default() -> Self { Self::new(EngineConfig::default()) }
}

impl Engine {
    /// Builds an engine with its own catalog, registry, and telemetry. The
    /// engine rejects operations until [`Engine::initialize`] is called.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
            registry: KeyRegistry::new(),
            telemetry: Telemetry::new(),
            sinks: Mutex::new(Vec::new()),
            ready: AtomicBool::new(false),
        }
    }

    /// Registers an event subscriber. Subscribers receive every published
    /// event, synchronously, in emission order.
    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks.lock().push(sink);
    }

    /// Arms the engine and publishes the `initialized` event. Idempotent.
    pub fn initialize(&self) {
        if self.ready.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(algorithms = self.catalog.len(), "engine initialized");
        self.publish(&EngineEvent::Initialized {
            algorithms_supported: self.catalog.len(),
            timestamp: SystemTime::now(),
        });
    }

    // ----- primary operations -----

    /// Generates, stores, and returns a key pair for a cataloged algorithm.
    /// Callers may supply their own pair id; otherwise a fresh 32-hex-char
    /// token is drawn from the system generator.
    ///
    /// # Errors
    /// `UnsupportedAlgorithm` for a name without a backing scheme — no
    /// placeholder material is ever synthesized — plus `EngineNotInitialized`
    /// and `RngFailure`.
    pub fn generate_key_pair(
        &self, algorithm: &str, key_id: Option<String>,
    ) -> EngineResult<GeneratedKeyPair> {
        let op = "generate_key_pair";
        self.ensure_ready()
            .map_err(|e| self.fail(op, None, Some(algorithm.to_owned()), e))?;

        let Some(params) = lookup(algorithm) else {
            return Err(self.fail(
                op,
                None,
                Some(algorithm.to_owned()),
                EngineError::UnsupportedAlgorithm(algorithm.to_owned()),
            ));
        };
        let descriptor =
            self.catalog.get(algorithm).expect("catalog and params cover the same names").clone();

        let key_id = match key_id {
            Some(id) => id,
            None => random_key_id(&mut OsRng)
                .map_err(|e| self.fail(op, None, Some(algorithm.to_owned()), e))?,
        };

        let start = Instant::now();
        let (public_key, private_key, usages) = match params {
            SchemeParams::Kem(p) => {
                let (pk, sk) = Kem::new(p)
                    .try_keygen_with_rng(&mut OsRng)
                    .map_err(|_| EngineError::RngFailure)
                    .map_err(|e| self.fail(op, Some(key_id.clone()), Some(algorithm.to_owned()), e))?;
                (pk, sk, (KeyUsage::Encrypt, KeyUsage::Decrypt))
            }
            SchemeParams::Dsa(p) => {
                let (pk, sk) = Dsa::new(p)
                    .try_keygen_with_rng(&mut OsRng)
                    .map_err(|_| EngineError::RngFailure)
                    .map_err(|e| self.fail(op, Some(key_id.clone()), Some(algorithm.to_owned()), e))?;
                (pk, sk, (KeyUsage::Verify, KeyUsage::Sign))
            }
        };
        let elapsed = start.elapsed();

        let created_at = SystemTime::now();
        debug_assert_eq!(public_key.len(), descriptor.key_sizes.public_key);
        debug_assert_eq!(private_key.len(), descriptor.key_sizes.private_key);
        self.registry.store(key_record(
            &descriptor,
            &key_id,
            KeyRole::Public,
            public_key.clone(),
            created_at,
            usages.0,
        ));
        self.registry.store(key_record(
            &descriptor,
            &key_id,
            KeyRole::Private,
            private_key.clone(),
            created_at,
            usages.1,
        ));

        self.telemetry.record(algorithm, Operation::Keygen, elapsed);
        info!(%key_id, algorithm, "key pair generated");
        self.publish(&EngineEvent::KeyPairGenerated {
            key_id: key_id.clone(),
            algorithm: algorithm.to_owned(),
            duration_ms: millis(elapsed),
            timestamp: SystemTime::now(),
        });

        Ok(GeneratedKeyPair { key_id, public_key, private_key })
    }

    /// Encapsulates a fresh shared secret to a stored public key. The
    /// optional context is carried into the emitted event verbatim; it does
    /// not alter the ciphertext or the secret.
    ///
    /// # Errors
    /// `KeyNotFound`, `OperationNotSupported` for a non-KEM key,
    /// `EngineNotInitialized`, `RngFailure`.
    pub fn encapsulate(
        &self, public_key_id: &str, context: Option<&[u8]>,
    ) -> EngineResult<EncryptionResult> {
        let op = "encapsulate";
        self.ensure_ready().map_err(|e| self.fail(op, Some(public_key_id.to_owned()), None, e))?;

        let key = self
            .lookup_key(public_key_id, KeyRole::Public)
            .map_err(|e| self.fail(op, Some(public_key_id.to_owned()), None, e))?;
        let params = self
            .kem_params(&key, Operation::Encrypt)
            .map_err(|e| self.fail(op, Some(public_key_id.to_owned()), Some(key.algorithm.clone()), e))?;

        let start = Instant::now();
        let enc = Kem::new(params)
            .try_encapsulate_with_rng(&mut OsRng, &key.bytes)
            .map_err(|_| EngineError::RngFailure)
            .map_err(|e| self.fail(op, Some(public_key_id.to_owned()), Some(key.algorithm.clone()), e))?;
        let elapsed = start.elapsed();

        self.telemetry.record(&key.algorithm, Operation::Encrypt, elapsed);
        debug!(key_id = %public_key_id, algorithm = %key.algorithm, "encapsulated");
        self.publish(&EngineEvent::DataEncapsulated {
            key_id: public_key_id.to_owned(),
            algorithm: key.algorithm.clone(),
            context: context.map(<[u8]>::to_vec),
            duration_ms: millis(elapsed),
            timestamp: SystemTime::now(),
        });

        Ok(EncryptionResult {
            algorithm: key.algorithm,
            ciphertext: enc.ciphertext,
            shared_secret: enc.shared_secret.to_vec(),
            timestamp: SystemTime::now(),
            key_id: public_key_id.to_owned(),
            security_level: key.metadata.security_level,
        })
    }

    /// Recovers a shared secret with a stored private key.
    ///
    /// # Errors
    /// `KeyNotFound`, `OperationNotSupported` for a non-KEM key,
    /// `MalformedInput` for a wrong-shape ciphertext, `EngineNotInitialized`.
    pub fn decapsulate(&self, private_key_id: &str, ciphertext: &[u8]) -> EngineResult<Vec<u8>> {
        let op = "decapsulate";
        self.ensure_ready().map_err(|e| self.fail(op, Some(private_key_id.to_owned()), None, e))?;

        let key = self
            .lookup_key(private_key_id, KeyRole::Private)
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), None, e))?;
        let params = self
            .kem_params(&key, Operation::Decrypt)
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), Some(key.algorithm.clone()), e))?;

        let start = Instant::now();
        let shared_secret = Kem::new(params)
            .decapsulate(&key.bytes, ciphertext)
            .map_err(EngineError::MalformedInput)
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), Some(key.algorithm.clone()), e))?;
        let elapsed = start.elapsed();

        self.telemetry.record(&key.algorithm, Operation::Decrypt, elapsed);
        debug!(key_id = %private_key_id, algorithm = %key.algorithm, "decapsulated");
        self.publish(&EngineEvent::DataDecapsulated {
            key_id: private_key_id.to_owned(),
            algorithm: key.algorithm,
            duration_ms: millis(elapsed),
            timestamp: SystemTime::now(),
        });

        Ok(shared_secret.to_vec())
    }

    /// Signs a message with a stored private key, using the configured
    /// attempt cap.
    ///
    /// # Errors
    /// `KeyNotFound`, `OperationNotSupported` for a non-signature key,
    /// `SignatureGenerationExhausted` at the cap, `EngineNotInitialized`,
    /// `RngFailure`.
    pub fn sign(&self, private_key_id: &str, message: &[u8]) -> EngineResult<SignatureResult> {
        self.sign_with_options(private_key_id, message, &SignOptions::default())
    }

    /// Signs with per-call overrides: attempt cap and cooperative
    /// cancellation.
    ///
    /// # Errors
    /// As [`Engine::sign`], plus `OperationCancelled` when the token fires.
    pub fn sign_with_options(
        &self, private_key_id: &str, message: &[u8], options: &SignOptions,
    ) -> EngineResult<SignatureResult> {
        let op = "sign";
        self.ensure_ready().map_err(|e| self.fail(op, Some(private_key_id.to_owned()), None, e))?;

        let key = self
            .lookup_key(private_key_id, KeyRole::Private)
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), None, e))?;
        let params = self
            .dsa_params(&key, Operation::Sign)
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), Some(key.algorithm.clone()), e))?;
        let public = self
            .lookup_key(private_key_id, KeyRole::Public)
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), Some(key.algorithm.clone()), e))?;

        let max_attempts = options.max_attempts.unwrap_or(self.config.max_sign_attempts);
        let start = Instant::now();
        let signature = Dsa::new(params)
            .try_sign_with_rng(&mut OsRng, &key.bytes, message, max_attempts, options.cancel.as_ref())
            .map_err(|e| match e {
                SignError::Exhausted { attempts } => {
                    EngineError::SignatureGenerationExhausted { attempts }
                }
                SignError::Cancelled => EngineError::OperationCancelled,
                SignError::Malformed(msg) => EngineError::MalformedInput(msg),
                SignError::Rng => EngineError::RngFailure,
            })
            .map_err(|e| self.fail(op, Some(private_key_id.to_owned()), Some(key.algorithm.clone()), e))?;
        let elapsed = start.elapsed();

        self.telemetry.record(&key.algorithm, Operation::Sign, elapsed);
        debug!(key_id = %private_key_id, algorithm = %key.algorithm, "message signed");
        self.publish(&EngineEvent::MessageSigned {
            key_id: private_key_id.to_owned(),
            algorithm: key.algorithm.clone(),
            duration_ms: millis(elapsed),
            timestamp: SystemTime::now(),
        });

        Ok(SignatureResult {
            algorithm: key.algorithm,
            signature,
            public_key_used: public.bytes,
            message: message.to_vec(),
            timestamp: SystemTime::now(),
            key_id: private_key_id.to_owned(),
            security_level: key.metadata.security_level,
        })
    }

    /// Checks a signature against a stored public key. A structurally
    /// invalid signature yields `Ok(false)`, never an error; only system
    /// failures (unknown key, kind mismatch) are typed.
    ///
    /// # Errors
    /// `KeyNotFound`, `OperationNotSupported` for a non-signature key,
    /// `EngineNotInitialized`.
    pub fn verify(
        &self, public_key_id: &str, message: &[u8], signature: &[u8],
    ) -> EngineResult<bool> {
        let op = "verify";
        self.ensure_ready().map_err(|e| self.fail(op, Some(public_key_id.to_owned()), None, e))?;

        let key = self
            .lookup_key(public_key_id, KeyRole::Public)
            .map_err(|e| self.fail(op, Some(public_key_id.to_owned()), None, e))?;
        let params = self
            .dsa_params(&key, Operation::Verify)
            .map_err(|e| self.fail(op, Some(public_key_id.to_owned()), Some(key.algorithm.clone()), e))?;

        let start = Instant::now();
        let accepted = Dsa::new(params).verify(&key.bytes, message, signature);
        let elapsed = start.elapsed();

        self.telemetry.record(&key.algorithm, Operation::Verify, elapsed);
        debug!(key_id = %public_key_id, accepted, "signature verified");
        self.publish(&EngineEvent::SignatureVerified {
            key_id: public_key_id.to_owned(),
            algorithm: key.algorithm,
            accepted,
            duration_ms: millis(elapsed),
            timestamp: SystemTime::now(),
        });

        Ok(accepted)
    }

    // ----- catalog, registry, and telemetry views -----

    /// All supported algorithm descriptors.
    #[must_use]
    pub fn get_algorithms(&self) -> Vec<AlgorithmDescriptor> { self.catalog.list() }

    /// One descriptor by name.
    #[must_use]
    pub fn get_algorithm(&self, name: &str) -> Option<AlgorithmDescriptor> {
        self.catalog.get(name).cloned()
    }

    /// All stored key records.
    #[must_use]
    pub fn get_stored_keys(&self) -> Vec<CryptographicKey> { self.registry.list_all() }

    /// One stored key record.
    #[must_use]
    pub fn get_key(&self, key_id: &str, role: KeyRole) -> Option<CryptographicKey> {
        self.registry.get(key_id, role)
    }

    /// Deletes both roles of a pair; returns whether anything was removed.
    pub fn delete_key(&self, key_id: &str) -> bool {
        let removed = self.registry.delete(key_id);
        if removed {
            info!(%key_id, "key pair deleted");
        }
        removed
    }

    /// Owned snapshot of the timing statistics.
    #[must_use]
    pub fn get_performance_metrics(&self) -> TelemetrySnapshot { self.telemetry.snapshot() }

    /// Aggregate statistics across registry, catalog, and telemetry.
    #[must_use]
    pub fn get_statistics(&self) -> EngineStatistics {
        EngineStatistics {
            total_keys: self.registry.len(),
            algorithms_supported: self.catalog.len(),
            usage_breakdown: self.registry.usage_breakdown(),
            performance: self.telemetry.snapshot(),
        }
    }

    // ----- internals -----

    fn ensure_ready(&self) -> EngineResult<()> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::EngineNotInitialized)
        }
    }

    fn lookup_key(&self, key_id: &str, role: KeyRole) -> EngineResult<CryptographicKey> {
        self.registry.get(key_id, role).ok_or_else(|| EngineError::KeyNotFound {
            key_id: key_id.to_owned(),
            role,
        })
    }

    fn kem_params(
        &self, key: &CryptographicKey, operation: Operation,
    ) -> EngineResult<&'static crate::params::KemParams> {
        match lookup(&key.algorithm) {
            Some(SchemeParams::Kem(p)) => Ok(p),
            _ => Err(EngineError::OperationNotSupported {
                algorithm: key.algorithm.clone(),
                operation,
            }),
        }
    }

    fn dsa_params(
        &self, key: &CryptographicKey, operation: Operation,
    ) -> EngineResult<&'static crate::params::DsaParams> {
        match lookup(&key.algorithm) {
            Some(SchemeParams::Dsa(p)) => Ok(p),
            _ => Err(EngineError::OperationNotSupported {
                algorithm: key.algorithm.clone(),
                operation,
            }),
        }
    }

    /// Publishes the `error` event for a failed operation and hands the
    /// error back for synchronous return; local-first propagation with the
    /// stream as a monitoring side-channel.
    fn fail(
        &self, operation: &str, key_id: Option<String>, algorithm: Option<String>,
        error: EngineError,
    ) -> EngineError {
        warn!(operation, error = %error, "operation failed");
        self.publish(&EngineEvent::Error {
            operation: operation.to_owned(),
            kind: error.kind().to_owned(),
            key_id,
            algorithm,
            timestamp: SystemTime::now(),
        });
        error
    }

    fn publish(&self, event: &EngineEvent) {
        // snapshot the subscriber list so sinks may subscribe re-entrantly
        let sinks: Vec<Arc<dyn EventSink>> = self.sinks.lock().clone();
        for sink in sinks {
            sink.on_event(event);
        }
    }
}


fn key_record(
    descriptor: &AlgorithmDescriptor, key_id: &str, role: KeyRole, bytes: Vec<u8>,
    created_at: SystemTime, usage: KeyUsage,
) -> CryptographicKey {
    debug_assert_eq!(bytes.len(), descriptor.key_len(role), "declared size mismatch");
    CryptographicKey {
        algorithm: descriptor.name.clone(),
        role,
        bytes,
        key_id: key_id.to_owned(),
        created_at,
        expires_at: None,
        metadata: KeyMetadata {
            security_level: descriptor.security_level,
            quantum_safe: true,
            allowed_usages: [usage].into_iter().collect(),
        },
    }
}

/// Collision-resistant pair id: 16 generator bytes as 32 hex chars.
fn random_key_id(rng: &mut impl CryptoRngCore) -> EngineResult<String> {
    let mut raw = [0u8; 16];
    rng.try_fill_bytes(&mut raw).map_err(|_| EngineError::RngFailure)?;
    let mut id = String::with_capacity(32);
    for byte in raw {
        write!(id, "{byte:02x}").expect("writing to a String cannot fail");
    }
    Ok(id)
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1e3
}
