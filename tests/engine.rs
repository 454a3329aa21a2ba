use pqlattice::catalog::AlgorithmKind;
use pqlattice::dsa::CancelToken;
use pqlattice::engine::{Engine, EngineConfig, SignOptions};
use pqlattice::error::EngineError;
use pqlattice::events::{EngineEvent, EventKind, EventSink};
use pqlattice::registry::{KeyRole, KeyUsage};
use pqlattice::telemetry::Operation;
use std::sync::{Arc, Mutex};

/// Test sink that records every published event kind in order.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<EngineEvent>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(EngineEvent::kind).collect()
    }

    fn last_error_kind(&self) -> Option<String> {
        self.events.lock().unwrap().iter().rev().find_map(|e| match e {
            EngineEvent::Error { kind, .. } => Some(kind.clone()),
            _ => None,
        })
    }
}

impl EventSink for Recorder {
    fn on_event(&self, event: &EngineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn ready_engine() -> (Engine, Arc<Recorder>) {
    let engine = Engine::new(EngineConfig::default());
    let recorder = Arc::new(Recorder::default());
    engine.subscribe(recorder.clone());
    engine.initialize();
    (engine, recorder)
}

#[test]
fn scenario_kem_roundtrip_through_facade() {
    let (engine, recorder) = ready_engine();

    let pair = engine.generate_key_pair("KYBER-768", None).unwrap();
    let enc = engine.encapsulate(&pair.key_id, None).unwrap();
    assert_eq!(enc.shared_secret.len(), 32);
    assert_eq!(enc.algorithm, "KYBER-768");
    assert_eq!(enc.security_level, 3);

    let secret = engine.decapsulate(&pair.key_id, &enc.ciphertext).unwrap();
    assert_eq!(secret, enc.shared_secret);

    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::Initialized,
            EventKind::KeyPairGenerated,
            EventKind::DataEncapsulated,
            EventKind::DataDecapsulated,
        ]
    );
}

#[test]
fn scenario_signature_roundtrip_through_facade() {
    let (engine, recorder) = ready_engine();

    let pair = engine.generate_key_pair("DILITHIUM-3", None).unwrap();
    let result = engine.sign(&pair.key_id, b"hello").unwrap();
    assert_eq!(result.algorithm, "DILITHIUM-3");
    assert_eq!(result.public_key_used, pair.public_key);
    assert_eq!(result.message, b"hello");

    assert!(engine.verify(&pair.key_id, b"hello", &result.signature).unwrap());
    assert!(!engine.verify(&pair.key_id, b"goodbye", &result.signature).unwrap());

    // a flipped byte is a normal `false`, not an error
    let mut tampered = result.signature.clone();
    tampered[100] ^= 0x01;
    assert!(!engine.verify(&pair.key_id, b"hello", &tampered).unwrap());

    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::Initialized,
            EventKind::KeyPairGenerated,
            EventKind::MessageSigned,
            EventKind::SignatureVerified,
            EventKind::SignatureVerified,
            EventKind::SignatureVerified,
        ]
    );
}

#[test]
fn scenario_unknown_algorithm_fails_hard() {
    let (engine, recorder) = ready_engine();
    let err = engine.generate_key_pair("UNKNOWN-ALGO", None).unwrap_err();
    assert_eq!(err, EngineError::UnsupportedAlgorithm("UNKNOWN-ALGO".to_owned()));
    // no placeholder material may be synthesized
    assert!(engine.get_stored_keys().is_empty());
    assert_eq!(recorder.last_error_kind().unwrap(), "unsupported_algorithm");
}

#[test]
fn catalog_is_stable_and_complete() {
    let (engine, _recorder) = ready_engine();
    let algorithms = engine.get_algorithms();
    assert_eq!(algorithms.len(), 6);
    assert_eq!(algorithms.iter().filter(|a| a.kind == AlgorithmKind::Kem).count(), 3);
    assert_eq!(algorithms.iter().filter(|a| a.kind == AlgorithmKind::Signature).count(), 3);

    let a = engine.get_algorithm("DILITHIUM-5").unwrap();
    let b = engine.get_algorithm("DILITHIUM-5").unwrap();
    assert_eq!(a, b);
    assert!(engine.get_algorithm("UNKNOWN-ALGO").is_none());
}

#[test]
fn stored_keys_match_declared_sizes() {
    let (engine, _recorder) = ready_engine();
    for name in ["KYBER-512", "KYBER-1024", "DILITHIUM-2"] {
        let pair = engine.generate_key_pair(name, None).unwrap();
        let descriptor = engine.get_algorithm(name).unwrap();
        let public = engine.get_key(&pair.key_id, KeyRole::Public).unwrap();
        let private = engine.get_key(&pair.key_id, KeyRole::Private).unwrap();
        assert_eq!(public.bytes.len(), descriptor.key_sizes.public_key);
        assert_eq!(private.bytes.len(), descriptor.key_sizes.private_key);
        assert_eq!(public.key_id, private.key_id);
        assert!(public.metadata.quantum_safe);
        assert_eq!(public.metadata.security_level, descriptor.security_level);
    }
}

#[test]
fn key_usages_follow_roles() {
    let (engine, _recorder) = ready_engine();
    let kem_pair = engine.generate_key_pair("KYBER-512", None).unwrap();
    let dsa_pair = engine.generate_key_pair("DILITHIUM-2", None).unwrap();

    let kem_public = engine.get_key(&kem_pair.key_id, KeyRole::Public).unwrap();
    assert!(kem_public.metadata.allowed_usages.contains(&KeyUsage::Encrypt));
    let kem_private = engine.get_key(&kem_pair.key_id, KeyRole::Private).unwrap();
    assert!(kem_private.metadata.allowed_usages.contains(&KeyUsage::Decrypt));

    let dsa_public = engine.get_key(&dsa_pair.key_id, KeyRole::Public).unwrap();
    assert!(dsa_public.metadata.allowed_usages.contains(&KeyUsage::Verify));
    let dsa_private = engine.get_key(&dsa_pair.key_id, KeyRole::Private).unwrap();
    assert!(dsa_private.metadata.allowed_usages.contains(&KeyUsage::Sign));
}

#[test]
fn delete_removes_both_roles_atomically() {
    let (engine, _recorder) = ready_engine();
    let keep = engine.generate_key_pair("KYBER-512", None).unwrap();
    let doomed = engine.generate_key_pair("DILITHIUM-2", None).unwrap();
    let before = engine.get_stored_keys().len();
    assert_eq!(before, 4);

    assert!(engine.delete_key(&doomed.key_id));
    assert!(engine.get_key(&doomed.key_id, KeyRole::Public).is_none());
    assert!(engine.get_key(&doomed.key_id, KeyRole::Private).is_none());
    assert_eq!(engine.get_stored_keys().len(), before - 2);
    assert!(engine.get_key(&keep.key_id, KeyRole::Public).is_some());

    assert!(!engine.delete_key(&doomed.key_id));

    // operations on the deleted pair now fail typed
    let err = engine.sign(&doomed.key_id, b"m").unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound { .. }));
}

#[test]
fn caller_supplied_key_id_is_honored() {
    let (engine, _recorder) = ready_engine();
    let pair = engine
        .generate_key_pair("DILITHIUM-2", Some("alpha-attestation-key".to_owned()))
        .unwrap();
    assert_eq!(pair.key_id, "alpha-attestation-key");
    assert!(engine.get_key("alpha-attestation-key", KeyRole::Private).is_some());
}

#[test]
fn telemetry_counts_only_successful_calls() {
    let (engine, _recorder) = ready_engine();
    for _ in 0..3 {
        engine.generate_key_pair("KYBER-768", None).unwrap();
    }
    // failures must not advance any counter
    let _ = engine.generate_key_pair("UNKNOWN-ALGO", None).unwrap_err();
    let kem_pair = engine.generate_key_pair("KYBER-512", None).unwrap();
    let _ = engine.sign(&kem_pair.key_id, b"m").unwrap_err();

    let metrics = engine.get_performance_metrics();
    assert_eq!(metrics.get("KYBER-768", Operation::Keygen).unwrap().count, 3);
    assert_eq!(metrics.get("KYBER-512", Operation::Keygen).unwrap().count, 1);
    assert!(metrics.get("KYBER-512", Operation::Sign).is_none());
    assert!(metrics.get("UNKNOWN-ALGO", Operation::Keygen).is_none());

    let keygen = metrics.get("KYBER-768", Operation::Keygen).unwrap();
    assert!(keygen.avg_duration_ms >= 0.0);
}

#[test]
fn kind_mismatch_is_operation_not_supported() {
    let (engine, recorder) = ready_engine();
    let kem_pair = engine.generate_key_pair("KYBER-768", None).unwrap();
    let dsa_pair = engine.generate_key_pair("DILITHIUM-3", None).unwrap();

    let err = engine.sign(&kem_pair.key_id, b"m").unwrap_err();
    assert_eq!(
        err,
        EngineError::OperationNotSupported {
            algorithm: "KYBER-768".to_owned(),
            operation: Operation::Sign,
        }
    );
    assert_eq!(recorder.last_error_kind().unwrap(), "operation_not_supported");

    let err = engine.encapsulate(&dsa_pair.key_id, None).unwrap_err();
    assert_eq!(
        err,
        EngineError::OperationNotSupported {
            algorithm: "DILITHIUM-3".to_owned(),
            operation: Operation::Encrypt,
        }
    );

    let err = engine.verify(&kem_pair.key_id, b"m", &[0u8; 4]).unwrap_err();
    assert!(matches!(err, EngineError::OperationNotSupported { .. }));
}

#[test]
fn malformed_ciphertext_is_typed_not_panicking() {
    let (engine, _recorder) = ready_engine();
    let pair = engine.generate_key_pair("KYBER-512", None).unwrap();
    let err = engine.decapsulate(&pair.key_id, &[0u8; 13]).unwrap_err();
    assert!(matches!(err, EngineError::MalformedInput(_)));
}

#[test]
fn cancellation_aborts_signing() {
    let (engine, recorder) = ready_engine();
    let pair = engine.generate_key_pair("DILITHIUM-2", None).unwrap();

    let token = CancelToken::new();
    token.cancel();
    let options = SignOptions { max_attempts: None, cancel: Some(token) };
    let err = engine.sign_with_options(&pair.key_id, b"slow payload", &options).unwrap_err();
    assert_eq!(err, EngineError::OperationCancelled);
    assert_eq!(recorder.last_error_kind().unwrap(), "operation_cancelled");
}

#[test]
fn attempt_cap_exhaustion_is_typed() {
    let (engine, _recorder) = ready_engine();
    let pair = engine.generate_key_pair("DILITHIUM-2", None).unwrap();
    let options = SignOptions { max_attempts: Some(0), cancel: None };
    let err = engine.sign_with_options(&pair.key_id, b"m", &options).unwrap_err();
    assert_eq!(err, EngineError::SignatureGenerationExhausted { attempts: 0 });
}

#[test]
fn uninitialized_engine_rejects_and_reports() {
    let engine = Engine::new(EngineConfig::default());
    let recorder = Arc::new(Recorder::default());
    engine.subscribe(recorder.clone());

    let err = engine.generate_key_pair("KYBER-768", None).unwrap_err();
    assert_eq!(err, EngineError::EngineNotInitialized);
    assert_eq!(recorder.last_error_kind().unwrap(), "engine_not_initialized");

    engine.initialize();
    assert!(engine.generate_key_pair("KYBER-768", None).is_ok());

    // initialize is idempotent: exactly one `initialized` event
    engine.initialize();
    let inits = recorder
        .kinds()
        .into_iter()
        .filter(|k| *k == EventKind::Initialized)
        .count();
    assert_eq!(inits, 1);
}

#[test]
fn statistics_aggregate_registry_catalog_and_telemetry() {
    let (engine, _recorder) = ready_engine();
    engine.generate_key_pair("KYBER-768", None).unwrap();
    engine.generate_key_pair("KYBER-768", None).unwrap();
    engine.generate_key_pair("DILITHIUM-3", None).unwrap();

    let stats = engine.get_statistics();
    assert_eq!(stats.total_keys, 6);
    assert_eq!(stats.algorithms_supported, 6);
    assert_eq!(stats.usage_breakdown["KYBER-768"], 4);
    assert_eq!(stats.usage_breakdown["DILITHIUM-3"], 2);
    assert_eq!(stats.performance.get("KYBER-768", Operation::Keygen).unwrap().count, 2);

    // the aggregate view is serializable for dashboards
    let json = serde_json::to_string(&stats).unwrap();
    assert!(json.contains("\"total_keys\":6"));
}

#[test]
fn isolated_engines_share_nothing() {
    let (a, _ra) = ready_engine();
    let (b, _rb) = ready_engine();
    a.generate_key_pair("KYBER-512", None).unwrap();
    assert_eq!(a.get_stored_keys().len(), 2);
    assert!(b.get_stored_keys().is_empty());
    assert!(b.get_performance_metrics().get("KYBER-512", Operation::Keygen).is_none());
}

#[test]
fn encapsulation_context_reaches_the_event_stream() {
    let (engine, recorder) = ready_engine();
    let pair = engine.generate_key_pair("KYBER-1024", None).unwrap();
    let enc = engine.encapsulate(&pair.key_id, Some(b"session-42")).unwrap();

    // context travels on the event, not in the ciphertext
    let events = recorder.events.lock().unwrap();
    let found = events.iter().any(|e| {
        matches!(e, EngineEvent::DataEncapsulated { context: Some(c), .. }
            if c.as_slice() == b"session-42".as_slice())
    });
    assert!(found);
    drop(events);

    let secret = engine.decapsulate(&pair.key_id, &enc.ciphertext).unwrap();
    assert_eq!(secret, enc.shared_secret);
}
