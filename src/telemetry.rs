//! Running per-(algorithm, operation) timing statistics. Counters advance
//! only on successful calls; snapshots are owned copies so tests can assert
//! instrumentation behavior without holding locks. Nothing persists beyond
//! the process; resetting means rebuilding the engine.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};


/// Engine operation, under the wire names the telemetry surface reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Key-pair generation.
    Keygen,
    /// Encapsulation.
    Encrypt,
    /// Decapsulation.
    Decrypt,
    /// Signature generation.
    Sign,
    /// Signature verification.
    Verify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Keygen => f.write_str("keygen"),
            Operation::Encrypt => f.write_str("encrypt"),
            Operation::Decrypt => f.write_str("decrypt"),
            Operation::Sign => f.write_str("sign"),
            Operation::Verify => f.write_str("verify"),
        }
    }
}


/// Running statistics for one (algorithm, operation) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationStats {
    /// Number of successful calls.
    pub count: u64,
    /// Running average duration in milliseconds.
    pub avg_duration_ms: f64,
}

impl OperationStats {
    fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        #[allow(clippy::cast_precision_loss)] // counts stay far below 2^52
        let count = self.count as f64;
        self.avg_duration_ms += (duration_ms - self.avg_duration_ms) / count;
    }
}

/// Owned, serializable copy of the telemetry state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// When the snapshot was taken.
    pub taken_at: SystemTime,
    /// Statistics per algorithm, then per operation.
    pub entries: BTreeMap<String, BTreeMap<Operation, OperationStats>>,
}

impl TelemetrySnapshot {
    /// Convenience lookup for one (algorithm, operation) cell.
    #[must_use]
    pub fn get(&self, algorithm: &str, operation: Operation) -> Option<OperationStats> {
        self.entries.get(algorithm).and_then(|ops| ops.get(&operation)).copied()
    }
}


/// Process-scoped telemetry store, guarded for concurrent façade callers.
#[derive(Default)]
pub struct Telemetry {
    state: Mutex<BTreeMap<String, BTreeMap<Operation, OperationStats>>>,
}

impl Telemetry {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Records one successful call.
    pub fn record(&self, algorithm: &str, operation: Operation, duration: Duration) {
        let mut state = self.state.lock();
        state
            .entry(algorithm.to_owned())
            .or_default()
            .entry(operation)
            .or_default()
            .record(duration.as_secs_f64() * 1e3);
    }

    /// Takes an owned snapshot of the current statistics.
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot { taken_at: SystemTime::now(), entries: self.state.lock().clone() }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_running_average() {
        let telemetry = Telemetry::new();
        telemetry.record("KYBER-768", Operation::Keygen, Duration::from_millis(4));
        telemetry.record("KYBER-768", Operation::Keygen, Duration::from_millis(8));
        telemetry.record("KYBER-768", Operation::Encrypt, Duration::from_millis(1));

        let snap = telemetry.snapshot();
        let keygen = snap.get("KYBER-768", Operation::Keygen).unwrap();
        assert_eq!(keygen.count, 2);
        assert!((keygen.avg_duration_ms - 6.0).abs() < 1e-9);
        assert_eq!(snap.get("KYBER-768", Operation::Encrypt).unwrap().count, 1);
        assert!(snap.get("KYBER-768", Operation::Sign).is_none());
        assert!(snap.get("DILITHIUM-3", Operation::Keygen).is_none());
    }

    #[test]
    fn snapshot_is_detached() {
        let telemetry = Telemetry::new();
        telemetry.record("DILITHIUM-3", Operation::Sign, Duration::from_millis(2));
        let snap = telemetry.snapshot();
        telemetry.record("DILITHIUM-3", Operation::Sign, Duration::from_millis(2));
        assert_eq!(snap.get("DILITHIUM-3", Operation::Sign).unwrap().count, 1);
    }

    #[test]
    fn snapshot_serializes() {
        let telemetry = Telemetry::new();
        telemetry.record("KYBER-512", Operation::Decrypt, Duration::from_micros(1500));
        let json = serde_json::to_string(&telemetry.snapshot()).unwrap();
        assert!(json.contains("\"decrypt\""));
        assert!(json.contains("KYBER-512"));
    }
}
