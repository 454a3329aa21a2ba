//! Static descriptors of the supported primitives. The catalog is built once
//! at engine construction and never changes; repeated lookups return
//! byte-identical descriptors.

use crate::params::{DsaParams, KemParams, SchemeParams, ALL, SHARED_SECRET_BYTES};
use serde::{Deserialize, Serialize};


/// Primitive family of a catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgorithmKind {
    /// Key-encapsulation mechanism.
    Kem,
    /// Digital signature.
    Signature,
}

/// Declared byte counts for the packed artifacts of one algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySizes {
    /// Packed public key length.
    pub public_key: usize,
    /// Packed private key length.
    pub private_key: usize,
    /// Packed ciphertext length (KEM only).
    pub ciphertext: Option<usize>,
    /// Packed signature length (signature only).
    pub signature: Option<usize>,
    /// Shared secret length (KEM only).
    pub shared_secret: Option<usize>,
}

/// Informational performance figures; never used for dispatch decisions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NominalPerformance {
    /// Typical key-generation latency in milliseconds.
    pub keygen_ms: f64,
    /// Typical per-operation latency (encapsulate/sign) in milliseconds.
    pub operation_ms: f64,
}

/// Immutable description of one supported primitive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmDescriptor {
    /// Catalog name, e.g. `KYBER-768`.
    pub name: String,
    /// Primitive family.
    pub kind: AlgorithmKind,
    /// NIST-style security category 1..=5.
    pub security_level: u8,
    /// Declared packed sizes, enforced against stored key material.
    pub key_sizes: KeySizes,
    /// Informational performance figures.
    pub nominal_performance: NominalPerformance,
}

impl AlgorithmDescriptor {
    fn from_kem(p: &KemParams) -> Self {
        Self {
            name: p.name.to_owned(),
            kind: AlgorithmKind::Kem,
            security_level: p.security_level,
            key_sizes: KeySizes {
                public_key: p.public_key_len(),
                private_key: p.private_key_len(),
                ciphertext: Some(p.ciphertext_len()),
                signature: None,
                shared_secret: Some(SHARED_SECRET_BYTES),
            },
            nominal_performance: NominalPerformance {
                keygen_ms: 0.5 * p.k as f64,
                operation_ms: 0.6 * p.k as f64,
            },
        }
    }

    fn from_dsa(p: &DsaParams) -> Self {
        Self {
            name: p.name.to_owned(),
            kind: AlgorithmKind::Signature,
            security_level: p.security_level,
            key_sizes: KeySizes {
                public_key: p.public_key_len(),
                private_key: p.private_key_len(),
                ciphertext: None,
                signature: Some(p.signature_len()),
                shared_secret: None,
            },
            nominal_performance: NominalPerformance {
                keygen_ms: 0.8 * p.k as f64,
                operation_ms: 2.5 * p.k as f64,
            },
        }
    }

    /// Declared byte length for one key role.
    #[must_use]
    pub fn key_len(&self, role: crate::registry::KeyRole) -> usize {
        match role {
            crate::registry::KeyRole::Public => self.key_sizes.public_key,
            crate::registry::KeyRole::Private => self.key_sizes.private_key,
        }
    }
}


/// Engine-construction-time table of all supported algorithms.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<AlgorithmDescriptor>,
}

impl Catalog {
    /// Builds the fixed six-entry catalog from the parameter sets.
    #[must_use]
    pub fn new() -> Self {
        let entries = ALL
            .into_iter()
            .map(|p| match p {
                SchemeParams::Kem(k) => AlgorithmDescriptor::from_kem(k),
                SchemeParams::Dsa(d) => AlgorithmDescriptor::from_dsa(d),
            })
            .collect();
        Self { entries }
    }

    /// All descriptors, in declaration order.
    #[must_use]
    pub fn list(&self) -> Vec<AlgorithmDescriptor> { self.entries.clone() }

    /// Looks up one descriptor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AlgorithmDescriptor> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of supported algorithms.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the catalog is empty (it never is for a built engine).
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl Default for Catalog {
    fn default() -> Self { Self::new() }
}
