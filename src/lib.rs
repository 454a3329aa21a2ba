#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(
    elided_lifetimes_in_paths,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications
)]

//! Lattice-based post-quantum cryptographic engine: key encapsulation and
//! digital signatures over a shared polynomial ring, behind a managed façade
//! with a key registry, an algorithm catalog, performance telemetry, and a
//! lifecycle event stream.
//!
//! # Layout
//!
//! The scheme layer lives in [`kem`] and [`dsa`], built on internal ring
//! arithmetic (schoolbook negacyclic multiply), SHAKE-based expansion and
//! sampling, bit packing, and high/low decomposition. The management layer —
//! [`catalog`], [`registry`], [`telemetry`], [`events`] — is owned by one
//! explicit [`engine::Engine`] instance; there is no global state, so tests
//! can run as many isolated engines as they like.
//!
//! # Example
//!
//! ```rust
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use pqlattice::engine::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine.initialize();
//!
//! // KEM round trip
//! let pair = engine.generate_key_pair("KYBER-768", None)?;
//! let enc = engine.encapsulate(&pair.key_id, None)?;
//! let secret = engine.decapsulate(&pair.key_id, &enc.ciphertext)?;
//! assert_eq!(secret, enc.shared_secret);
//!
//! // signature round trip
//! let pair = engine.generate_key_pair("DILITHIUM-3", None)?;
//! let sig = engine.sign(&pair.key_id, b"hello")?;
//! assert!(engine.verify(&pair.key_id, b"hello", &sig.signature)?);
//! assert!(!engine.verify(&pair.key_id, b"goodbye", &sig.signature)?);
//! # Ok(())}
//! ```
//!
//! The arithmetic reproduces the algorithmic shape of the lattice KEM and
//! signature lifecycles (parameter families, packing, rejection sampling)
//! with exact correctness bounds; it does not claim NIST certification.
//! Hashing and expansion use SHA-3/SHAKE throughout. The schoolbook multiply
//! is the natural place to substitute an NTT when throughput matters.

/// The `rand_core` types are re-exported so that users of this crate do not
/// have to worry about using the exact correct version of `rand_core`.
pub use rand_core::{CryptoRng, Error as RngError, RngCore};

mod conversion;
mod encodings;
mod high_low;
mod ring;
mod sampling;
mod types;

pub mod catalog;
pub mod dsa;
pub mod error;
pub mod events;
pub mod kem;
pub mod params;
pub mod registry;
pub mod telemetry;

#[cfg(feature = "default-rng")]
pub mod engine;

// Applies across both schemes and all security parameter sets
pub(crate) const Q: i32 = 8_380_417; // 2^23 - 2^13 + 1
pub(crate) const QU: u32 = 8_380_417;
pub(crate) const N: usize = 256;
