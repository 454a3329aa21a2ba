//! Closed parameter-set descriptors for the supported primitives: three KEM
//! ranks and three signature ranks. Packed sizes are derived from the
//! parameters so the catalog, the encoders, and the stored key material can
//! never disagree.

use crate::ring::bitlen;
use crate::Q;

/// Byte length of one full-width packed polynomial (23 bits per coefficient).
const FULL_POLY_BYTES: usize = 32 * 23;

/// Byte length of a packed seed.
pub(crate) const SEED_BYTES: usize = 32;

/// Byte length of a shared secret.
pub const SHARED_SECRET_BYTES: usize = 32;

/// Byte length of a packed challenge digest.
pub(crate) const CHALLENGE_BYTES: usize = 32;


/// Parameters for one KEM security level (module rank `k`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KemParams {
    /// Catalog name, e.g. `KYBER-768`.
    pub name: &'static str,
    /// Module rank: the matrix is `k × k`, vectors have length `k`.
    pub k: usize,
    /// Bound on small-coefficient sampling.
    pub eta: i32,
    /// Compression width for the `u` ciphertext component.
    pub du: u32,
    /// Compression width for the `v` ciphertext component.
    pub dv: u32,
    /// NIST-style security category 1..=5.
    pub security_level: u8,
}

impl KemParams {
    /// Packed public key length: seed plus `k` full-width polynomials.
    pub const fn public_key_len(&self) -> usize { SEED_BYTES + self.k * FULL_POLY_BYTES }

    /// Packed private key length: `k` eta-bounded polynomials.
    pub const fn private_key_len(&self) -> usize { self.k * 32 * bitlen(2 * self.eta as usize) }

    /// Packed ciphertext length: compressed `u` plus compressed `v`.
    pub const fn ciphertext_len(&self) -> usize {
        self.k * 32 * self.du as usize + 32 * self.dv as usize
    }
}


/// Parameters for one signature security level `(k, l, eta)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DsaParams {
    /// Catalog name, e.g. `DILITHIUM-3`.
    pub name: &'static str,
    /// Row rank of the expansion matrix.
    pub k: usize,
    /// Column rank of the expansion matrix.
    pub l: usize,
    /// Bound on secret-vector coefficients.
    pub eta: i32,
    /// Hamming weight of the challenge polynomial.
    pub tau: i32,
    /// Mask coefficient range.
    pub gamma1: i32,
    /// Low-order rounding range.
    pub gamma2: i32,
    /// Bit width of the `t1`/`t0` split. Held at `1 + log2(eta)` so the
    /// hint-free verification path is exact: `‖c·t0‖∞ ≤ τ·2^(d−1) ≤ β`.
    pub d: u32,
    /// NIST-style security category 1..=5.
    pub security_level: u8,
}

impl DsaParams {
    /// Rejection threshold `β = τ·η`.
    pub const fn beta(&self) -> i32 { self.tau * self.eta }

    /// Packed public key length: seed plus `k` polynomials of `23 − d` bits.
    pub const fn public_key_len(&self) -> usize {
        SEED_BYTES + self.k * 32 * (bitlen((Q - 1) as usize) - self.d as usize)
    }

    /// Packed private key length: seed, `s1`, `s2`, and `t0`.
    pub const fn private_key_len(&self) -> usize {
        SEED_BYTES
            + (self.k + self.l) * 32 * bitlen(2 * self.eta as usize)
            + self.k * 32 * self.d as usize
    }

    /// Packed signature length: challenge digest plus `l` mask-range
    /// polynomials.
    pub const fn signature_len(&self) -> usize {
        CHALLENGE_BYTES + self.l * 32 * (1 + bitlen((self.gamma1 - 1) as usize))
    }
}


/// KYBER-512: rank 2, security category 1.
pub const KYBER_512: KemParams =
    KemParams { name: "KYBER-512", k: 2, eta: 2, du: 13, dv: 4, security_level: 1 };

/// KYBER-768: rank 3, security category 3.
pub const KYBER_768: KemParams =
    KemParams { name: "KYBER-768", k: 3, eta: 2, du: 13, dv: 4, security_level: 3 };

/// KYBER-1024: rank 4, security category 5.
pub const KYBER_1024: KemParams =
    KemParams { name: "KYBER-1024", k: 4, eta: 2, du: 13, dv: 4, security_level: 5 };

/// DILITHIUM-2: `(k, l, η) = (4, 4, 2)`, security category 2.
pub const DILITHIUM_2: DsaParams = DsaParams {
    name: "DILITHIUM-2",
    k: 4,
    l: 4,
    eta: 2,
    tau: 39,
    gamma1: 1 << 17,
    gamma2: (Q - 1) / 88,
    d: 2,
    security_level: 2,
};

/// DILITHIUM-3: `(k, l, η) = (6, 5, 4)`, security category 3.
pub const DILITHIUM_3: DsaParams = DsaParams {
    name: "DILITHIUM-3",
    k: 6,
    l: 5,
    eta: 4,
    tau: 49,
    gamma1: 1 << 19,
    gamma2: (Q - 1) / 32,
    d: 3,
    security_level: 3,
};

/// DILITHIUM-5: `(k, l, η) = (8, 7, 2)`, security category 5.
pub const DILITHIUM_5: DsaParams = DsaParams {
    name: "DILITHIUM-5",
    k: 8,
    l: 7,
    eta: 2,
    tau: 60,
    gamma1: 1 << 19,
    gamma2: (Q - 1) / 32,
    d: 2,
    security_level: 5,
};


/// Closed dispatch variant over the two scheme families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeParams {
    /// Key-encapsulation parameter set.
    Kem(&'static KemParams),
    /// Digital-signature parameter set.
    Dsa(&'static DsaParams),
}

/// All supported parameter sets, in catalog order.
pub const ALL: [SchemeParams; 6] = [
    SchemeParams::Kem(&KYBER_512),
    SchemeParams::Kem(&KYBER_768),
    SchemeParams::Kem(&KYBER_1024),
    SchemeParams::Dsa(&DILITHIUM_2),
    SchemeParams::Dsa(&DILITHIUM_3),
    SchemeParams::Dsa(&DILITHIUM_5),
];

/// Resolves a catalog name to its parameter set.
pub fn lookup(name: &str) -> Option<SchemeParams> {
    ALL.into_iter().find(|p| match p {
        SchemeParams::Kem(k) => k.name == name,
        SchemeParams::Dsa(d) => d.name == name,
    })
}
