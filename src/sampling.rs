//! Hashing and pseudorandom sampling: SHAKE-based XOF expansion of matrices,
//! bounded small-coefficient sampling, signing-mask expansion, and the
//! sparse ±1 challenge derivation.

use crate::conversion::{bit_unpack, coeff_from_half_byte, coeff_from_three_bytes};
use crate::ring::{bitlen, is_in_range};
use crate::types::{Poly, PolyMat, PolyVec};
use crate::N;
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Shake128, Shake256};


/// Runs a list of byte-slice references through Shake256 and returns a
/// reader for extracting extendable output.
pub(crate) fn h_xof(v: &[&[u8]]) -> impl XofReader {
    let mut hasher = Shake256::default();
    v.iter().for_each(|b| hasher.update(b));
    hasher.finalize_xof()
}


/// Runs a list of byte-slice references through Shake128 and returns a
/// reader for extracting extendable output.
pub(crate) fn h128_xof(v: &[&[u8]]) -> impl XofReader {
    let mut hasher = Shake128::default();
    v.iter().for_each(|b| hasher.update(b));
    hasher.finalize_xof()
}


/// Fixed-length Shake256 digest, used for shared secrets and key ids.
pub(crate) fn h256<const OUT: usize>(v: &[&[u8]]) -> [u8; OUT] {
    let mut out = [0u8; OUT];
    h_xof(v).read(&mut out);
    out
}


/// Samples a uniform polynomial with coefficients in `[0, q)` by rejection
/// from three-byte XOF draws.
fn uniform_poly(xof: &mut impl XofReader) -> Poly {
    let mut a = Poly::zero();
    let mut j = 0;
    while j < N {
        let mut bytes = [0u8; 3];
        xof.read(&mut bytes);
        if let Ok(coeff) = coeff_from_three_bytes(bytes) {
            a.0[j] = coeff;
            j += 1;
        }
    }
    a
}


/// Deterministic matrix expansion: entry `(r, c)` is drawn from
/// `Shake128(seed ‖ c ‖ r)`, so an identical seed and shape always yield an
/// identical matrix.
#[allow(clippy::cast_possible_truncation)] // r and c are < 256
pub(crate) fn expand_matrix(seed: &[u8; 32], rows: usize, cols: usize) -> PolyMat {
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    let mut xof = h128_xof(&[seed, &[c as u8], &[r as u8]]);
                    uniform_poly(&mut xof)
                })
                .collect()
        })
        .collect()
}


/// Samples a polynomial with coefficients in `[−η, η]` via half-byte
/// rejection draws from `Shake256(seed ‖ nonce)`.
pub(crate) fn bounded_poly(eta: i32, seed: &[u8], nonce: u16) -> Poly {
    let mut a = Poly::zero();
    let mut xof = h_xof(&[seed, &nonce.to_le_bytes()]);
    let mut z = [0u8];
    let mut j = 0;
    while j < N {
        xof.read(&mut z);
        let z0 = coeff_from_half_byte(eta, z[0] & 0x0f);
        let z1 = coeff_from_half_byte(eta, z[0] >> 4);
        if let Ok(z0) = z0 {
            a.0[j] = z0;
            j += 1;
        }
        if let Ok(z1) = z1 {
            if j < N {
                a.0[j] = z1;
                j += 1;
            }
        }
    }
    debug_assert!(is_in_range(&a, eta, eta), "bounded_poly: coefficient out of range");
    a
}


/// Samples `count` small polynomials with consecutive nonces starting at
/// `base`; used for secret and error vectors.
#[allow(clippy::cast_possible_truncation)] // count is a module rank
pub(crate) fn bounded_vec(eta: i32, seed: &[u8], base: u16, count: usize) -> PolyVec {
    (0..count).map(|i| bounded_poly(eta, seed, base + i as u16)).collect()
}


/// Samples the signing mask vector `y` with coefficients in `[−γ1+1, γ1]`
/// from `Shake256(seed ‖ κ+r)`.
#[allow(clippy::cast_possible_truncation)] // l is a module rank
pub(crate) fn expand_mask(gamma1: i32, seed: &[u8; 64], kappa: u16, l: usize) -> PolyVec {
    let c = 1 + bitlen((gamma1 - 1) as usize); // γ1 is always a power of 2
    let mut v = vec![0u8; 32 * c];
    (0..l as u16)
        .map(|r| {
            let n = kappa + r;
            let mut xof = h_xof(&[seed, &n.to_le_bytes()]);
            xof.read(&mut v);
            bit_unpack(&v, gamma1 - 1, gamma1).expect("cannot fail")
        })
        .collect()
}


/// Samples the challenge polynomial: exactly `τ` nonzero ±1 coefficients,
/// positions and signs drawn from `Shake256(ρ)` via Fisher-Yates.
pub(crate) fn sample_in_ball(tau: i32, rho: &[u8]) -> Poly {
    let tau = usize::try_from(tau).expect("cannot fail");
    let mut c = Poly::zero();
    let mut xof = h_xof(&[rho]);

    let mut signs = [0u8; 8];
    xof.read(&mut signs);

    for i in (N - tau)..N {
        let mut j = [0u8];
        xof.read(&mut j);
        while usize::from(j[0]) > i {
            xof.read(&mut j);
        }
        let j = usize::from(j[0]);
        c.0[i] = c.0[j];
        let index = i + tau - N;
        let bit = (signs[index / 8] >> (index & 0x07)) & 0x01;
        c.0[j] = 1 - 2 * i32::from(bit);
    }

    debug_assert!(
        c.0.iter().filter(|&&e| e != 0).count() == tau,
        "sample_in_ball: bad hamming weight"
    );
    c
}
