//! Byte encodings of keys, ciphertexts, and signatures for both schemes.
//! Encoders are only fed trusted, in-range material; decoders validate
//! untrusted input and fail on malformed buffers.

use crate::conversion::{bit_pack, bit_unpack, simple_bit_pack, simple_bit_unpack};
use crate::params::{DsaParams, KemParams, CHALLENGE_BYTES, SEED_BYTES};
use crate::ring::{bitlen, ensure};
use crate::types::{Poly, PolyVec};
use crate::Q;


// ----- KEM encodings -----

/// `pk = ρ ‖ pack23(t)`.
pub(crate) fn kem_pk_encode(p: &KemParams, rho: &[u8; 32], t: &[Poly]) -> Vec<u8> {
    let step = 32 * bitlen((Q - 1) as usize);
    let mut pk = vec![0u8; p.public_key_len()];
    pk[0..SEED_BYTES].copy_from_slice(rho);
    for (i, poly) in t.iter().enumerate() {
        let start = SEED_BYTES + i * step;
        simple_bit_pack(poly, Q - 1, &mut pk[start..start + step]);
    }
    pk
}

/// Reverses `kem_pk_encode`.
///
/// # Errors
/// Fails on a wrong-length buffer or out-of-range coefficients.
pub(crate) fn kem_pk_decode(p: &KemParams, pk: &[u8]) -> Result<([u8; 32], PolyVec), &'static str> {
    ensure!(pk.len() == p.public_key_len(), "kem_pk_decode: bad length");
    let mut rho = [0u8; 32];
    rho.copy_from_slice(&pk[0..SEED_BYTES]);
    let step = 32 * bitlen((Q - 1) as usize);
    let mut t = Vec::with_capacity(p.k);
    for i in 0..p.k {
        let start = SEED_BYTES + i * step;
        t.push(simple_bit_unpack(&pk[start..start + step], Q - 1)?);
    }
    Ok((rho, t))
}

/// `sk = pack_eta(s)`; coefficients are centered in `[−η, η]`.
pub(crate) fn kem_sk_encode(p: &KemParams, s: &[Poly]) -> Vec<u8> {
    let step = 32 * bitlen(2 * p.eta as usize);
    let mut sk = vec![0u8; p.private_key_len()];
    for (i, poly) in s.iter().enumerate() {
        bit_pack(poly, p.eta, p.eta, &mut sk[i * step..(i + 1) * step]);
    }
    sk
}

/// Reverses `kem_sk_encode`.
///
/// # Errors
/// Fails on a wrong-length buffer or out-of-range coefficients.
pub(crate) fn kem_sk_decode(p: &KemParams, sk: &[u8]) -> Result<PolyVec, &'static str> {
    ensure!(sk.len() == p.private_key_len(), "kem_sk_decode: bad length");
    let step = 32 * bitlen(2 * p.eta as usize);
    let mut s = Vec::with_capacity(p.k);
    for i in 0..p.k {
        s.push(bit_unpack(&sk[i * step..(i + 1) * step], p.eta, p.eta)?);
    }
    Ok(s)
}

/// `ct = pack_du(compress(u)) ‖ pack_dv(compress(v))`; inputs are already
/// compressed to `[0, 2^d)`.
pub(crate) fn kem_ct_encode(p: &KemParams, u: &[Poly], v: &Poly) -> Vec<u8> {
    let step_u = 32 * p.du as usize;
    let step_v = 32 * p.dv as usize;
    let mut ct = vec![0u8; p.ciphertext_len()];
    for (i, poly) in u.iter().enumerate() {
        simple_bit_pack(poly, (1 << p.du) - 1, &mut ct[i * step_u..(i + 1) * step_u]);
    }
    let start = p.k * step_u;
    simple_bit_pack(v, (1 << p.dv) - 1, &mut ct[start..start + step_v]);
    ct
}

/// Reverses `kem_ct_encode`.
///
/// # Errors
/// Fails on a wrong-length buffer.
pub(crate) fn kem_ct_decode(p: &KemParams, ct: &[u8]) -> Result<(PolyVec, Poly), &'static str> {
    ensure!(ct.len() == p.ciphertext_len(), "kem_ct_decode: bad length");
    let step_u = 32 * p.du as usize;
    let step_v = 32 * p.dv as usize;
    let mut u = Vec::with_capacity(p.k);
    for i in 0..p.k {
        u.push(simple_bit_unpack(&ct[i * step_u..(i + 1) * step_u], (1 << p.du) - 1)?);
    }
    let start = p.k * step_u;
    let v = simple_bit_unpack(&ct[start..start + step_v], (1 << p.dv) - 1)?;
    Ok((u, v))
}


// ----- Signature encodings -----

/// `pk = ζ ‖ pack(t1)` with `t1` coefficients in `[0, 2^(23−d))`.
pub(crate) fn dsa_pk_encode(p: &DsaParams, zeta: &[u8; 32], t1: &[Poly]) -> Vec<u8> {
    let blqd = bitlen((Q - 1) as usize) - p.d as usize;
    let step = 32 * blqd;
    let mut pk = vec![0u8; p.public_key_len()];
    pk[0..SEED_BYTES].copy_from_slice(zeta);
    for (i, poly) in t1.iter().enumerate() {
        let start = SEED_BYTES + i * step;
        simple_bit_pack(poly, (1 << blqd) - 1, &mut pk[start..start + step]);
    }
    pk
}

/// Reverses `dsa_pk_encode`.
///
/// # Errors
/// Fails on a wrong-length buffer or out-of-range coefficients.
pub(crate) fn dsa_pk_decode(p: &DsaParams, pk: &[u8]) -> Result<([u8; 32], PolyVec), &'static str> {
    ensure!(pk.len() == p.public_key_len(), "dsa_pk_decode: bad length");
    let mut zeta = [0u8; 32];
    zeta.copy_from_slice(&pk[0..SEED_BYTES]);
    let blqd = bitlen((Q - 1) as usize) - p.d as usize;
    let step = 32 * blqd;
    let mut t1 = Vec::with_capacity(p.k);
    for i in 0..p.k {
        let start = SEED_BYTES + i * step;
        t1.push(simple_bit_unpack(&pk[start..start + step], (1 << blqd) - 1)?);
    }
    Ok((zeta, t1))
}

/// `sk = ζ ‖ pack_eta(s1) ‖ pack_eta(s2) ‖ pack_d(t0)`.
pub(crate) fn dsa_sk_encode(
    p: &DsaParams, zeta: &[u8; 32], s1: &[Poly], s2: &[Poly], t0: &[Poly],
) -> Vec<u8> {
    let top = 1 << (p.d - 1);
    let mut sk = vec![0u8; p.private_key_len()];
    sk[0..SEED_BYTES].copy_from_slice(zeta);

    let mut start = SEED_BYTES;
    let step = 32 * bitlen(2 * p.eta as usize);
    for poly in s1.iter().chain(s2.iter()) {
        bit_pack(poly, p.eta, p.eta, &mut sk[start..start + step]);
        start += step;
    }

    let step = 32 * p.d as usize;
    for poly in t0 {
        bit_pack(poly, top - 1, top, &mut sk[start..start + step]);
        start += step;
    }
    debug_assert_eq!(start, sk.len(), "dsa_sk_encode: length miscalculation");
    sk
}

/// Reverses `dsa_sk_encode`.
///
/// # Errors
/// Fails on a wrong-length buffer or out-of-range coefficients.
#[allow(clippy::type_complexity)]
pub(crate) fn dsa_sk_decode(
    p: &DsaParams, sk: &[u8],
) -> Result<([u8; 32], PolyVec, PolyVec, PolyVec), &'static str> {
    ensure!(sk.len() == p.private_key_len(), "dsa_sk_decode: bad length");
    let top = 1 << (p.d - 1);
    let mut zeta = [0u8; 32];
    zeta.copy_from_slice(&sk[0..SEED_BYTES]);

    let mut start = SEED_BYTES;
    let step = 32 * bitlen(2 * p.eta as usize);
    let mut s1 = Vec::with_capacity(p.l);
    for _ in 0..p.l {
        s1.push(bit_unpack(&sk[start..start + step], p.eta, p.eta)?);
        start += step;
    }
    let mut s2 = Vec::with_capacity(p.k);
    for _ in 0..p.k {
        s2.push(bit_unpack(&sk[start..start + step], p.eta, p.eta)?);
        start += step;
    }

    let step = 32 * p.d as usize;
    let mut t0 = Vec::with_capacity(p.k);
    for _ in 0..p.k {
        t0.push(bit_unpack(&sk[start..start + step], top - 1, top)?);
        start += step;
    }
    Ok((zeta, s1, s2, t0))
}

/// `sig = c̃ ‖ pack(z)` with `z` coefficients centered in `[−γ1+1, γ1]`.
pub(crate) fn dsa_sig_encode(p: &DsaParams, c_tilde: &[u8; 32], z: &[Poly]) -> Vec<u8> {
    let step = 32 * (1 + bitlen((p.gamma1 - 1) as usize));
    let mut sig = vec![0u8; p.signature_len()];
    sig[0..CHALLENGE_BYTES].copy_from_slice(c_tilde);
    for (i, poly) in z.iter().enumerate() {
        let start = CHALLENGE_BYTES + i * step;
        bit_pack(poly, p.gamma1 - 1, p.gamma1, &mut sig[start..start + step]);
    }
    sig
}

/// Reverses `dsa_sig_encode`. The caller treats any error as a verification
/// failure, never a fault.
///
/// # Errors
/// Fails on a wrong-length buffer or out-of-range coefficients.
pub(crate) fn dsa_sig_decode(
    p: &DsaParams, sig: &[u8],
) -> Result<([u8; 32], PolyVec), &'static str> {
    ensure!(sig.len() == p.signature_len(), "dsa_sig_decode: bad length");
    let mut c_tilde = [0u8; 32];
    c_tilde.copy_from_slice(&sig[0..CHALLENGE_BYTES]);
    let step = 32 * (1 + bitlen((p.gamma1 - 1) as usize));
    let mut z = Vec::with_capacity(p.l);
    for i in 0..p.l {
        let start = CHALLENGE_BYTES + i * step;
        z.push(bit_unpack(&sig[start..start + step], p.gamma1 - 1, p.gamma1)?);
    }
    Ok((c_tilde, z))
}

/// Packs the high-bits commitment `w1` for challenge hashing; values are in
/// `[0, (q−1)/(2γ2) − 1]`.
pub(crate) fn w1_encode(p: &DsaParams, w1: &[Poly]) -> Vec<u8> {
    let top = (Q - 1) / (2 * p.gamma2) - 1;
    let step = 32 * bitlen(top as usize);
    let mut out = vec![0u8; p.k * step];
    for (i, poly) in w1.iter().enumerate() {
        simple_bit_pack(poly, top, &mut out[i * step..(i + 1) * step]);
    }
    out
}
