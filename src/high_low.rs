//! High-order / low-order bit decomposition used to compress public keys and
//! to derive signing commitments.

use crate::ring::{mod_pm, reduce64};
use crate::types::{Poly, PolyVec};
use crate::{Q, QU};


/// Decomposes `r` into `(r1, r0)` such that `r ≡ r1·2^d + r0 mod q`, with
/// `r0 ∈ (−2^(d−1), 2^(d−1)]`.
pub(crate) fn power2round(d: u32, r: i32) -> (i32, i32) {
    let rp = reduce64(r.into());
    let r0 = mod_pm(rp, 1 << d);
    ((rp - r0) >> d, r0)
}


/// Decomposes `r` into `(r1, r0)` such that `r ≡ r1·(2γ2) + r0 mod q`, with
/// the `q − 1` wrap folded into `r1 = 0`.
pub(crate) fn decompose(gamma2: i32, r: i32) -> (i32, i32) {
    let rp = r.rem_euclid(Q);
    let mut r0 = mod_pm(rp, 2 * gamma2 as u32);
    if (rp - r0) == (QU as i32 - 1) {
        r0 -= 1;
        (0, r0)
    } else {
        ((rp - r0) / (2 * gamma2), r0)
    }
}


/// Returns `r1` from `decompose(r)`.
pub(crate) fn high_bits(gamma2: i32, r: i32) -> i32 {
    let (r1, _r0) = decompose(gamma2, r);
    r1
}


/// Returns `r0` from `decompose(r)`.
pub(crate) fn low_bits(gamma2: i32, r: i32) -> i32 {
    let (_r1, r0) = decompose(gamma2, r);
    r0
}


/// Vector-level `power2round`: returns `(t1, t0)`.
pub(crate) fn power2round_vec(d: u32, t: &[Poly]) -> (PolyVec, PolyVec) {
    let mut t1 = Vec::with_capacity(t.len());
    let mut t0 = Vec::with_capacity(t.len());
    for poly in t {
        let mut hi = Poly::zero();
        let mut lo = Poly::zero();
        for n in 0..poly.0.len() {
            let (h, l) = power2round(d, poly.0[n]);
            hi.0[n] = h;
            lo.0[n] = l;
        }
        t1.push(hi);
        t0.push(lo);
    }
    (t1, t0)
}


/// Vector-level `high_bits`.
pub(crate) fn high_bits_vec(gamma2: i32, v: &[Poly]) -> PolyVec {
    v.iter()
        .map(|p| Poly(core::array::from_fn(|n| high_bits(gamma2, p.0[n]))))
        .collect()
}


/// Vector-level `low_bits`.
pub(crate) fn low_bits_vec(gamma2: i32, v: &[Poly]) -> PolyVec {
    v.iter()
        .map(|p| Poly(core::array::from_fn(|n| low_bits(gamma2, p.0[n]))))
        .collect()
}
