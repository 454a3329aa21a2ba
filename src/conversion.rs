//! Conversion between polynomial and byte/bit representations: fixed-width
//! bit packing, lossy d-bit compression, message encoding, and the
//! coefficient-rejection leaves used by the samplers.

use crate::ring::{bitlen, ensure, is_in_range};
use crate::types::Poly;
use crate::{N, Q};


/// Generates an element of `{0, 1, ..., q − 1} ∪ ⊥` from three XOF bytes;
/// used in uniform rejection sampling of matrix coefficients.
///
/// # Errors
/// Returns `⊥` (an error) when the three bytes form a value at or above q;
/// the caller draws again.
pub(crate) fn coeff_from_three_bytes(bbb: [u8; 3]) -> Result<i32, &'static str> {
    let z = (i32::from(bbb[2] & 0x7F) << 16) | (i32::from(bbb[1]) << 8) | i32::from(bbb[0]);
    if z < Q {
        Ok(z)
    } else {
        Err("coeff_from_three_bytes: rejected")
    }
}


/// Generates an element of `{−η, ..., η} ∪ ⊥` from a half byte; used in
/// bounded rejection sampling of small polynomials. `η` must be 2 or 4.
///
/// # Errors
/// Returns `⊥` (an error) on a draw outside the acceptance window; the
/// caller draws again.
pub(crate) fn coeff_from_half_byte(eta: i32, b: u8) -> Result<i32, &'static str> {
    debug_assert!((eta == 2) | (eta == 4), "coeff_from_half_byte: incorrect eta");
    debug_assert!(b < 16, "coeff_from_half_byte: b out of range");

    if (eta == 2) & (b < 15) {
        Ok(2 - i32::from(b % 5))
    } else if (eta == 4) & (b < 9) {
        Ok(4 - i32::from(b))
    } else {
        Err("coeff_from_half_byte: rejected")
    }
}


/// Encodes a polynomial with coefficients in `[0, b]` into `32·bitlen(b)`
/// bytes. Not exposed to unvalidated input.
pub(crate) fn simple_bit_pack(w: &Poly, b: i32, bytes_out: &mut [u8]) {
    debug_assert!((1..1 << 23).contains(&b), "simple_bit_pack: b out of range");
    debug_assert!(is_in_range(w, 0, b), "simple_bit_pack: w out of range");
    bit_pack(w, 0, b, bytes_out);
}


/// Encodes a polynomial with coefficients in `[−a, b]` into
/// `32·bitlen(a + b)` bytes. Not exposed to unvalidated input.
pub(crate) fn bit_pack(w: &Poly, a: i32, b: i32, bytes_out: &mut [u8]) {
    debug_assert!((0..1 << 23).contains(&a), "bit_pack: a out of range");
    debug_assert!((1..1 << 23).contains(&b), "bit_pack: b out of range");
    debug_assert!(is_in_range(w, a, b), "bit_pack: w out of range");
    debug_assert_eq!(N * bitlen((a + b) as usize), bytes_out.len() * 8, "bit_pack: bad output size");

    let bits = bitlen((a + b) as usize);
    let mut temp = 0u64; // new values enter on the left/MSB, bytes pop from the right/LSB
    let mut byte_index = 0;
    let mut bit_index = 0;

    #[allow(clippy::cast_sign_loss)] // coefficients are known in-range
    for coeff in &w.0 {
        // a signed range stores the offset from b; an unsigned range stores the value
        if a > 0 {
            temp |= ((b - coeff) as u64) << bit_index;
        } else {
            temp |= (*coeff as u64) << bit_index;
        }
        bit_index += bits;
        while bit_index > 7 {
            bytes_out[byte_index] = temp.to_le_bytes()[0];
            temp >>= 8;
            byte_index += 1;
            bit_index -= 8;
        }
    }
}


/// Reverses `simple_bit_pack`. Takes untrusted input via key/ciphertext
/// deserialization.
///
/// # Errors
/// Returns an error on byte strings whose decoded coefficients fall outside
/// `[0, b]`.
pub(crate) fn simple_bit_unpack(v: &[u8], b: i32) -> Result<Poly, &'static str> {
    bit_unpack(v, 0, b).map_err(|_| "simple_bit_unpack: coefficient out of range")
}


/// Reverses `bit_pack`. Takes untrusted input via key/signature
/// deserialization.
///
/// # Errors
/// Returns an error on byte strings whose decoded coefficients fall outside
/// the expected range.
pub(crate) fn bit_unpack(v: &[u8], a: i32, b: i32) -> Result<Poly, &'static str> {
    debug_assert!((0..1 << 23).contains(&a), "bit_unpack: a out of range");
    debug_assert!((1..1 << 23).contains(&b), "bit_unpack: b out of range");
    ensure!(v.len() * 8 == N * bitlen((a + b) as usize), "bit_unpack: bad input size");

    let bits = bitlen((a + b) as usize) as u32;
    let mut w_out = Poly::zero();
    let mut temp = 0i64;
    let mut r_index = 0;
    let mut bit_index = 0;

    for byte in v {
        temp |= i64::from(*byte) << bit_index;
        bit_index += 8;
        while (bit_index >= bits) && (r_index < N) {
            #[allow(clippy::cast_possible_truncation)] // masked below bit 23
            let tmask = (temp & ((1 << bits) - 1)) as i32;
            w_out.0[r_index] = if a == 0 { tmask } else { b - tmask };
            bit_index -= bits;
            temp >>= bits;
            r_index += 1;
        }
    }

    let bot = i32::abs(b - (1 << bits) + 1);
    ensure!(is_in_range(&w_out, bot, b), "bit_unpack: coefficient out of range");
    Ok(w_out)
}


/// Lossy d-bit reduction: `round(2^d/q · x) mod 2^d` per coefficient.
/// Input must be canonical; output coefficients are in `[0, 2^d)`.
#[allow(clippy::cast_possible_truncation)] // masked below 2^d
pub(crate) fn compress(w: &Poly, d: u32) -> Poly {
    debug_assert!(d < 23, "compress: d out of range");
    Poly(core::array::from_fn(|n| {
        let x = i64::from(w.0[n]);
        ((((x << d) + i64::from(Q) / 2) / i64::from(Q)) & ((1 << d) - 1)) as i32
    }))
}


/// Reverses `compress`: `round(q/2^d · y)` per coefficient. The round trip
/// `decompress(compress(x))` differs from `x` by at most `round(q/2^(d+1))`.
#[allow(clippy::cast_possible_truncation)] // result < q
pub(crate) fn decompress(w: &Poly, d: u32) -> Poly {
    debug_assert!(d < 23, "decompress: d out of range");
    Poly(core::array::from_fn(|n| {
        ((i64::from(w.0[n]) * i64::from(Q) + (1 << (d - 1))) >> d) as i32
    }))
}


/// Spread a 32-byte message across the polynomial, one bit per coefficient
/// scaled to `⌈q/2⌉`.
pub(crate) fn encode_message(m: &[u8; 32]) -> Poly {
    Poly(core::array::from_fn(|n| {
        let bit = (m[n / 8] >> (n & 0x07)) & 1;
        i32::from(bit) * ((Q + 1) / 2)
    }))
}

/// Recover the message bits: a coefficient closer to `q/2` than to 0 decodes
/// to 1.
pub(crate) fn decode_message(w: &Poly) -> [u8; 32] {
    let mut m = [0u8; 32];
    for (n, &coeff) in w.0.iter().enumerate() {
        if (coeff > Q / 4) && (coeff < 3 * (Q / 4)) {
            m[n / 8] |= 1 << (n & 0x07);
        }
    }
    m
}
