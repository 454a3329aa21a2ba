//! Lattice key-encapsulation scheme over the shared ring, in three module
//! ranks. Key generation, encapsulation, and decapsulation are exact: with
//! the shipped parameters the worst-case decryption noise stays strictly
//! below q/4, so a matching key pair can never disagree on the shared
//! secret.

use crate::conversion::{compress, decode_message, decompress, encode_message};
use crate::encodings::{kem_ct_decode, kem_ct_encode, kem_pk_decode, kem_pk_encode, kem_sk_decode, kem_sk_encode};
use crate::params::{KemParams, SHARED_SECRET_BYTES};
use crate::ring::{mat_vec_mul, mat_vec_mul_transposed, poly_add, poly_sub, vec_add, vec_dot};
use crate::sampling::{bounded_poly, bounded_vec, expand_matrix, h256};
use crate::types::PolyVec;
use rand_core::CryptoRngCore;
use zeroize::Zeroize;


/// Ciphertext and shared secret produced by [`Kem::try_encapsulate_with_rng`].
#[derive(Clone, Debug)]
pub struct Encapsulation {
    /// Packed ciphertext `(u, v)`.
    pub ciphertext: Vec<u8>,
    /// 32-byte shared secret.
    pub shared_secret: [u8; SHARED_SECRET_BYTES],
}


/// One KEM parameter-set instance.
#[derive(Clone, Copy, Debug)]
pub struct Kem {
    params: &'static KemParams,
}

impl Kem {
    /// Binds a scheme instance to a parameter set.
    #[must_use]
    pub const fn new(params: &'static KemParams) -> Self { Self { params } }

    /// The bound parameter set.
    #[must_use]
    pub const fn params(&self) -> &'static KemParams { self.params }

    /// Generates a packed `(public, private)` key pair:
    /// `t = A·s + e`, `pk = ρ ‖ pack(t)`, `sk = pack(s)`.
    ///
    /// # Errors
    /// Returns an error when the random number generator fails.
    pub fn try_keygen_with_rng(
        &self, rng: &mut impl CryptoRngCore,
    ) -> Result<(Vec<u8>, Vec<u8>), &'static str> {
        let mut rho = [0u8; 32];
        rng.try_fill_bytes(&mut rho).map_err(|_| "kem keygen: rng failed")?;
        let mut sigma = [0u8; 64];
        rng.try_fill_bytes(&mut sigma).map_err(|_| "kem keygen: rng failed")?;
        let pair = self.keygen_internal(&rho, &sigma);
        sigma.zeroize();
        Ok(pair)
    }

    /// Deterministic keygen from explicit seeds; `rho` drives the matrix,
    /// `sigma` the secret/noise sampling.
    #[must_use]
    pub(crate) fn keygen_internal(&self, rho: &[u8; 32], sigma: &[u8; 64]) -> (Vec<u8>, Vec<u8>) {
        let p = self.params;
        let a = expand_matrix(rho, p.k, p.k);
        #[allow(clippy::cast_possible_truncation)] // k <= 4
        let mut s: PolyVec = bounded_vec(p.eta, sigma, 0, p.k);
        let e: PolyVec = bounded_vec(p.eta, sigma, p.k as u16, p.k);

        let t = vec_add(&mat_vec_mul(&a, &s), &e);
        let pk = kem_pk_encode(p, rho, &t);
        let sk = kem_sk_encode(p, &s);
        s.zeroize();
        (pk, sk)
    }

    /// Encapsulates to a packed public key: samples a fresh 32-byte message,
    /// computes `u = Aᵀ·r + e1` and `v = t·r + e2 + encode(m)`, and derives
    /// the shared secret as a hash of `m`.
    ///
    /// # Errors
    /// Returns an error when the public key is malformed or the random
    /// number generator fails.
    pub fn try_encapsulate_with_rng(
        &self, rng: &mut impl CryptoRngCore, pk: &[u8],
    ) -> Result<Encapsulation, &'static str> {
        let p = self.params;
        let (rho, t) = kem_pk_decode(p, pk)?;

        let mut m = [0u8; 32];
        rng.try_fill_bytes(&mut m).map_err(|_| "kem encapsulate: rng failed")?;
        let mut sigma = [0u8; 64];
        rng.try_fill_bytes(&mut sigma).map_err(|_| "kem encapsulate: rng failed")?;

        let a = expand_matrix(&rho, p.k, p.k);
        #[allow(clippy::cast_possible_truncation)] // k <= 4
        let r: PolyVec = bounded_vec(p.eta, &sigma, 0, p.k);
        let e1: PolyVec = bounded_vec(p.eta, &sigma, p.k as u16, p.k);
        let e2 = bounded_poly(p.eta, &sigma, 2 * p.k as u16);
        sigma.zeroize();

        let u = vec_add(&mat_vec_mul_transposed(&a, &r), &e1);
        let v = poly_add(&poly_add(&vec_dot(&t, &r), &e2), &encode_message(&m));

        let u_compressed: PolyVec = u.iter().map(|p_u| compress(p_u, p.du)).collect();
        let v_compressed = compress(&v, p.dv);
        let ciphertext = kem_ct_encode(p, &u_compressed, &v_compressed);
        let shared_secret = h256(&[&m]);
        m.zeroize();

        Ok(Encapsulation { ciphertext, shared_secret })
    }

    /// Decapsulates a ciphertext with a packed private key: recovers
    /// `m' = decode(v − s·u)` and re-derives the shared secret.
    ///
    /// # Errors
    /// Returns an error when the private key or ciphertext is malformed.
    pub fn decapsulate(
        &self, sk: &[u8], ciphertext: &[u8],
    ) -> Result<[u8; SHARED_SECRET_BYTES], &'static str> {
        let p = self.params;
        let mut s = kem_sk_decode(p, sk)?;
        let (u_compressed, v_compressed) = kem_ct_decode(p, ciphertext)?;

        let u: PolyVec = u_compressed.iter().map(|p_u| decompress(p_u, p.du)).collect();
        let v = decompress(&v_compressed, p.dv);

        let m = decode_message(&poly_sub(&v, &vec_dot(&s, &u)));
        s.zeroize();
        Ok(h256(&[&m]))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{KYBER_1024, KYBER_512, KYBER_768};
    use rand_chacha::rand_core::SeedableRng;

    #[test]
    fn roundtrip_all_ranks() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(123);
        for params in [&KYBER_512, &KYBER_768, &KYBER_1024] {
            let kem = Kem::new(params);
            for _ in 0..8 {
                let (pk, sk) = kem.try_keygen_with_rng(&mut rng).unwrap();
                assert_eq!(pk.len(), params.public_key_len());
                assert_eq!(sk.len(), params.private_key_len());

                let enc = kem.try_encapsulate_with_rng(&mut rng, &pk).unwrap();
                assert_eq!(enc.ciphertext.len(), params.ciphertext_len());
                let ss = kem.decapsulate(&sk, &enc.ciphertext).unwrap();
                assert_eq!(ss, enc.shared_secret, "{}", params.name);
            }
        }
    }

    #[test]
    fn fresh_encapsulations_differ() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        let kem = Kem::new(&KYBER_768);
        let (pk, _sk) = kem.try_keygen_with_rng(&mut rng).unwrap();
        let a = kem.try_encapsulate_with_rng(&mut rng, &pk).unwrap();
        let b = kem.try_encapsulate_with_rng(&mut rng, &pk).unwrap();
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.shared_secret, b.shared_secret);
    }

    #[test]
    fn keygen_is_deterministic_from_seeds() {
        let kem = Kem::new(&KYBER_512);
        let (pk1, sk1) = kem.keygen_internal(&[1u8; 32], &[2u8; 64]);
        let (pk2, sk2) = kem.keygen_internal(&[1u8; 32], &[2u8; 64]);
        assert_eq!(pk1, pk2);
        assert_eq!(sk1, sk2);
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(9);
        let kem = Kem::new(&KYBER_768);
        let (pk, sk) = kem.try_keygen_with_rng(&mut rng).unwrap();
        assert!(kem.try_encapsulate_with_rng(&mut rng, &pk[..pk.len() - 1]).is_err());
        assert!(kem.decapsulate(&sk, &[0u8; 17]).is_err());
        assert!(kem.decapsulate(&sk[1..], &[0u8; 17]).is_err());
    }
}
