//! Lattice signature scheme over the shared ring, in three parameter sets.
//! Signing runs a bounded, cancellable rejection-sampling loop; verification
//! is exception-free and exact for every signature the signer accepts.

use crate::encodings::{
    dsa_pk_decode, dsa_pk_encode, dsa_sig_decode, dsa_sig_encode, dsa_sk_decode, dsa_sk_encode,
    w1_encode,
};
use crate::high_low::{high_bits_vec, low_bits_vec, power2round_vec};
use crate::params::DsaParams;
use crate::ring::{infinity_norm, mat_vec_mul, scalar_vec_mul, shl_vec, vec_add, vec_sub};
use crate::sampling::{bounded_vec, expand_mask, expand_matrix, h_xof, sample_in_ball};
use crate::types::{PolyMat, PolyVec};
use rand_core::CryptoRngCore;
use sha3::digest::XofReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use zeroize::Zeroize;


/// Cooperative cancellation flag for the signing loop, checked once per
/// rejection attempt. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an unset token.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Requests cancellation; the in-flight signing call aborts at its next
    /// attempt boundary.
    pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed); }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}


/// Signing failure, distinguished so the engine can map each case to its
/// own typed error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignError {
    /// The rejection-sampling cap was reached without an acceptable
    /// candidate.
    Exhausted {
        /// Number of attempts consumed.
        attempts: u32,
    },
    /// The caller's [`CancelToken`] fired.
    Cancelled,
    /// The private key failed to decode.
    Malformed(&'static str),
    /// The random number generator failed.
    Rng,
}


/// One signature parameter-set instance.
#[derive(Clone, Copy, Debug)]
pub struct Dsa {
    params: &'static DsaParams,
}

impl Dsa {
    /// Binds a scheme instance to a parameter set.
    #[must_use]
    pub const fn new(params: &'static DsaParams) -> Self { Self { params } }

    /// The bound parameter set.
    #[must_use]
    pub const fn params(&self) -> &'static DsaParams { self.params }

    /// Generates a packed `(public, private)` key pair from a fresh seed:
    /// `t = A·s1 + s2`, split by `power2round` into the published `t1` and
    /// the retained `t0`.
    ///
    /// # Errors
    /// Returns an error when the random number generator fails.
    pub fn try_keygen_with_rng(
        &self, rng: &mut impl CryptoRngCore,
    ) -> Result<(Vec<u8>, Vec<u8>), &'static str> {
        let mut zeta = [0u8; 32];
        rng.try_fill_bytes(&mut zeta).map_err(|_| "dsa keygen: rng failed")?;
        Ok(self.keygen_from_seed(&zeta))
    }

    /// Deterministic keygen from the 32-byte seed `ζ`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // k and l are module ranks
    pub fn keygen_from_seed(&self, zeta: &[u8; 32]) -> (Vec<u8>, Vec<u8>) {
        let p = self.params;
        let (rho, mut rho_prime) = derive_seeds(zeta, p);

        let a = expand_matrix(&rho, p.k, p.l);
        let mut s1: PolyVec = bounded_vec(p.eta, &rho_prime, 0, p.l);
        let mut s2: PolyVec = bounded_vec(p.eta, &rho_prime, p.l as u16, p.k);
        rho_prime.zeroize();

        let t = vec_add(&mat_vec_mul(&a, &s1), &s2);
        let (t1, mut t0) = power2round_vec(p.d, &t);

        let pk = dsa_pk_encode(p, zeta, &t1);
        let sk = dsa_sk_encode(p, zeta, &s1, &s2, &t0);
        s1.zeroize();
        s2.zeroize();
        t0.zeroize();
        (pk, sk)
    }

    /// Signs a message with a bounded rejection-sampling loop.
    ///
    /// Each attempt draws a mask `y`, commits to `w1 = high_bits(A·y)`,
    /// derives the challenge, and accepts only when `z = y + c·s1`, the
    /// low-order residue `r0`, and `c·t0` all satisfy their norm bounds.
    /// The caps make signing a boundable unit of work: `max_attempts` is a
    /// hard limit and `cancel` aborts between attempts.
    ///
    /// # Errors
    /// [`SignError::Exhausted`] at the cap, [`SignError::Cancelled`] on
    /// token fire, [`SignError::Malformed`] for an undecodable key,
    /// [`SignError::Rng`] on generator failure.
    #[allow(clippy::cast_possible_truncation)] // l is a module rank
    pub fn try_sign_with_rng(
        &self, rng: &mut impl CryptoRngCore, sk: &[u8], message: &[u8], max_attempts: u32,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<u8>, SignError> {
        let p = self.params;
        let (zeta, mut s1, mut s2, mut t0) = dsa_sk_decode(p, sk).map_err(SignError::Malformed)?;
        let (rho, _) = derive_seeds(&zeta, p);
        let a = expand_matrix(&rho, p.k, p.l);

        let mu = message_digest(message);

        let mut rnd = [0u8; 32];
        if rng.try_fill_bytes(&mut rnd).is_err() {
            return Err(SignError::Rng);
        }
        let mut mask_seed = [0u8; 64];
        h_xof(&[&zeta, &rnd, &mu]).read(&mut mask_seed);

        let beta = p.beta();
        let mut kappa = 0u16;
        let result = 'attempts: {
            for _attempt in 0..max_attempts {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    break 'attempts Err(SignError::Cancelled);
                }

                let y = expand_mask(p.gamma1, &mask_seed, kappa, p.l);
                kappa = kappa.wrapping_add(p.l as u16);

                let w = mat_vec_mul(&a, &y);
                let w1 = high_bits_vec(p.gamma2, &w);

                let mut c_tilde = [0u8; 32];
                h_xof(&[&mu, &w1_encode(p, &w1)]).read(&mut c_tilde);
                let c = sample_in_ball(p.tau, &c_tilde);

                let z = vec_add(&y, &scalar_vec_mul(&c, &s1));
                if infinity_norm(&z) >= p.gamma1 - beta {
                    continue;
                }

                let r0 = low_bits_vec(p.gamma2, &vec_sub(&w, &scalar_vec_mul(&c, &s2)));
                if infinity_norm(&r0) >= p.gamma2 - beta {
                    continue;
                }

                let c_t0 = scalar_vec_mul(&c, &t0);
                if infinity_norm(&c_t0) >= p.gamma2 {
                    continue;
                }

                // center z for packing; coefficients are within gamma1 - beta
                let z: PolyVec = z
                    .iter()
                    .map(|poly| {
                        crate::types::Poly(core::array::from_fn(|n| {
                            crate::ring::center_mod(poly.0[n])
                        }))
                    })
                    .collect();
                break 'attempts Ok(dsa_sig_encode(p, &c_tilde, &z));
            }
            Err(SignError::Exhausted { attempts: max_attempts })
        };

        mask_seed.zeroize();
        s1.zeroize();
        s2.zeroize();
        t0.zeroize();
        result
    }

    /// Verifies a signature. Structural failures (wrong length, out-of-range
    /// coefficients, oversized `z`) return `false`; this function never
    /// errors.
    #[must_use]
    pub fn verify(&self, pk: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let p = self.params;
        let Ok((zeta, t1)) = dsa_pk_decode(p, pk) else {
            return false;
        };
        let Ok((c_tilde, z)) = dsa_sig_decode(p, signature) else {
            return false;
        };
        if infinity_norm(&z) >= p.gamma1 - p.beta() {
            return false;
        }

        let (rho, _) = derive_seeds(&zeta, p);
        let a: PolyMat = expand_matrix(&rho, p.k, p.l);
        let mu = message_digest(message);
        let c = sample_in_ball(p.tau, &c_tilde);

        // w' = A·z − c·t1·2^d; its high bits must reproduce the commitment
        let w_approx = vec_sub(&mat_vec_mul(&a, &z), &scalar_vec_mul(&c, &shl_vec(&t1, p.d)));
        let w1 = high_bits_vec(p.gamma2, &w_approx);

        let mut c_tilde_prime = [0u8; 32];
        h_xof(&[&mu, &w1_encode(p, &w1)]).read(&mut c_tilde_prime);
        c_tilde == c_tilde_prime
    }
}


/// Derives the matrix seed and the secret-sampling seed from `ζ`, bound to
/// the parameter ranks.
fn derive_seeds(zeta: &[u8; 32], p: &DsaParams) -> ([u8; 32], [u8; 64]) {
    #[allow(clippy::cast_possible_truncation)] // k and l are module ranks
    let mut xof = h_xof(&[zeta, &[p.k as u8], &[p.l as u8]]);
    let mut rho = [0u8; 32];
    xof.read(&mut rho);
    let mut rho_prime = [0u8; 64];
    xof.read(&mut rho_prime);
    (rho, rho_prime)
}

/// 64-byte message representative fed into the challenge hash.
fn message_digest(message: &[u8]) -> [u8; 64] {
    let mut mu = [0u8; 64];
    h_xof(&[message]).read(&mut mu);
    mu
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DILITHIUM_2, DILITHIUM_3, DILITHIUM_5};
    use rand_chacha::rand_core::SeedableRng;

    const CAP: u32 = 1000;

    #[test]
    fn sign_verify_all_sets() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(123);
        let message1 = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let message2 = [7u8, 7, 7, 7, 7, 7, 7, 7];
        for params in [&DILITHIUM_2, &DILITHIUM_3, &DILITHIUM_5] {
            let dsa = Dsa::new(params);
            for _ in 0..8 {
                let (pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
                assert_eq!(pk.len(), params.public_key_len());
                assert_eq!(sk.len(), params.private_key_len());

                let sig = dsa.try_sign_with_rng(&mut rng, &sk, &message1, CAP, None).unwrap();
                assert_eq!(sig.len(), params.signature_len());
                assert!(dsa.verify(&pk, &message1, &sig), "{}", params.name);
                assert!(!dsa.verify(&pk, &message2, &sig), "{}", params.name);
            }
        }
    }

    #[test]
    fn tampered_signature_fails() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(456);
        let message = b"attestation payload";
        let dsa = Dsa::new(&DILITHIUM_2);
        let (pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
        let sig = dsa.try_sign_with_rng(&mut rng, &sk, message, CAP, None).unwrap();

        for i in 0..8 {
            let mut bad = sig.clone();
            bad[i * (sig.len() / 8)] ^= 0x08;
            assert!(!dsa.verify(&pk, message, &bad));
        }
        assert!(!dsa.verify(&pk, message, &sig[..sig.len() - 1]));
        assert!(!dsa.verify(&pk, message, &[]));
    }

    #[test]
    fn keygen_is_deterministic_from_seed() {
        let dsa = Dsa::new(&DILITHIUM_3);
        let (pk1, sk1) = dsa.keygen_from_seed(&[0x11u8; 32]);
        let (pk2, sk2) = dsa.keygen_from_seed(&[0x11u8; 32]);
        assert_eq!(pk1, pk2);
        assert_eq!(sk1, sk2);
        let (pk3, _) = dsa.keygen_from_seed(&[0x12u8; 32]);
        assert_ne!(pk1, pk3);
    }

    #[test]
    fn cancelled_token_aborts_signing() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(789);
        let dsa = Dsa::new(&DILITHIUM_2);
        let (_pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let err = dsa.try_sign_with_rng(&mut rng, &sk, b"msg", CAP, Some(&token)).unwrap_err();
        assert_eq!(err, SignError::Cancelled);
    }

    #[test]
    fn zero_attempt_cap_exhausts() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(790);
        let dsa = Dsa::new(&DILITHIUM_2);
        let (_pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
        let err = dsa.try_sign_with_rng(&mut rng, &sk, b"msg", 0, None).unwrap_err();
        assert_eq!(err, SignError::Exhausted { attempts: 0 });
    }

    #[test]
    fn malformed_private_key_is_rejected() {
        let dsa = Dsa::new(&DILITHIUM_2);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(791);
        let err = dsa.try_sign_with_rng(&mut rng, &[0u8; 10], b"msg", CAP, None).unwrap_err();
        assert!(matches!(err, SignError::Malformed(_)));
    }
}
