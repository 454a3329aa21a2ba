use pqlattice::dsa::Dsa;
use pqlattice::kem::Kem;
use pqlattice::params::{
    DILITHIUM_2, DILITHIUM_3, DILITHIUM_5, KYBER_1024, KYBER_512, KYBER_768,
};
use rand_chacha::rand_core::SeedableRng;
use rand_core::RngCore;

const CAP: u32 = 1000;

#[test]
fn kem_512_rounds() {
    kem_rounds(Kem::new(&KYBER_512), 123);
}

#[test]
fn kem_768_rounds() {
    kem_rounds(Kem::new(&KYBER_768), 456);
}

#[test]
fn kem_1024_rounds() {
    kem_rounds(Kem::new(&KYBER_1024), 789);
}

fn kem_rounds(kem: Kem, seed: u64) {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    for _i in 0..16 {
        let (pk, sk) = kem.try_keygen_with_rng(&mut rng).unwrap();
        let enc = kem.try_encapsulate_with_rng(&mut rng, &pk).unwrap();
        let ss = kem.decapsulate(&sk, &enc.ciphertext).unwrap();
        assert_eq!(ss, enc.shared_secret);
    }
}

#[test]
fn dsa_2_rounds() {
    dsa_rounds(Dsa::new(&DILITHIUM_2), 123);
}

#[test]
fn dsa_3_rounds() {
    dsa_rounds(Dsa::new(&DILITHIUM_3), 456);
}

#[test]
fn dsa_5_rounds() {
    dsa_rounds(Dsa::new(&DILITHIUM_5), 789);
}

fn dsa_rounds(dsa: Dsa, seed: u64) {
    let mut msg = [0u8; 32];
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    for _i in 0..16 {
        rng.fill_bytes(&mut msg);
        let (pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
        let sig = dsa.try_sign_with_rng(&mut rng, &sk, &msg, CAP, None).unwrap();
        assert!(dsa.verify(&pk, &msg, &sig));
        msg[0] ^= 0xff;
        assert!(!dsa.verify(&pk, &msg, &sig));
    }
}

#[test]
fn dsa_rejects_tampering_everywhere() {
    let msg = [0u8, 1, 2, 3, 4, 5, 6, 7];
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
    let dsa = Dsa::new(&DILITHIUM_2);
    let (pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
    let sig = dsa.try_sign_with_rng(&mut rng, &sk, &msg, CAP, None).unwrap();

    // bad messages
    for i in 0..8 {
        let mut msg_bad = msg;
        msg_bad[i] ^= 0x08;
        assert!(!dsa.verify(&pk, &msg_bad, &sig));
    }

    // every region of a bad signature: challenge bytes and each z polynomial
    for i in 0..8 {
        let mut sig_bad = sig.clone();
        sig_bad[i * (sig.len() / 8)] ^= 0x08;
        assert!(!dsa.verify(&pk, &msg, &sig_bad));
    }

    // bad public key
    for i in 0..8 {
        let mut pk_bad = pk.clone();
        pk_bad[40 + i * 10] ^= 0x08;
        assert!(!dsa.verify(&pk_bad, &msg, &sig));
    }
}

#[test]
fn kem_cross_pair_secrets_disagree() {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
    let kem = Kem::new(&KYBER_768);
    let (pk_a, _sk_a) = kem.try_keygen_with_rng(&mut rng).unwrap();
    let (_pk_b, sk_b) = kem.try_keygen_with_rng(&mut rng).unwrap();
    let enc = kem.try_encapsulate_with_rng(&mut rng, &pk_a).unwrap();
    // decapsulating with an unrelated private key cannot recover the secret
    let ss = kem.decapsulate(&sk_b, &enc.ciphertext).unwrap();
    assert_ne!(ss, enc.shared_secret);
}

#[test]
fn deterministic_keygen_matches_across_calls() {
    let dsa = Dsa::new(&DILITHIUM_2);
    let (pk, _sk) = dsa.keygen_from_seed(&[0x11u8; 32]);
    let (pk2, _sk2) = dsa.keygen_from_seed(&[0x11u8; 32]);
    assert_eq!(hex::encode(&pk), hex::encode(&pk2));
}
