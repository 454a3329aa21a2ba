use criterion::{criterion_group, criterion_main, Criterion};
use pqlattice::dsa::Dsa;
use pqlattice::kem::Kem;
use pqlattice::params::{DILITHIUM_2, DILITHIUM_3, DILITHIUM_5, KYBER_1024, KYBER_512, KYBER_768};
use rand_chacha::rand_core::SeedableRng;


pub fn criterion_benchmark(c: &mut Criterion) {
    let message = [0u8, 1, 2, 3, 4, 5, 6, 7];
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(123);

    for params in [&KYBER_512, &KYBER_768, &KYBER_1024] {
        let kem = Kem::new(params);
        let (pk, sk) = kem.try_keygen_with_rng(&mut rng).unwrap();
        let enc = kem.try_encapsulate_with_rng(&mut rng, &pk).unwrap();

        c.bench_function(&format!("{} keygen", params.name), |b| {
            b.iter(|| kem.try_keygen_with_rng(&mut rand_chacha::ChaCha8Rng::seed_from_u64(7)))
        });
        c.bench_function(&format!("{} encapsulate", params.name), |b| {
            b.iter(|| {
                kem.try_encapsulate_with_rng(&mut rand_chacha::ChaCha8Rng::seed_from_u64(7), &pk)
            })
        });
        c.bench_function(&format!("{} decapsulate", params.name), |b| {
            b.iter(|| kem.decapsulate(&sk, &enc.ciphertext))
        });
    }

    for params in [&DILITHIUM_2, &DILITHIUM_3, &DILITHIUM_5] {
        let dsa = Dsa::new(params);
        let (pk, sk) = dsa.try_keygen_with_rng(&mut rng).unwrap();
        let sig = dsa.try_sign_with_rng(&mut rng, &sk, &message, 1000, None).unwrap();

        c.bench_function(&format!("{} keygen", params.name), |b| {
            b.iter(|| dsa.keygen_from_seed(&[0x11u8; 32]))
        });
        c.bench_function(&format!("{} sign", params.name), |b| {
            b.iter(|| {
                dsa.try_sign_with_rng(
                    &mut rand_chacha::ChaCha8Rng::seed_from_u64(7),
                    &sk,
                    &message,
                    1000,
                    None,
                )
            })
        });
        c.bench_function(&format!("{} verify", params.name), |b| {
            b.iter(|| dsa.verify(&pk, &message, &sig))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

// cargo bench
