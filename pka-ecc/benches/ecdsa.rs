//! ECDSA and scalar multiplication benchmarks on the software backend

use criterion::{Criterion, criterion_group, criterion_main};
use hex_literal::hex;
use pka::{Pka, SoftPka};
use pka_ecc::{AffinePoint, DomainId, EcConfig, Ecc, PrivateKey, ScalarMultMode};
use rand_chacha::{ChaCha20Rng, rand_core::SeedableRng};
use std::hint::black_box;

const D: [u8; 32] = hex!("bb488aef416a41d7680d1cf01d70f59b60d7f5f77e30e78b8bf9d2d882f156a6");
const Z: [u8; 32] = hex!("e33580eb6ed022aed6af20d92237635e7c20c5f1bcd6aee88182ed7180f6e267");

fn bench_ecdsa(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa");
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let mut rng = ChaCha20Rng::seed_from_u64(0);

    let d = PrivateKey::from_bytes(DomainId::Secp256k1, &D).unwrap();
    group.bench_function("sign_digest", |b| {
        b.iter(|| {
            ecc.sign_message_digest(black_box(&d), &black_box(Z), &mut rng)
                .unwrap()
        })
    });

    let q = ecc.public_key(&d).unwrap();
    let s = ecc.sign_message_digest(&d, &Z, &mut rng).unwrap();
    group.bench_function("verify_digest", |b| {
        b.iter(|| {
            ecc.verify_signature(black_box(&q), &black_box(Z), black_box(&s))
                .unwrap()
        })
    });

    group.finish();
}

fn bench_scalar_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_mul");
    let pka = Pka::new(SoftPka::new());

    for (name, mode) in [
        ("naf", ScalarMultMode::Fast),
        ("protected", ScalarMultMode::Protected),
    ] {
        let ecc = Ecc::with_config(&pka, EcConfig::new().with_scalar_mult(mode));
        let g = AffinePoint::generator(DomainId::Secp256r1);
        group.bench_function(name, |b| {
            b.iter(|| ecc.scalar_mul(&black_box(D), &g).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ecdsa, bench_scalar_mul);
criterion_main!(benches);
