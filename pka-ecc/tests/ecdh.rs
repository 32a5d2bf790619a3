//! ECDH shared secrets.

use pka::{Pka, SoftPka};
use pka_ecc::{DomainId, EcConfig, Ecc, Error, ScalarMultMode};
use rand_chacha::{ChaCha20Rng, rand_core::SeedableRng};

#[test]
fn shared_secrets_agree() {
    let pka = Pka::new(SoftPka::new());
    let mut rng = ChaCha20Rng::seed_from_u64(0xd1ff1e);

    for mode in [ScalarMultMode::Fast, ScalarMultMode::Protected] {
        let ecc = Ecc::with_config(&pka, EcConfig::new().with_scalar_mult(mode));
        for domain in DomainId::ALL {
            let size = domain.domain().modulus_size();
            let alice = ecc.generate_key_pair(domain, &mut rng).unwrap();
            let bob = ecc.generate_key_pair(domain, &mut rng).unwrap();

            let mut k1 = [0u8; 66];
            let mut k2 = [0u8; 66];
            ecc.derive_shared_secret(alice.private_key(), bob.public_key(), &mut k1[..size])
                .unwrap();
            ecc.derive_shared_secret(bob.private_key(), alice.public_key(), &mut k2[..size])
                .unwrap();
            assert_eq!(k1, k2, "{domain:?} {mode:?}");
            assert!(k1[..size].iter().any(|b| *b != 0));
        }
    }
}

#[test]
fn shared_secret_is_x_of_product() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let alice = ecc
        .key_pair_from_seed(DomainId::Secp384r1, &[0x3c; 56])
        .unwrap();
    let bob = ecc
        .key_pair_from_seed(DomainId::Secp384r1, &[0xc3; 56])
        .unwrap();

    let mut d = [0u8; 48];
    alice.private_key().to_bytes(&mut d).unwrap();
    let product = ecc.scalar_mul(&d, bob.public_key().point()).unwrap();
    let mut expected = [0u8; 48];
    product.x_bytes(&mut expected).unwrap();

    let mut shared = [0u8; 48];
    ecc.derive_shared_secret(alice.private_key(), bob.public_key(), &mut shared)
        .unwrap();
    assert_eq!(shared, expected);
}

#[test]
fn released_keys_are_rejected() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let (mut private_key, public_key) = ecc
        .key_pair_from_seed(DomainId::Secp256r1, &[9; 40])
        .unwrap()
        .into_parts();

    private_key.release();
    let mut out = [0u8; 32];
    assert_eq!(
        ecc.derive_shared_secret(&private_key, &public_key, &mut out),
        Err(Error::IllegalPrivateKeyTag)
    );
}
