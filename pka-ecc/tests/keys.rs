//! Key generation, SEC1 encodings and public key validation.

use hex_literal::hex;
use pka::{Pka, SoftPka};
use pka_ecc::{AffinePoint, DomainId, EcConfig, Ecc, Error, PrivateKey, PubKeyCheck, PublicKey};
use rand_chacha::{ChaCha20Rng, rand_core::SeedableRng};

#[test]
fn key_pair_from_seed_regression() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let seed: [u8; 40] = core::array::from_fn(|i| i as u8 + 1);

    let keys = ecc.key_pair_from_seed(DomainId::Secp256r1, &seed).unwrap();
    let mut d = [0u8; 32];
    keys.private_key().to_bytes(&mut d).unwrap();
    assert_eq!(
        d,
        hex!("0e101214070605041155b315cb1c6f28abec21cff529b6e3d4e248eb668b4769")
    );
    assert_eq!(
        keys.public_key().to_encoded(false).as_bytes(),
        hex!(
            "04 f05ef2661c09ab68aad4eee3adf8fe0e11e0e905b8538736433af32eb8a9acba
                9b6c9754655a46f60897f6d79239927b202b3b97cd0b6efb7a05dabdf97e04b9"
        )
    );
}

#[test]
fn public_key_is_d_times_g() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let mut rng = ChaCha20Rng::seed_from_u64(7);

    for domain in DomainId::ALL {
        let keys = ecc.generate_key_pair(domain, &mut rng).unwrap();
        let size = domain.domain().order_size();
        let mut d = [0u8; 66];
        keys.private_key().to_bytes(&mut d[..size]).unwrap();

        let g = AffinePoint::generator(domain);
        let q = ecc.scalar_mul(&d[..size], &g).unwrap();
        assert_eq!(&q, keys.public_key().point(), "{domain:?}");
        assert_eq!(&ecc.public_key(keys.private_key()).unwrap(), keys.public_key());
    }
}

#[test]
fn sec1_round_trips() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let mut rng = ChaCha20Rng::seed_from_u64(8);

    for domain in DomainId::ALL {
        let keys = ecc.generate_key_pair(domain, &mut rng).unwrap();
        for compress in [false, true] {
            let encoded = keys.public_key().to_encoded(compress);
            let decoded = PublicKey::from_sec1(&ecc, domain, encoded.as_bytes()).unwrap();
            assert_eq!(&decoded, keys.public_key(), "{domain:?} compress={compress}");
        }

        // hybrid encoding
        let mut hybrid = [0u8; 133];
        let full = keys.public_key().to_encoded(false);
        let len = full.as_bytes().len();
        hybrid[..len].copy_from_slice(full.as_bytes());
        hybrid[0] = 0x06 | (hybrid[len - 1] & 1);
        let decoded = PublicKey::from_sec1(&ecc, domain, &hybrid[..len]).unwrap();
        assert_eq!(&decoded, keys.public_key());
    }
}

#[test]
fn invalid_points_are_rejected() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);

    // base point with y + 1
    let off_curve = hex!(
        "04 6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296
            4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f6"
    );
    assert_eq!(
        PublicKey::from_sec1(&ecc, DomainId::Secp256r1, &off_curve),
        Err(Error::PointNotOnCurve)
    );

    // x = 1 has no point on P-256
    let mut no_root = [0u8; 33];
    no_root[0] = 0x02;
    no_root[32] = 1;
    assert_eq!(
        PublicKey::from_sec1(&ecc, DomainId::Secp256r1, &no_root),
        Err(Error::PointNotOnCurve)
    );

    // coordinate not below p
    let mut too_big = [0xffu8; 33];
    too_big[0] = 0x03;
    assert_eq!(
        PublicKey::from_sec1(&ecc, DomainId::Secp256r1, &too_big),
        Err(Error::InvalidPointEncoding)
    );

    assert_eq!(
        PublicKey::from_sec1(&ecc, DomainId::Secp256r1, &[0]),
        Err(Error::InvalidPointEncoding)
    );
    assert_eq!(
        PublicKey::from_sec1(&ecc, DomainId::Secp256r1, &off_curve[..64]),
        Err(Error::InvalidPointEncoding)
    );
}

#[test]
fn unchecked_keys_are_accepted_when_configured() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::with_config(&pka, EcConfig::new().with_pub_key_check(PubKeyCheck::None));

    let off_curve = hex!(
        "04 6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296
            4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f6"
    );
    let key = PublicKey::from_sec1(&ecc, DomainId::Secp256r1, &off_curve).unwrap();
    assert_eq!(ecc.check_public_key(&key), Err(Error::PointNotOnCurve));
}

#[test]
fn scalar_range() {
    let pka = Pka::new(SoftPka::new());
    let ecc = Ecc::new(&pka);
    let g = AffinePoint::generator(DomainId::Secp256k1);
    let n = hex!("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141");

    assert_eq!(ecc.scalar_mul(&[0; 32], &g), Err(Error::InvalidScalarValue));
    assert_eq!(ecc.scalar_mul(&n, &g), Err(Error::InvalidScalarValue));
    assert_eq!(ecc.scalar_mul(&[1; 33], &g), Err(Error::InvalidBufferSize));

    // (n - 1)·G = -G
    let mut n_minus_one = n;
    n_minus_one[31] -= 1;
    assert_eq!(ecc.scalar_mul(&n_minus_one, &g).unwrap(), g.negate());
    assert_eq!(ecc.scalar_mul(&[1], &g).unwrap(), g);
}

#[test]
fn private_key_debug_hides_scalar() {
    let key = PrivateKey::from_bytes(DomainId::Secp192r1, &[0x11; 24]).unwrap();
    let debug = format!("{key:?}");
    assert!(debug.contains("Secp192r1"));
    assert!(!debug.contains("11"));
}
