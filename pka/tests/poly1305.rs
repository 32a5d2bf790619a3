//! Poly1305 test vectors from RFC 8439.

use hex_literal::hex;
use pka::{
    Pka, SoftPka,
    poly1305::{TAG_SIZE, Tag},
};

fn mac(key: [u8; 32], msg: &[u8]) -> Tag {
    let pka = Pka::new(SoftPka::new());
    let mut tag = [0u8; TAG_SIZE];
    pka.poly_mac(&key, msg, &mut tag).unwrap();
    tag
}

/// RFC 8439 §2.5.2
#[test]
fn rfc8439_mac() {
    let key = hex!("85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b");
    assert_eq!(
        mac(key, b"Cryptographic Forum Research Group"),
        hex!("a8061dc1305136c6c22b8baf0c0127a9")
    );
}

/// RFC 8439 §A.3 #5: the accumulator wraps past `p`.
#[test]
fn rfc8439_wrap_past_p() {
    let mut key = [0u8; 32];
    key[0] = 2;
    assert_eq!(mac(key, &[0xff; 16]), hex!("03000000000000000000000000000000"));
}

/// RFC 8439 §A.3 #6: the final addition of `s` wraps past `2^128`.
#[test]
fn rfc8439_wrap_past_2_128() {
    let mut key = [0xffu8; 32];
    key[..16].fill(0);
    key[0] = 2;
    let mut msg = [0u8; 16];
    msg[0] = 2;
    assert_eq!(mac(key, &msg), hex!("03000000000000000000000000000000"));
}

/// RFC 8439 §2.8.2, with the one-time key of §2.6.
#[test]
fn rfc8439_aead_tag() {
    let key = hex!("7bac2b252db447af09b67a55a4e955840ae1d6731075d9eb2a9375783ed553ff");
    let aad = hex!("50515253c0c1c2c3c4c5c6c7");
    let ciphertext = hex!(
        "d31a8d34648e60db7b86afbc53ef7ec2a4aded51296e08fea9e2b5a736ee62d6"
        "3dbea45e8ca9671282fafb69da92728b1a71de0a9e060b2905d6a5b67ecd3b36"
        "92ddbd7f2d778b8c9803aee328091b58fab324e4fad675945585808b4831d7bc"
        "3ff4def08e4b7a9de576d26586cec64b6116"
    );

    let pka = Pka::new(SoftPka::new());
    let mut tag = [0u8; TAG_SIZE];
    pka.poly_mac_aead(&key, &aad, &ciphertext, &mut tag).unwrap();
    assert_eq!(tag, hex!("1ae10b594f09e26a7e902ecbd0600691"));
}

#[test]
fn scratch_memory_is_wiped() {
    let pka = Pka::new(SoftPka::new());
    let key = hex!("85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b");
    let mut tag = [0u8; TAG_SIZE];
    pka.poly_mac(&key, b"secret", &mut tag).unwrap();

    let soft = pka.into_inner();
    assert!(soft.sram().iter().all(|w| *w == 0));
    assert!(!soft.is_powered());
}
