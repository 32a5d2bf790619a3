//! Poly1305 one-time authenticator (RFC 8439).

use crate::{
    Result,
    accelerator::Accelerator,
    barrett::NpMode,
    buffer::LeWords,
    engine::{Engine, Pka, SessionParams},
    regs::{LenId, Reg},
};
use zeroize::Zeroizing;

/// Key size in bytes: `r || s`.
pub const KEY_SIZE: usize = 32;

/// Tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Poly1305 key.
pub type Key = [u8; KEY_SIZE];

/// Poly1305 tag.
pub type Tag = [u8; TAG_SIZE];

/// `2^130 - 5`, little-endian words.
const P1305: [u32; 5] = [0xffff_fffb, 0xffff_ffff, 0xffff_ffff, 0xffff_ffff, 0x3];

/// Barrett tag of `2^130 - 5`.
const P1305_NP: [u32; 3] = [0x0000_0000, 0x0000_0000, 0x80];

/// Clamping mask for `r`, little-endian words.
const R_MASK: [u32; 4] = [0x0fff_ffff, 0x0fff_fffc, 0x0fff_fffc, 0x0fff_fffc];

fn le_words<const N: usize>(bytes: &[u8]) -> [u32; N] {
    let mut words = [0u32; N];
    for (i, b) in bytes.iter().enumerate().take(4 * N) {
        words[i / 4] |= (*b as u32) << (8 * (i % 4));
    }
    words
}

/// Registers of one MAC computation.
struct Mac {
    acc: Reg,
    r: Reg,
    block: Reg,
}

impl Mac {
    fn start<A: Accelerator>(engine: &mut Engine<'_, A>, key: &Key) -> Result<Self> {
        engine.set_modulus(&LeWords(P1305), Some(&P1305_NP[..]), NpMode::Full)?;

        let [acc, r, block] = engine.pool().take_array()?;
        let mut r_words = Zeroizing::new(le_words::<4>(&key[..16]));
        for (w, m) in r_words.iter_mut().zip(R_MASK) {
            *w &= m;
        }
        engine.copy_into_register(r, &LeWords(&r_words[..]))?;
        engine.clear(LenId::N, acc)?;

        Ok(Self { acc, r, block })
    }

    /// `acc = (acc + block) · r mod p`, the block padded with a set bit.
    fn absorb<A: Accelerator>(&self, engine: &mut Engine<'_, A>, chunk: &[u8]) -> Result<()> {
        let mut words = Zeroizing::new(le_words::<5>(chunk));
        let len = chunk.len().min(BLOCK_SIZE);
        words[len / 4] |= 1 << (8 * (len % 4));

        engine.copy_into_register(self.block, &LeWords(&words[..]))?;
        engine.mod_add(self.acc, self.acc, self.block)?;
        engine.mod_mul(self.acc, self.acc, self.r)
    }

    /// Absorb `data` zero-padded to whole blocks.
    fn absorb_padded<A: Accelerator>(&self, engine: &mut Engine<'_, A>, data: &[u8]) -> Result<()> {
        for chunk in data.chunks(BLOCK_SIZE) {
            let mut block = Zeroizing::new([0u8; BLOCK_SIZE]);
            block[..chunk.len()].copy_from_slice(chunk);
            self.absorb(engine, &block[..])?;
        }
        Ok(())
    }

    /// `tag = acc + s mod 2^128`.
    fn finish<A: Accelerator>(
        &self,
        engine: &mut Engine<'_, A>,
        key: &Key,
        tag: &mut Tag,
    ) -> Result<()> {
        let s = Zeroizing::new(le_words::<4>(&key[16..]));
        engine.copy_into_register(self.block, &LeWords(&s[..]))?;
        engine.add(LenId::N, self.acc, self.acc, self.block)?;

        let mut words = Zeroizing::new([0u32; 4]);
        engine.read_words(self.acc, &mut words[..])?;
        for (out, w) in tag.chunks_exact_mut(4).zip(words.iter()) {
            out.copy_from_slice(&w.to_le_bytes());
        }
        Ok(())
    }
}

impl<A: Accelerator> Pka<A> {
    /// Poly1305 tag of `data`.
    pub fn poly_mac(&self, key: &Key, data: &[u8], tag: &mut Tag) -> Result<()> {
        let result = self.poly_mac_inner(key, None, data, tag);
        if result.is_err() {
            tag.fill(0);
        }
        result
    }

    /// Poly1305 tag over `aad` and `data` as used by the ChaCha20-Poly1305
    /// AEAD: both zero-padded to whole blocks, followed by their lengths as
    /// little-endian 64-bit integers.
    pub fn poly_mac_aead(&self, key: &Key, aad: &[u8], data: &[u8], tag: &mut Tag) -> Result<()> {
        let result = self.poly_mac_inner(key, Some(aad), data, tag);
        if result.is_err() {
            tag.fill(0);
        }
        result
    }

    fn poly_mac_inner(
        &self,
        key: &Key,
        aad: Option<&[u8]>,
        data: &[u8],
        tag: &mut Tag,
    ) -> Result<()> {
        let mut engine = self.session(SessionParams::new(130).with_reg_count(7))?;
        let mac = Mac::start(&mut engine, key)?;

        match aad {
            None => {
                for chunk in data.chunks(BLOCK_SIZE) {
                    mac.absorb(&mut engine, chunk)?;
                }
            }
            Some(aad) => {
                mac.absorb_padded(&mut engine, aad)?;
                mac.absorb_padded(&mut engine, data)?;

                let mut lengths = [0u8; BLOCK_SIZE];
                lengths[..8].copy_from_slice(&(aad.len() as u64).to_le_bytes());
                lengths[8..].copy_from_slice(&(data.len() as u64).to_le_bytes());
                mac.absorb(&mut engine, &lengths)?;
            }
        }

        mac.finish(&mut engine, key, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SoftPka;
    use hex_literal::hex;

    #[test]
    fn little_endian_words() {
        let words = le_words::<5>(&[1, 2, 3]);
        assert_eq!(words, [0x0003_0201, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_message_is_s() {
        let pka = Pka::new(SoftPka::new());
        let key = hex!("0000000000000000000000000000000036e5f6b5c5e06070f0efca96227a863e");
        let mut tag = [0u8; TAG_SIZE];
        pka.poly_mac(&key, &[], &mut tag).unwrap();
        assert_eq!(tag, key[16..]);
    }

    #[test]
    fn np_constant_matches_engine() {
        let pka = Pka::new(SoftPka::new());
        let mut engine = pka.session(SessionParams::new(130)).unwrap();
        engine
            .set_modulus(&LeWords(P1305), None, NpMode::Full)
            .unwrap();
        assert_eq!(engine.read_np().unwrap(), P1305_NP);
    }
}
