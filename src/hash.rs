//! Shared MurmurHash3-derived mixers used by the REF+ALT hash fallback
//! (32-bit) and the ESID hash mode (64-bit). Constants and rotation amounts
//! are bit-for-bit pinned to the canonical C implementation; any deviation
//! here breaks compatibility with previously generated lookup tables.

/// Pack up to 6 uppercased ASCII characters (5 bits each, `'A'` = 1 .. `'Z'`
/// = 26, `'*'` = 27) into a 32-bit word, MSB-first starting at bit 31,
/// leaving 2 spare bits: `[0RRRRR CCCCCC CCCCCC CCCCC0]`. Matches
/// `pack_chars` in the reference sources.
fn pack_chars(chars: &[u8]) -> u32 {
    let mut h: u32 = 0;
    let mut bitpos: i32 = 31;
    for &c in chars.iter().take(6) {
        let upper = c.to_ascii_uppercase();
        let v = if upper == b'*' {
            (b'Z' - b'A' + 1 + 1) as u32
        } else {
            (upper - b'A' + 1) as u32
        };
        bitpos -= 5;
        h |= v << bitpos;
    }
    h
}

/// One MurmurHash3-style 32-bit mixing round: `h = mix(k, h)`.
fn mix32(mut k: u32, mut h: u32) -> u32 {
    k = k.wrapping_mul(0xcc9e_2d51);
    k = k.rotate_right(17);
    k = k.wrapping_mul(0x1b87_3593);
    h ^= k;
    h = h.rotate_right(19);
    h.wrapping_mul(5).wrapping_add(0xe654_6b64)
}

/// MurmurHash3 32-bit finalization (avalanche).
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Fold an ASCII nucleotide string into a running 32-bit hash by packing it
/// in groups of 6 characters and mixing each group, matching `hash32`.
fn fold32(s: &[u8]) -> u32 {
    let mut h: u32 = 0;
    for chunk in s.chunks(6) {
        h = mix32(pack_chars(chunk), h);
    }
    h
}

/// The 31-bit REF+ALT hash fallback (component C), with the hash-mode LSB
/// already set. Matches `encode_refalt_hash`: `hash32(ref)` and
/// `hash32(alt)` are combined via the same mixer with separator `0x3`, then
/// finalized and shifted right by one to make room for the mode bit.
pub fn refalt_hash(reference: &[u8], alt: &[u8]) -> u32 {
    let h = mix32(fold32(alt), mix32(0x3, fold32(reference)));
    (fmix32(h) >> 1) | 0x1
}

/// One MurmurHash3-style 64-bit mixing round, as used by ESID's
/// `hash_string_id`.
fn mix64(mut k: u64, mut h: u64) -> u64 {
    k = k.wrapping_mul(0x87c3_7b91_1142_53d5);
    k = k.rotate_right(33);
    k = k.wrapping_mul(0x4cf5_ad43_2745_937f);
    h ^= k;
    h = h.rotate_right(37);
    h.wrapping_mul(5).wrapping_add(0x52dc_e729)
}

/// MurmurHash3 64-bit finalization (avalanche).
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// The 64-bit ESID hash mode (component F), with the hash-mode top bit
/// already set. Matches `hash_string_id`: reads 8-byte little-endian words,
/// folds the remaining tail bytes in, then finalizes.
pub fn esid_hash(s: &[u8]) -> u64 {
    let mut h: u64 = 0;
    let mut chunks = s.chunks_exact(8);
    for chunk in &mut chunks {
        let k = u64::from_le_bytes(chunk.try_into().unwrap());
        h = mix64(k, h);
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut v: u64 = 0;
        for (i, &b) in tail.iter().enumerate() {
            v |= (b as u64) << (8 * i);
        }
        h = mix64(v, h);
    }
    fmix64(h) | 0x8000_0000_0000_0000
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn refalt_hash_lsb_is_set() {
        assert_eq!(refalt_hash(b"ACGTACGT", b"ACGT") & 1, 1);
    }

    #[test]
    fn refalt_hash_is_deterministic() {
        assert_eq!(
            refalt_hash(b"ACGTACGT", b"ACGT"),
            refalt_hash(b"ACGTACGT", b"ACGT")
        );
        assert_ne!(refalt_hash(b"ACGTACGT", b"ACGT"), refalt_hash(b"ACGTACGT", b"ACGA"));
    }

    #[test]
    fn esid_hash_top_bit_set() {
        assert_eq!(esid_hash(b"some long identifier string") >> 63, 1);
    }
}
