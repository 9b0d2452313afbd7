//! REF+ALT codec (component C): a reversible 31-bit packing for short
//! ACGT-only allele pairs, falling back to a deterministic Murmur3-style
//! hash for everything else. The least-significant bit of the returned
//! code distinguishes the two modes (0 = reversible, 1 = hash).

use crate::hash::refalt_hash;

/// Decoded REF+ALT, returned only for reversible codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefAlt {
    pub reference: String,
    pub alt: String,
}

fn encode_base(c: u8) -> Option<u32> {
    match c.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

fn decode_base(code: u32, bitpos: u32) -> u8 {
    const BASE: [u8; 4] = [b'A', b'C', b'G', b'T'];
    BASE[((code >> bitpos) & 0x3) as usize]
}

/// Try the reversible layout: `[4 bits len(ref)][4 bits len(alt)][23 bits
/// packed bases]`. Returns `None` if either allele contains a non-ACGT
/// character or the combined length would overflow the 4-bit length
/// fields.
fn encode_refalt_rev(reference: &[u8], alt: &[u8]) -> Option<u32> {
    if reference.len() > 15 || alt.len() > 15 {
        return None;
    }
    let mut h: u32 = (reference.len() as u32) << 27;
    h |= (alt.len() as u32) << 23;
    let mut bitpos: i32 = 23;
    for &c in reference.iter().chain(alt.iter()) {
        let v = encode_base(c)?;
        bitpos -= 2;
        h |= v << bitpos;
    }
    Some(h)
}

/// Encode a REF+ALT pair into its 31-bit code (LSB = mode flag). Reversible
/// whenever `len(ref) + len(alt) <= 11` and both alleles are pure ACGT;
/// otherwise the Murmur3-style hash fallback.
pub fn encode_refalt(reference: &str, alt: &str) -> u32 {
    if reference.len() + alt.len() <= 11 {
        if let Some(code) = encode_refalt_rev(reference.as_bytes(), alt.as_bytes()) {
            if code & 1 == 0 {
                return code;
            }
        }
    }
    refalt_hash(reference.as_bytes(), alt.as_bytes())
}

/// Decode a reversible REF+ALT code. Returns `None` when the code's LSB is
/// set (hash mode) — callers needing the original strings for such codes
/// must consult the `nrvk` lookup table (component I).
pub fn decode_refalt(code: u32) -> Option<RefAlt> {
    if code & 1 != 0 {
        return None;
    }
    let sizeref = ((code & 0x7800_0000) >> 27) as usize;
    let sizealt = ((code & 0x0780_0000) >> 23) as usize;
    let mut bitpos: i32 = 23;
    let mut reference = String::with_capacity(sizeref);
    for _ in 0..sizeref {
        bitpos -= 2;
        reference.push(decode_base(code, bitpos as u32) as char);
    }
    let mut alt = String::with_capacity(sizealt);
    for _ in 0..sizealt {
        bitpos -= 2;
        alt.push(decode_base(code, bitpos as u32) as char);
    }
    Some(RefAlt { reference, alt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn ac_gt_matches_reference_vector() {
        let code = encode_refalt("AC", "GT");
        assert_eq!(code, 286_097_408);
        assert_eq!(code & 1, 0);
        let decoded = decode_refalt(code).unwrap();
        assert_eq!(decoded.reference, "AC");
        assert_eq!(decoded.alt, "GT");
    }

    #[rstest]
    #[case("A", "T")]
    #[case("ACGTA", "CGT")]
    #[case("a", "t")]
    #[case("AAAAA", "TTTTT")]
    fn reversible_roundtrip(#[case] reference: &str, #[case] alt: &str) {
        let code = encode_refalt(reference, alt);
        assert_eq!(code & 1, 0);
        let decoded = decode_refalt(code).unwrap();
        assert_eq!(decoded.reference, reference.to_uppercase());
        assert_eq!(decoded.alt, alt.to_uppercase());
    }

    #[test]
    fn too_long_falls_back_to_hash() {
        let code = encode_refalt("ACGTACGT", "ACGT");
        assert_eq!(code & 1, 1);
        assert!(decode_refalt(code).is_none());
    }

    #[test]
    fn non_acgt_falls_back_to_hash() {
        let code = encode_refalt("AN", "GT");
        assert_eq!(code & 1, 1);
        assert!(decode_refalt(code).is_none());
    }

    #[test]
    fn hash_fallback_is_deterministic() {
        assert_eq!(
            encode_refalt("ACGTACGT", "ACGT"),
            encode_refalt("ACGTACGT", "ACGT")
        );
    }
}
