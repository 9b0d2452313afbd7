//! VariantKey codec (component D): composes `(chrom, pos, refalt)` into a
//! single sortable `u64`.

use crate::bits::{format_hex, parse_hex};
use crate::chrom::encode_chrom;
use crate::refalt::encode_refalt;

const SHIFT_CHROM: u32 = 59;
const SHIFT_POS: u32 = 31;
const MASK_CHROM: u64 = 0x1f << SHIFT_CHROM;
const MASK_POS: u64 = 0x0fff_ffff << SHIFT_POS;
const MASK_REFALT: u64 = 0x7fff_ffff;

/// Decoded VariantKey fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantKeyFields {
    pub chrom: u8,
    pub pos: u32,
    pub refalt: u32,
}

/// Minimum/maximum VariantKey for a `(chrom, pos_min..pos_max)` range query,
/// spanning every possible REF+ALT encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantKeyRange {
    pub min: u64,
    pub max: u64,
}

/// Compose the 5-bit chrom, 28-bit pos, and 31-bit refalt fields into a u64.
pub fn encode_variantkey(chrom: u8, pos: u32, refalt: u32) -> u64 {
    ((chrom as u64) << SHIFT_CHROM) | ((pos as u64) << SHIFT_POS) | (refalt as u64)
}

/// Split a VariantKey back into its three fields.
pub fn decode_variantkey(code: u64) -> VariantKeyFields {
    VariantKeyFields {
        chrom: ((code & MASK_CHROM) >> SHIFT_CHROM) as u8,
        pos: ((code & MASK_POS) >> SHIFT_POS) as u32,
        refalt: (code & MASK_REFALT) as u32,
    }
}

/// Encode a variant by CHROM name, 0-based position, and REF/ALT alleles.
pub fn variantkey(chrom: &str, pos: u32, reference: &str, alt: &str) -> u64 {
    encode_variantkey(encode_chrom(chrom), pos, encode_refalt(reference, alt))
}

/// Minimum and maximum VariantKeys covering every REF+ALT for a given
/// `chrom` and `[pos_min, pos_max]` range.
pub fn variantkey_range(chrom: u8, pos_min: u32, pos_max: u32) -> VariantKeyRange {
    let c = (chrom as u64) << SHIFT_CHROM;
    VariantKeyRange {
        min: c | ((pos_min as u64) << SHIFT_POS),
        max: c | ((pos_max as u64) << SHIFT_POS) | MASK_REFALT,
    }
}

/// Compare two VariantKeys by chromosome only: `-1`, `0`, or `+1`.
pub fn compare_variantkey_chrom(a: u64, b: u64) -> i32 {
    compare((a >> SHIFT_CHROM, b >> SHIFT_CHROM))
}

/// Compare two VariantKeys by `(chrom, pos)`: `-1`, `0`, or `+1`.
pub fn compare_variantkey_chrom_pos(a: u64, b: u64) -> i32 {
    compare((a >> SHIFT_POS, b >> SHIFT_POS))
}

fn compare((a, b): (u64, u64)) -> i32 {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    }
}

/// Exactly 16 lowercase hex digits, no prefix.
pub fn variantkey_hex(code: u64) -> String {
    format_hex(code)
}

/// Parse a 16-digit (case-insensitive) hex VariantKey string.
pub fn parse_variantkey_hex(s: &str) -> u64 {
    parse_hex(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reference_vector() {
        let vk = variantkey("X", 12345, "AC", "GT");
        assert_eq!(vk, 0xB800181C910D8000);
        assert_eq!(variantkey_hex(vk), "b800181c910d8000");
    }

    #[test]
    fn decode_matches_encode() {
        let vk = encode_variantkey(23, 12345, 286_097_408);
        let fields = decode_variantkey(vk);
        assert_eq!(fields.chrom, 23);
        assert_eq!(fields.pos, 12345);
        assert_eq!(fields.refalt, 286_097_408);
    }

    #[test]
    fn chrom_pos_sort_stability() {
        let k1 = encode_variantkey(5, 100, 1);
        let k2 = encode_variantkey(5, 100, 2_000_000_000 & 0x7fff_ffff);
        assert_eq!(compare_variantkey_chrom_pos(k1, k2), 0);
    }

    #[test]
    fn hex_roundtrip() {
        let vk = variantkey("X", 12345, "AC", "GT");
        assert_eq!(parse_variantkey_hex(&variantkey_hex(vk)), vk);
    }

    #[test]
    fn range_spans_all_refalt_at_boundaries() {
        let range = variantkey_range(10, 5, 50);
        let min_fields = decode_variantkey(range.min);
        let max_fields = decode_variantkey(range.max);
        assert_eq!(min_fields.pos, 5);
        assert_eq!(min_fields.refalt, 0);
        assert_eq!(max_fields.pos, 50);
        assert_eq!(max_fields.refalt, 0x7fff_ffff);
    }
}
