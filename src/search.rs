//! Generic binary search over sorted, fixed-width records (component H).
//!
//! Grounded on `binsearch.h`'s family of `find_first_uintNN_t` /
//! `find_last_uintNN_t` / `has_next_uintNN_t` / `has_prev_uintNN_t`
//! functions, each hand-duplicated per integer width in the original. Rust
//! generics collapse that whole macro-expanded family into one set of
//! functions parameterized over [`crate::bits::FixedWidthInt`], and a small
//! returned [`FindResult`] replaces the C API's mutable `*first`/`*last`
//! out-parameters.

use crate::bits::{Endian, FixedWidthInt};

/// Whether a lookup key occupies an entire fixed-width field or a bit
/// sub-range within it (e.g. VariantKey's packed `chrom`/`pos`/`refalt`).
#[derive(Debug, Clone, Copy)]
pub enum KeyField {
    Whole,
    SubRange { bitstart: u32, bitend: u32 },
}

/// How records are laid out in the mapped byte slice.
#[derive(Debug, Clone, Copy)]
pub enum Layout {
    /// Interleaved rows: record `i`'s key starts at `i * blklen + blkpos`.
    Row { blklen: usize, blkpos: usize },
    /// A single contiguous column: record `i`'s key starts at
    /// `i * size_of::<T>()`.
    Column,
}

/// Outcome of a first/last-occurrence search: `index` is the first match
/// (or `last + 1` if the value was not found), and `first`/`last` bracket
/// every matching record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindResult {
    pub index: u64,
    pub first: u64,
    pub last: u64,
}

fn key_at<T: FixedWidthInt>(
    bytes: &[u8],
    layout: Layout,
    endian: Endian,
    field: KeyField,
    i: u64,
) -> u64 {
    let offset = match layout {
        Layout::Row { blklen, blkpos } => i as usize * blklen + blkpos,
        Layout::Column => i as usize * T::WIDTH_BYTES,
    };
    let raw = T::load(&bytes[offset..offset + T::WIDTH_BYTES], endian);
    match field {
        KeyField::Whole => raw.into(),
        KeyField::SubRange { bitstart, bitend } => raw.bit_range(bitstart, bitend),
    }
}

/// Lower-bound search for `value` among records `[first, last]`. Returns the
/// lowest matching index, or `last + 1` if `value` is absent.
#[allow(clippy::too_many_arguments)]
pub fn find_first<T: FixedWidthInt>(
    bytes: &[u8],
    layout: Layout,
    endian: Endian,
    field: KeyField,
    first: u64,
    last: u64,
    value: u64,
) -> u64 {
    if first > last {
        return last + 1;
    }
    let mut lo = first;
    let mut hi = last + 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if key_at::<T>(bytes, layout, endian, field, mid) < value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo <= last && key_at::<T>(bytes, layout, endian, field, lo) == value {
        lo
    } else {
        last + 1
    }
}

/// Upper-bound search for `value` among records `[first, last]`. Returns the
/// highest matching index, or `last + 1` if `value` is absent.
#[allow(clippy::too_many_arguments)]
pub fn find_last<T: FixedWidthInt>(
    bytes: &[u8],
    layout: Layout,
    endian: Endian,
    field: KeyField,
    first: u64,
    last: u64,
    value: u64,
) -> u64 {
    if first > last {
        return last + 1;
    }
    let mut lo = first;
    let mut hi = last + 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if key_at::<T>(bytes, layout, endian, field, mid) <= value {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo > first && key_at::<T>(bytes, layout, endian, field, lo - 1) == value {
        lo - 1
    } else {
        last + 1
    }
}

/// `true` if the record immediately after `pos` (bounded by `last`) also
/// matches `value` — an O(1) alternative to re-running [`find_last`] while
/// walking a contiguous run of matches forward.
#[allow(clippy::too_many_arguments)]
pub fn has_next<T: FixedWidthInt>(
    bytes: &[u8],
    layout: Layout,
    endian: Endian,
    field: KeyField,
    pos: u64,
    last: u64,
    value: u64,
) -> bool {
    pos < last && key_at::<T>(bytes, layout, endian, field, pos + 1) == value
}

/// `true` if the record immediately before `pos` (bounded by `first`) also
/// matches `value`.
#[allow(clippy::too_many_arguments)]
pub fn has_prev<T: FixedWidthInt>(
    bytes: &[u8],
    layout: Layout,
    endian: Endian,
    field: KeyField,
    pos: u64,
    first: u64,
    value: u64,
) -> bool {
    pos > first && key_at::<T>(bytes, layout, endian, field, pos - 1) == value
}

/// Bracket every record matching `value` within `[first, last]` in a single
/// call, walking outward from [`find_first`] via [`has_next`].
#[allow(clippy::too_many_arguments)]
pub fn find_range<T: FixedWidthInt>(
    bytes: &[u8],
    layout: Layout,
    endian: Endian,
    field: KeyField,
    first: u64,
    last: u64,
    value: u64,
) -> FindResult {
    let index = find_first::<T>(bytes, layout, endian, field, first, last, value);
    if index > last {
        return FindResult { index, first: index, last: index };
    }
    let mut end = index;
    while has_next::<T>(bytes, layout, endian, field, end, last, value) {
        end += 1;
    }
    FindResult { index, first: index, last: end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{ByteOrder, LittleEndian};
    use pretty_assertions::assert_eq;

    fn column_u32(values: &[u32]) -> Vec<u8> {
        let mut bytes = vec![0u8; values.len() * 4];
        for (i, &v) in values.iter().enumerate() {
            LittleEndian::write_u32(&mut bytes[i * 4..i * 4 + 4], v);
        }
        bytes
    }

    #[test]
    fn find_first_and_last_on_sorted_column() {
        let bytes = column_u32(&[1, 2, 2, 2, 5, 8, 8, 9]);
        let last = 7u64;
        let idx = find_first::<u32>(&bytes, Layout::Column, Endian::Little, KeyField::Whole, 0, last, 2);
        assert_eq!(idx, 1);
        let idx = find_last::<u32>(&bytes, Layout::Column, Endian::Little, KeyField::Whole, 0, last, 2);
        assert_eq!(idx, 3);
    }

    #[test]
    fn missing_value_returns_last_plus_one() {
        let bytes = column_u32(&[1, 2, 2, 2, 5, 8, 8, 9]);
        let last = 7u64;
        let idx = find_first::<u32>(&bytes, Layout::Column, Endian::Little, KeyField::Whole, 0, last, 3);
        assert_eq!(idx, last + 1);
    }

    #[test]
    fn find_range_brackets_run() {
        let bytes = column_u32(&[1, 2, 2, 2, 5, 8, 8, 9]);
        let last = 7u64;
        let result = find_range::<u32>(&bytes, Layout::Column, Endian::Little, KeyField::Whole, 0, last, 8);
        assert_eq!(result, FindResult { index: 5, first: 5, last: 6 });
    }

    #[test]
    fn row_interleaved_layout() {
        // 12-byte rows: [u32 key][u64 payload], payload unused here.
        let mut bytes = vec![0u8; 12 * 4];
        for (i, &key) in [10u32, 20, 20, 30].iter().enumerate() {
            LittleEndian::write_u32(&mut bytes[i * 12..i * 12 + 4], key);
        }
        let layout = Layout::Row { blklen: 12, blkpos: 0 };
        let result = find_range::<u32>(&bytes, layout, Endian::Little, KeyField::Whole, 0, 3, 20);
        assert_eq!(result, FindResult { index: 1, first: 1, last: 2 });
    }

    #[test]
    fn subrange_key_matches_bit_field() {
        // Encode chrom in the top 5 bits of a u32 "VariantKey-lite".
        let values: Vec<u32> = vec![1 << 27, 1 << 27 | 5, 2 << 27, 2 << 27 | 9];
        let bytes = column_u32(&values);
        let field = KeyField::SubRange { bitstart: 27, bitend: 31 };
        let result = find_range::<u32>(&bytes, Layout::Column, Endian::Little, field, 0, 3, 2);
        assert_eq!(result, FindResult { index: 2, first: 2, last: 3 });
    }

    #[test]
    fn has_prev_detects_run_start() {
        let bytes = column_u32(&[1, 2, 2, 2, 5]);
        assert!(has_prev::<u32>(&bytes, Layout::Column, Endian::Little, KeyField::Whole, 2, 0, 2));
        assert!(!has_prev::<u32>(&bytes, Layout::Column, Endian::Little, KeyField::Whole, 1, 0, 2));
    }
}
