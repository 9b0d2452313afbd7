//! Lookup tables (component I): rsID <-> VariantKey tables and the
//! VariantKey -> REF/ALT payload table, built on the memory-mapped binary
//! layer (component G) and the generic sorted-block search (component H).
//!
//! Grounded on `rsidvar.h`/`rsidvar.c` (rsvk.bin/vkrs.bin) and
//! `nrvk.h`/`nrvk.c` (nrvk.bin). The reference tooling produces rsvk.bin
//! and vkrs.bin as flat 12-byte row-interleaved blocks, but the
//! column-oriented `rsidvar_cols_t` API in the same source tree reads the
//! identical data through `BINSRC1`'s two-column layout — so both tables
//! here detect which container they were handed and search accordingly,
//! per the two `Layout` variants in component H.
//!
//! Where the C API signals "not found" with a zero sentinel (rsID 0,
//! VariantKey 0 are themselves valid-looking values), this crate returns
//! `Option` instead, following the "prefer a sum type over a sentinel"
//! guidance for every lookup surface.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};

use crate::bits::{format_hex, Endian};
use crate::error::Result;
use crate::mmap::{BinaryTable, Container};
use crate::refalt::{decode_refalt, RefAlt};
use crate::regionkey::encode_regionkey;
use crate::search::{find_first, find_last, has_next, has_prev, KeyField, Layout};
use crate::variantkey::decode_variantkey;

const ROW_BLKLEN: usize = 12;

fn row_or_column(table: &BinaryTable) -> bool {
    table.container == Container::BinSrc1
}

/// rsID -> VariantKey table (`rsvk.bin`).
pub struct RsvkTable {
    table: BinaryTable,
    nrows: u64,
}

impl RsvkTable {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let table = BinaryTable::open(path)?;
        let nrows = if row_or_column(&table) {
            table.nrows
        } else {
            table.bytes().len() as u64 / ROW_BLKLEN as u64
        };
        Ok(Self { table, nrows })
    }

    /// Number of rows in the table.
    pub fn nrows(&self) -> u64 {
        self.nrows
    }

    fn last_index(&self) -> u64 {
        self.nrows.saturating_sub(1)
    }

    fn vk_at(&self, i: u64) -> u64 {
        if row_or_column(&self.table) {
            let col = self.table.column(1);
            LittleEndian::read_u64(&col[i as usize * 8..i as usize * 8 + 8])
        } else {
            let bytes = self.table.bytes();
            let off = i as usize * ROW_BLKLEN + 4;
            LittleEndian::read_u64(&bytes[off..off + 8])
        }
    }

    fn rsid_find(&self, first: u64, last: u64, rsid: u32) -> u64 {
        if row_or_column(&self.table) {
            find_first::<u32>(
                self.table.column(0),
                Layout::Column,
                Endian::Little,
                KeyField::Whole,
                first,
                last,
                rsid as u64,
            )
        } else {
            find_first::<u32>(
                self.table.bytes(),
                Layout::Row { blklen: ROW_BLKLEN, blkpos: 0 },
                Endian::Little,
                KeyField::Whole,
                first,
                last,
                rsid as u64,
            )
        }
    }

    fn rsid_has_next(&self, pos: u64, last: u64, rsid: u32) -> bool {
        if row_or_column(&self.table) {
            has_next::<u32>(
                self.table.column(0),
                Layout::Column,
                Endian::Little,
                KeyField::Whole,
                pos,
                last,
                rsid as u64,
            )
        } else {
            has_next::<u32>(
                self.table.bytes(),
                Layout::Row { blklen: ROW_BLKLEN, blkpos: 0 },
                Endian::Little,
                KeyField::Whole,
                pos,
                last,
                rsid as u64,
            )
        }
    }

    /// First VariantKey associated with `rsid`, searching rows
    /// `[first, last_index()]`. Returns the VariantKey and the row index it
    /// was found at (pass that index to [`Self::next_variantkey_by_rsid`]
    /// to iterate further matches).
    pub fn find_variantkey_by_rsid(&self, first: u64, rsid: u32) -> Option<(u64, u64)> {
        if self.nrows == 0 {
            return None;
        }
        let last = self.last_index();
        let found = self.rsid_find(first, last, rsid);
        if found > last {
            return None;
        }
        Some((self.vk_at(found), found))
    }

    /// The next VariantKey for `rsid` after row `pos`, if any.
    pub fn next_variantkey_by_rsid(&self, pos: u64, rsid: u32) -> Option<u64> {
        if self.nrows == 0 {
            return None;
        }
        let last = self.last_index();
        if self.rsid_has_next(pos, last, rsid) {
            Some(self.vk_at(pos + 1))
        } else {
            None
        }
    }
}

/// VariantKey -> rsID table (`vkrs.bin`).
pub struct VkrsTable {
    table: BinaryTable,
    nrows: u64,
}

impl VkrsTable {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let table = BinaryTable::open(path)?;
        let nrows = if row_or_column(&table) {
            table.nrows
        } else {
            table.bytes().len() as u64 / ROW_BLKLEN as u64
        };
        Ok(Self { table, nrows })
    }

    pub fn nrows(&self) -> u64 {
        self.nrows
    }

    fn last_index(&self) -> u64 {
        self.nrows.saturating_sub(1)
    }

    fn rsid_at(&self, i: u64) -> u32 {
        if row_or_column(&self.table) {
            let col = self.table.column(1);
            LittleEndian::read_u32(&col[i as usize * 4..i as usize * 4 + 4])
        } else {
            let bytes = self.table.bytes();
            let off = i as usize * ROW_BLKLEN + 8;
            LittleEndian::read_u32(&bytes[off..off + 4])
        }
    }

    fn vk_bytes_and_layout(&self) -> (&[u8], Layout) {
        if row_or_column(&self.table) {
            (self.table.column(0), Layout::Column)
        } else {
            (self.table.bytes(), Layout::Row { blklen: ROW_BLKLEN, blkpos: 0 })
        }
    }

    /// rsID for `vk`, searching rows `[first, last_index()]`.
    pub fn find_rsid_by_variantkey(&self, first: u64, vk: u64) -> Option<(u32, u64)> {
        if self.nrows == 0 {
            return None;
        }
        let last = self.last_index();
        let (bytes, layout) = self.vk_bytes_and_layout();
        let found = find_first::<u64>(bytes, layout, Endian::Little, KeyField::Whole, first, last, vk);
        if found > last {
            return None;
        }
        Some((self.rsid_at(found), found))
    }

    /// First rsID whose VariantKey falls in `(chrom, [pos_min, pos_max])`,
    /// searching rows `[first, last]`. Returns the rsID plus the row range
    /// `[first_match, last_match]` bracketing every VariantKey in range.
    pub fn find_rsid_by_chrompos_range(
        &self,
        first: u64,
        last: u64,
        chrom: u8,
        pos_min: u32,
        pos_max: u32,
    ) -> Option<(u32, u64, u64)> {
        if self.nrows == 0 || first > last {
            return None;
        }
        let field = KeyField::SubRange { bitstart: 31, bitend: 63 };
        let ckey = (chrom as u64) << 59;
        let min_key = (ckey | ((pos_min as u64) << 31)) >> 31;
        let max_key = (ckey | ((pos_max as u64) << 31)) >> 31;
        let (bytes, layout) = self.vk_bytes_and_layout();

        let first_match = find_first::<u64>(bytes, layout, Endian::Little, field, first, last, min_key);
        if first_match > last {
            return None;
        }
        let last_match = find_last::<u64>(bytes, layout, Endian::Little, field, first_match, last, max_key);
        let last_match = if last_match > last { last } else { last_match };
        Some((self.rsid_at(first_match), first_match, last_match))
    }

    /// `true` if the row before `pos` also matches `vk` — mirrors
    /// `has_prev` for callers walking a VariantKey's rsID duplicates
    /// backward.
    pub fn has_prev_variantkey(&self, pos: u64, first: u64, vk: u64) -> bool {
        let (bytes, layout) = self.vk_bytes_and_layout();
        has_prev::<u64>(bytes, layout, Endian::Little, KeyField::Whole, pos, first, vk)
    }
}

/// VariantKey -> REF/ALT payload table (`nrvk.bin`): `[VariantKey; nrows]`
/// (u64, sorted), `[offset; nrows]` (u64, into the payload blob), then the
/// payload blob itself (`[len(ref)][len(alt)][ref bytes][alt bytes]...`),
/// terminated by a trailing 4-byte row count.
pub struct NrvkTable {
    mmap_bytes: memmap2::Mmap,
    nrows: u64,
}

impl NrvkTable {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| crate::error::VariantKeyError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|source| crate::error::VariantKeyError::Mmap {
            path: path.to_path_buf(),
            source,
        })?;
        if mmap.len() < 4 {
            return Err(crate::error::VariantKeyError::Truncated { path: path.to_path_buf(), len: mmap.len() });
        }
        let nrows = LittleEndian::read_u32(&mmap[mmap.len() - 4..]) as u64;
        Ok(Self { mmap_bytes: mmap, nrows })
    }

    pub fn nrows(&self) -> u64 {
        self.nrows
    }

    fn vk_col(&self) -> &[u8] {
        &self.mmap_bytes[0..self.nrows as usize * 8]
    }

    fn offset_col(&self) -> &[u8] {
        let start = self.nrows as usize * 8;
        &self.mmap_bytes[start..start + self.nrows as usize * 8]
    }

    fn data(&self) -> &[u8] {
        let start = self.nrows as usize * 16;
        &self.mmap_bytes[start..self.mmap_bytes.len() - 4]
    }

    fn vk_at(&self, i: u64) -> u64 {
        let col = self.vk_col();
        LittleEndian::read_u64(&col[i as usize * 8..i as usize * 8 + 8])
    }

    fn offset_at(&self, i: u64) -> u64 {
        let col = self.offset_col();
        LittleEndian::read_u64(&col[i as usize * 8..i as usize * 8 + 8])
    }

    fn ref_alt_at_row(&self, i: u64) -> RefAlt {
        let data = self.data();
        let off = self.offset_at(i) as usize;
        let sizeref = data[off] as usize;
        let sizealt = data[off + 1] as usize;
        let reference = String::from_utf8_lossy(&data[off + 2..off + 2 + sizeref]).into_owned();
        let alt = String::from_utf8_lossy(&data[off + 2 + sizeref..off + 2 + sizeref + sizealt]).into_owned();
        RefAlt { reference, alt }
    }

    /// REF/ALT for `vk`, consulting the payload table directly (used when
    /// `vk`'s 31-bit refalt field is a hash, not a reversible code).
    pub fn find_ref_alt_by_variantkey(&self, vk: u64) -> Option<RefAlt> {
        if self.nrows == 0 {
            return None;
        }
        let last = self.nrows - 1;
        let found = find_first::<u64>(self.vk_col(), Layout::Column, Endian::Little, KeyField::Whole, 0, last, vk);
        if found > last {
            return None;
        }
        Some(self.ref_alt_at_row(found))
    }

    /// Length of the REF allele for `vk`: extracted directly from the
    /// reversible code's bit layout when possible, otherwise looked up.
    pub fn get_variantkey_ref_length(&self, vk: u64) -> Option<u32> {
        if vk & 1 == 0 {
            let refalt = decode_variantkey(vk).refalt;
            return Some((refalt & 0x7800_0000) >> 27);
        }
        self.find_ref_alt_by_variantkey(vk).map(|ra| ra.reference.len() as u32)
    }

    /// `pos + len(ref)`: the half-open end position implied by `vk`.
    pub fn get_variantkey_endpos(&self, vk: u64) -> Option<u32> {
        let pos = decode_variantkey(vk).pos;
        self.get_variantkey_ref_length(vk).map(|len| pos + len)
    }

    /// Full chrom+REF/ALT resolution of `vk`, falling back to this table
    /// only when the refalt code is a hash.
    pub fn reverse_variantkey(&self, vk: u64) -> ReverseVariantKey {
        let fields = decode_variantkey(vk);
        let chrom = crate::chrom::decode_chrom(fields.chrom);
        let refalt = match decode_refalt(fields.refalt) {
            Some(ra) => Some(ra),
            None => self.find_ref_alt_by_variantkey(vk),
        };
        ReverseVariantKey { chrom, pos: fields.pos, refalt }
    }

    /// Write every `(VariantKey, ref, alt)` row as tab-separated hex/ref/alt
    /// lines, matching `nrvk_bin_to_tsv`.
    pub fn dump_tsv(&self, mut writer: impl Write) -> std::io::Result<()> {
        for i in 0..self.nrows {
            let ra = self.ref_alt_at_row(i);
            writeln!(writer, "{}\t{}\t{}", format_hex(self.vk_at(i)), ra.reference, ra.alt)?;
        }
        Ok(())
    }
}

/// Fully-resolved VariantKey: chromosome name, position, and REF/ALT when
/// resolvable (reversible code, or found in the nrvk table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseVariantKey {
    pub chrom: String,
    pub pos: u32,
    pub refalt: Option<RefAlt>,
}

/// Derive the RegionKey spanned by `vk`'s REF allele: `start = pos`,
/// `end = pos + len(ref)`, `strand = 0`. `None` when the REF length cannot
/// be resolved (hash-mode code absent from `nvc`).
pub fn variantkey_to_regionkey(nvc: &NrvkTable, vk: u64) -> Option<u64> {
    let fields = decode_variantkey(vk);
    let end = nvc.get_variantkey_endpos(vk)?;
    Some(encode_regionkey(fields.chrom, fields.pos, end, 0))
}

/// `true` if `vk`'s implied region (per [`variantkey_to_regionkey`])
/// overlaps `rk`. `None` when `vk`'s REF length cannot be resolved.
pub fn are_overlapping_variantkey_regionkey(nvc: &NrvkTable, vk: u64, rk: u64) -> Option<bool> {
    let region = variantkey_to_regionkey(nvc, vk)?;
    Some(crate::regionkey::are_overlapping_regionkeys(region, rk))
}
