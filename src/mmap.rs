//! Memory-mapped file layer (component G): open a file, map it read-only,
//! and dispatch on its magic bytes to one of three container formats
//! (native `BINSRC1`, Apache Arrow File, Feather v1), or fall back to a
//! flat blob whose column layout the caller supplies.
//!
//! Grounded on `memmap2::Mmap`, the crate the teacher's own sources use for
//! mmap (e.g. `src/sv/query/bgdbs.rs`'s `unsafe { Mmap::map(&file)? }`),
//! rather than a hand-rolled `libc::mmap` call.

use std::fs::File;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use memmap2::Mmap;

use crate::error::{Result, VariantKeyError};

const MAGIC_BINSRC1: &[u8; 8] = b"BINSRC1\0";
const MAGIC_ARROW1: &[u8; 6] = b"ARROW1";
const MAGIC_FEA1: &[u8; 4] = b"FEA1";
const MIN_DISPATCHABLE_LEN: usize = 28;

/// Which of the recognized container formats a [`BinaryTable`] was parsed
/// as. `Raw` means the magic bytes were not recognized; the caller must
/// call [`BinaryTable::with_columns`] before using column accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    BinSrc1,
    Arrow,
    Feather,
    Raw,
}

/// A memory-mapped, pre-sorted columnar binary table. Borrowed immutably
/// for the lifetime of the handle; the underlying `Mmap`'s `Drop` impl
/// performs the unmap, so there is no manual `munmap_binfile` step to
/// forget on any exit path.
pub struct BinaryTable {
    mmap: Mmap,
    pub container: Container,
    pub doffset: u64,
    pub dlength: u64,
    pub nrows: u64,
    pub ctbytes: Vec<u8>,
    pub index: Vec<u64>,
}

impl BinaryTable {
    /// Open and map `path`, dispatching on its first 8 bytes.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| VariantKeyError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| VariantKeyError::Mmap {
            path: path.to_path_buf(),
            source,
        })?;

        if mmap.len() < MIN_DISPATCHABLE_LEN {
            tracing::trace!(len = mmap.len(), "file too short to dispatch, leaving raw");
            return Ok(Self {
                mmap,
                container: Container::Raw,
                doffset: 0,
                dlength: 0,
                nrows: 0,
                ctbytes: Vec::new(),
                index: Vec::new(),
            });
        }

        let magic = &mmap[0..8];
        let table = if magic == MAGIC_BINSRC1 {
            tracing::trace!("dispatching as BINSRC1");
            parse_binsrc1(&mmap, path)?
        } else if &magic[0..6] == MAGIC_ARROW1 {
            tracing::trace!("dispatching as Arrow File");
            parse_arrow(&mmap)
        } else if &magic[0..4] == MAGIC_FEA1 {
            tracing::trace!("dispatching as Feather v1");
            parse_feather(&mmap)
        } else {
            tracing::trace!("unrecognized magic, leaving as raw blob");
            RawInfo { container: Container::Raw, doffset: 0, dlength: mmap.len() as u64 }
        };

        let mut table = Self {
            mmap,
            container: table.container,
            doffset: table.doffset,
            dlength: table.dlength,
            nrows: 0,
            ctbytes: Vec::new(),
            index: Vec::new(),
        };
        if table.container == Container::BinSrc1 {
            // `parse_binsrc1` already produced the column layout; re-derive it
            // here since `RawInfo` only carries doffset/dlength.
            finish_binsrc1(&mut table, path)?;
        }
        Ok(table)
    }

    /// For a [`Container::Raw`] table, supply the per-column byte widths
    /// manually and compute column offsets assuming rows packed
    /// contiguously per column with 8-byte padding between columns.
    pub fn with_columns(mut self, ctbytes: &[u8]) -> Self {
        self.ctbytes = ctbytes.to_vec();
        let total_width: u64 = ctbytes.iter().map(|&w| w as u64).sum();
        if total_width == 0 {
            return self;
        }
        self.nrows = self.dlength / total_width;
        let mut index = vec![0u64; ctbytes.len()];
        index[0] = self.doffset;
        for i in 1..ctbytes.len() {
            let b = self.nrows * ctbytes[i - 1] as u64;
            index[i] = index[i - 1] + b + pad8(b);
        }
        self.index = index;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// The bytes of column `i`, `nrows * ctbytes[i]` long.
    pub fn column(&self, i: usize) -> &[u8] {
        let start = self.index[i] as usize;
        let len = self.nrows as usize * self.ctbytes[i] as usize;
        &self.mmap[start..start + len]
    }
}

struct RawInfo {
    container: Container,
    doffset: u64,
    dlength: u64,
}

fn pad8(b: u64) -> u64 {
    (8 - (b & 7)) & 7
}

fn parse_binsrc1(mmap: &Mmap, path: &Path) -> Result<RawInfo> {
    let ncols = mmap[8] as usize;
    let doffset = 9 + ncols as u64 + pad8((ncols + 1) as u64);
    let header_end = doffset as usize + 8 + ncols * 8;
    if mmap.len() < header_end {
        return Err(VariantKeyError::Truncated {
            path: path.to_path_buf(),
            len: mmap.len(),
        });
    }
    let dlength = mmap.len() as u64 - doffset - 8 - (ncols as u64 * 8);
    Ok(RawInfo { container: Container::BinSrc1, doffset, dlength })
}

fn finish_binsrc1(table: &mut BinaryTable, path: &Path) -> Result<()> {
    let src = &table.mmap;
    let ncols = src[8] as usize;
    let header_start = (9 + ncols) + pad8((ncols + 1) as u64) as usize;
    if src.len() < header_start + 8 {
        return Err(VariantKeyError::MalformedContainer {
            path: path.to_path_buf(),
            reason: "BINSRC1 header truncated before row count".into(),
        });
    }
    let nrows = LittleEndian::read_u64(&src[header_start..header_start + 8]);
    let mut ctbytes = Vec::with_capacity(ncols);
    let mut index = Vec::with_capacity(ncols);
    for i in 0..ncols {
        ctbytes.push(src[9 + i]);
        let off = header_start + 8 + i * 8;
        index.push(LittleEndian::read_u64(&src[off..off + 8]));
    }
    table.nrows = nrows;
    table.ctbytes = ctbytes;
    table.index = index;
    table.doffset = (header_start + 8 + ncols * 8) as u64;
    table.dlength = src.len() as u64 - table.doffset;
    Ok(())
}

fn parse_arrow(mmap: &Mmap) -> RawInfo {
    let metadata_len = LittleEndian::read_u32(&mmap[9..13]) as u64;
    let mut doffset = metadata_len + 13;
    let dict_len = LittleEndian::read_u32(&mmap[doffset as usize..doffset as usize + 4]) as u64;
    doffset += dict_len + 4;
    let mut dlength = mmap.len() as u64 - doffset;
    let trailer_magic = &mmap[mmap.len() - 8..mmap.len() - 2];
    if trailer_magic == MAGIC_ARROW1 {
        let footer_len = LittleEndian::read_u32(&mmap[mmap.len() - 10..mmap.len() - 6]) as u64;
        dlength -= footer_len + 10;
    }
    RawInfo { container: Container::Arrow, doffset, dlength }
}

fn parse_feather(mmap: &Mmap) -> RawInfo {
    let doffset = 8u64;
    let mut dlength = mmap.len() as u64 - doffset;
    let trailer_magic = LittleEndian::read_u32(&mmap[mmap.len() - 4..]);
    if trailer_magic == u32::from_le_bytes(*MAGIC_FEA1) {
        let metadata_len = LittleEndian::read_u32(&mmap[mmap.len() - 8..mmap.len() - 4]) as u64;
        dlength -= metadata_len + 8;
    }
    RawInfo { container: Container::Feather, doffset, dlength }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_binsrc1(rows: &[(u32, u64)]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MAGIC_BINSRC1).unwrap();
        file.write_all(&[2u8]).unwrap(); // ncols
        file.write_all(&[4u8, 8u8]).unwrap(); // ctbytes
        let pad = pad8(3) as usize; // 9 + ncols(2) + 1 = 12, padded to 8k... computed below
        file.write_all(&vec![0u8; pad]).unwrap();
        let nrows = rows.len() as u64;
        file.write_all(&nrows.to_le_bytes()).unwrap();
        // column offsets are relative to the whole file and filled in after
        // we know where the data starts.
        let header_len = file.as_file().metadata().unwrap().len() as u64 + 16;
        let col0_offset = header_len;
        let col1_offset = col0_offset + nrows * 4 + pad8(nrows * 4);
        file.write_all(&col0_offset.to_le_bytes()).unwrap();
        file.write_all(&col1_offset.to_le_bytes()).unwrap();
        for (rsid, _) in rows {
            file.write_all(&rsid.to_le_bytes()).unwrap();
        }
        file.write_all(&vec![0u8; pad8(nrows * 4) as usize]).unwrap();
        for (_, vk) in rows {
            file.write_all(&vk.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn binsrc1_roundtrip() {
        let rows = [(1u32, 10u64), (2, 20), (3, 30)];
        let file = write_binsrc1(&rows);
        let table = BinaryTable::open(file.path()).unwrap();
        assert_eq!(table.container, Container::BinSrc1);
        assert_eq!(table.nrows, 3);
        assert_eq!(table.ctbytes, vec![4, 8]);
        let col0 = table.column(0);
        assert_eq!(LittleEndian::read_u32(&col0[0..4]), 1);
        assert_eq!(LittleEndian::read_u32(&col0[4..8]), 2);
        let col1 = table.column(1);
        assert_eq!(LittleEndian::read_u64(&col1[0..8]), 10);
    }

    #[test]
    fn raw_blob_with_manual_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"NOTAKNOWNMAGIC..").unwrap();
        let nrows = 4u64;
        for i in 0..nrows {
            file.write_all(&(i as u32).to_le_bytes()).unwrap();
        }
        file.write_all(&vec![0u8; pad8(nrows * 4) as usize]).unwrap();
        file.flush().unwrap();
        let table = BinaryTable::open(file.path()).unwrap().with_columns(&[4]);
        assert_eq!(table.container, Container::Raw);
        assert_eq!(table.nrows, nrows);
    }
}
