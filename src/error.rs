//! Error types for the fallible, I/O-facing parts of the crate.
//!
//! The bit-level codecs (chromosome, REF+ALT, VariantKey, RegionKey, ESID)
//! never return `Result`: they are pure functions that either produce a
//! well-defined code or fall back to a documented sentinel. `VariantKeyError`
//! is reserved for the parts of the crate that touch the filesystem or parse
//! externally-produced binary containers.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the memory-mapped file layer, lookup tables, and
/// genome reference reader.
#[derive(Error, Debug)]
pub enum VariantKeyError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory-map {path}: {source}")]
    Mmap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is too short to contain a valid header ({len} bytes)")]
    Truncated { path: PathBuf, len: usize },

    #[error("{path} has an unrecognized container magic")]
    UnexpectedMagic { path: PathBuf },

    #[error("{path} declares a malformed BINSRC1 header: {reason}")]
    MalformedContainer { path: PathBuf, reason: String },

    #[error("position {pos} is out of range for chromosome {chrom} (length {len})")]
    OutOfRange { chrom: u8, pos: u32, len: u32 },
}

pub type Result<T> = std::result::Result<T, VariantKeyError>;
