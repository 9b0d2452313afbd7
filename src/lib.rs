//! VariantKey: encode, decode, and search genetic variants as sortable
//! 64-bit keys.
//!
//! The crate is organized the way the original C library was: a handful of
//! pure bit-packing codecs (chromosome, REF+ALT, VariantKey, RegionKey,
//! ESID), a memory-mapped binary container reader, a generic sorted-block
//! binary search, lookup tables built on top of that search, and a genome
//! reference reader plus variant normalizer that consult it.

pub mod bits;
pub mod chrom;
pub mod error;
pub mod esid;
pub mod genoref;
pub mod hash;
pub mod lookup;
pub mod mmap;
pub mod normalize;
pub mod refalt;
pub mod regionkey;
pub mod search;
pub mod variantkey;
