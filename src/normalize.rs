//! Variant normalization (component K): brings a `(chrom, pos, ref, alt)`
//! call into the canonical left-trimmed, left-extended form described at
//! <https://genome.sph.umich.edu/wiki/Variant_Normalization>, after first
//! reconciling the REF allele against the genome reference (trying a
//! swap, then a strand flip, then both).
//!
//! Grounded on `genoref.h`'s `normalize_variant`, the version that returns
//! a signed status bitmask rather than the older `genoref.c` variant that
//! mutates in place with no status reporting.

use crate::genoref::{flip_allele, GenomeReference, CHECK_WRONGPOS};

/// The REF allele is inconsistent with the genome reference (contains
/// non-ACGT letters matched only via IUPAC ambiguity).
pub const VALID: i32 = 1;
/// REF and ALT were swapped to find a match against the genome reference.
pub const SWAP: i32 = 1 << 1;
/// Both alleles were complemented to find a match against the genome
/// reference (opposite strand).
pub const FLIP: i32 = 1 << 2;
/// Alleles were left-extended by one base at a time to resolve a
/// zero-length allele.
pub const LEXT: i32 = 1 << 3;
/// Alleles were right-trimmed of a shared trailing base.
pub const RTRIM: i32 = 1 << 4;
/// Alleles were left-trimmed of a shared leading base.
pub const LTRIM: i32 = 1 << 5;

/// Position (or position + allele length) falls outside the chromosome.
pub const WRONGPOS: i32 = CHECK_WRONGPOS;
/// Neither REF, ALT, nor either's strand flip matches the genome
/// reference at this position.
pub const INVALID: i32 = -1;

/// Result of [`normalize_variant`]: a non-negative `status` is a bitmask of
/// [`VALID`]/[`SWAP`]/[`FLIP`]/[`LEXT`]/[`RTRIM`]/[`LTRIM`]; a negative
/// `status` ([`WRONGPOS`] or [`INVALID`]) means normalization failed and
/// `pos`/`reference`/`alt` are returned unchanged (aside from uppercasing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub status: i32,
    pub pos: u32,
    pub reference: String,
    pub alt: String,
}

/// Normalize a variant call against `genoref`.
pub fn normalize_variant(
    genoref: &GenomeReference,
    chrom: u8,
    pos: u32,
    reference: &str,
    alt: &str,
) -> Normalized {
    let mut pos = pos;
    let mut reference = reference.to_ascii_uppercase();
    let mut alt = alt.to_ascii_uppercase();

    let mut status = genoref.check_reference(chrom, pos, &reference);
    if status == WRONGPOS {
        return Normalized { status, pos, reference, alt };
    }
    if status < 0 {
        let alt_as_ref_status = genoref.check_reference(chrom, pos, &alt);
        if alt_as_ref_status >= 0 {
            std::mem::swap(&mut reference, &mut alt);
            status = alt_as_ref_status | SWAP;
        } else {
            let fref = flip_allele(&reference);
            let fref_status = genoref.check_reference(chrom, pos, &fref);
            if fref_status >= 0 {
                alt = flip_allele(&alt);
                reference = fref;
                status = fref_status | FLIP;
            } else {
                let falt = flip_allele(&alt);
                let falt_status = genoref.check_reference(chrom, pos, &falt);
                if falt_status >= 0 {
                    reference = falt;
                    alt = fref;
                    status = falt_status | SWAP | FLIP;
                } else {
                    return Normalized { status: falt_status, pos, reference, alt };
                }
            }
        }
    }

    if reference.len() == 1 && alt.len() == 1 {
        return Normalized { status, pos, reference, alt };
    }

    loop {
        if (alt.is_empty() || reference.is_empty()) && pos > 0 {
            pos -= 1;
            if let Some(left) = genoref.get_genoref_seq(chrom, pos) {
                alt.insert(0, left as char);
                reference.insert(0, left as char);
            }
            status |= LEXT;
        } else if alt.len() > 1
            && reference.len() > 1
            && alt.as_bytes()[alt.len() - 1].eq_ignore_ascii_case(&reference.as_bytes()[reference.len() - 1])
        {
            alt.pop();
            reference.pop();
            status |= RTRIM;
        } else {
            break;
        }
    }

    let mut offset = 0usize;
    while offset < alt.len() - 1
        && offset < reference.len() - 1
        && alt.as_bytes()[offset].eq_ignore_ascii_case(&reference.as_bytes()[offset])
    {
        offset += 1;
    }
    if offset > 0 {
        pos += offset as u32;
        reference = reference[offset..].to_string();
        alt = alt[offset..].to_string();
        status |= LTRIM;
    }

    Normalized { status, pos, reference, alt }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_genoref(seqs: &[&[u8]]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut offsets = [0u32; 25];
        let mut running = 0u32;
        for (i, seq) in seqs.iter().enumerate() {
            offsets[i] = running;
            running += seq.len() as u32;
        }
        // Chromosomes past the last one actually written have no sequence of
        // their own; pin their start to the final running total so they read
        // back as empty instead of aliasing whatever followed in memory.
        for off in offsets.iter_mut().skip(seqs.len()) {
            *off = running;
        }
        for off in offsets.iter() {
            file.write_all(&off.to_le_bytes()).unwrap();
        }
        for seq in seqs {
            file.write_all(seq).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn snv_short_circuits() {
        let file = write_genoref(&[b"ACGTACGT"]);
        let genoref = GenomeReference::open(file.path()).unwrap();
        let result = normalize_variant(&genoref, 1, 0, "A", "G");
        assert_eq!(result.status, 0);
        assert_eq!(result.pos, 0);
        assert_eq!(result.reference, "A");
        assert_eq!(result.alt, "G");
    }

    #[test]
    fn right_trim_shared_suffix() {
        // ref genome: A C G T A C G T, call at pos 0 ref="ACG" alt="ATG":
        // shares a trailing 'G' (right-trimmed) and then a leading 'A'
        // (left-trimmed), leaving a minimal ref="C"/alt="T" SNV at pos 1.
        let file = write_genoref(&[b"ACGTACGT"]);
        let genoref = GenomeReference::open(file.path()).unwrap();
        let result = normalize_variant(&genoref, 1, 0, "ACG", "ATG");
        assert_eq!(result.status & RTRIM, RTRIM);
        assert_eq!(result.status & LTRIM, LTRIM);
        assert_eq!(result.pos, 1);
        assert_eq!(result.reference, "C");
        assert_eq!(result.alt, "T");
    }

    #[test]
    fn left_extend_on_deletion() {
        // A deletion of "CG" at pos 1 (ref="CG", alt="") must left-extend
        // using the preceding base until both alleles are non-empty.
        let file = write_genoref(&[b"ACGTACGT"]);
        let genoref = GenomeReference::open(file.path()).unwrap();
        let result = normalize_variant(&genoref, 1, 1, "CG", "");
        assert_eq!(result.status & LEXT, LEXT);
        assert_eq!(result.pos, 0);
        assert_eq!(result.reference, "ACG");
        assert_eq!(result.alt, "A");
    }

    #[test]
    fn swap_when_ref_matches_alt_position() {
        let file = write_genoref(&[b"ACGTACGT"]);
        let genoref = GenomeReference::open(file.path()).unwrap();
        // at pos 0 the genome base is 'A'; passing ref="G" alt="A" should
        // swap so the matching allele becomes REF.
        let result = normalize_variant(&genoref, 1, 0, "G", "A");
        assert_eq!(result.status & SWAP, SWAP);
        assert_eq!(result.reference, "A");
        assert_eq!(result.alt, "G");
    }

    #[test]
    fn invalid_when_nothing_matches() {
        let file = write_genoref(&[b"ACGTACGT"]);
        let genoref = GenomeReference::open(file.path()).unwrap();
        let result = normalize_variant(&genoref, 1, 0, "C", "G");
        assert_eq!(result.status, INVALID);
    }
}
