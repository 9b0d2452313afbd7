//! Chromosome codec (component B): `"1".."22", "X", "Y", "MT"` (optionally
//! prefixed with a case-insensitive `"chr"`) as a 5-bit code `1..25`, with
//! `0` meaning "not applicable / unparseable".

/// Strip an optional case-insensitive `"chr"` prefix, parse a decimal
/// chromosome number, or recognize `X`/`Y`/`MT`. Returns `0` for anything
/// else. Values outside `1..25` are still returned verbatim (callers
/// composing a VariantKey/RegionKey truncate to 5 bits).
pub fn encode_chrom(chrom: &str) -> u8 {
    let s = strip_chr_prefix(chrom);
    if s.is_empty() {
        return 0;
    }
    let bytes = s.as_bytes();
    if bytes[0].is_ascii_digit() {
        if bytes[1..].iter().all(u8::is_ascii_digit) {
            return s.parse::<u32>().map(|v| v as u8).unwrap_or(0);
        }
        return 0;
    }
    match s {
        "X" | "x" => 23,
        "Y" | "y" => 24,
        _ if is_mt(s) => 25,
        _ => 0,
    }
}

fn strip_chr_prefix(s: &str) -> &str {
    if s.len() > 3 && s.as_bytes()[0..3].eq_ignore_ascii_case(b"chr") {
        &s[3..]
    } else {
        s
    }
}

fn is_mt(s: &str) -> bool {
    s.eq_ignore_ascii_case("m") || s.eq_ignore_ascii_case("mt")
}

/// `1..22` → decimal string; `23` → `"X"`; `24` → `"Y"`; `25` → `"MT"`;
/// anything else → `"NA"`.
pub fn decode_chrom(code: u8) -> String {
    match code {
        1..=22 => code.to_string(),
        23 => "X".to_string(),
        24 => "Y".to_string(),
        25 => "MT".to_string(),
        _ => "NA".to_string(),
    }
}
