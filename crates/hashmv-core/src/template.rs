//! Expansion of `%`-directive patterns into concrete paths.
//!
//! The pattern mini-language, bit-exact:
//!
//! - `%%` emits one literal `%`.
//! - `%[-|0][WIDTH]h` / `...H` emits a slice of the digest as lowercase or
//!   uppercase hex. `-` takes the trailing slice instead of the leading one;
//!   `0` is a reserved flag (parsed, currently without effect). WIDTH is a
//!   decimal count of hex characters, 1–99; 0 or absent means the whole
//!   digest. An odd WIDTH includes one half-byte: the extra hex digit comes
//!   from the low nibble of the boundary byte and sits at the end of a
//!   leading slice but at the start of a trailing one.
//! - `%` followed by any other character passes both bytes through verbatim
//!   (uninterpreted format codes are deliberately not an error).
//!
//! Expansion is run twice per placement: once with an all-zero stand-in
//! digest before any data is read, proving the worst-case result fits the
//! destination buffer, and once with the real digest afterwards.

use crate::bounded::BoundedCursor;
use crate::errors::{HashmvError, Result};

/// Directive marker byte.
const MARKER: u8 = b'%';

/// One parsed unit of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// Bytes copied through unchanged.
    Literal(&'a [u8]),
    /// `%%`, or a marker the pattern ends on — one literal `%`.
    Escape,
    /// `%` followed by an unrecognized selector; both bytes pass through.
    /// Any consumed sign, flag or width digits are not replayed.
    Verbatim(u8),
    /// A digest-slice directive.
    Slice(SliceSpec),
}

/// Case, alignment, pad flag and width of a digest-slice directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSpec {
    /// `H` selects uppercase hex, `h` lowercase.
    pub upper: bool,
    /// Take the trailing slice of the digest instead of the leading one.
    pub trailing: bool,
    /// The reserved `0` flag was present.
    pub zero_flag: bool,
    /// Requested width in hex characters; 0 means the whole digest.
    pub width: usize,
}

/// Lazy tokenizer over a pattern.
pub fn directives(pattern: &str) -> Directives<'_> {
    Directives {
        rest: pattern.as_bytes(),
    }
}

pub struct Directives<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Directives<'a> {
    type Item = Directive<'a>;

    fn next(&mut self) -> Option<Directive<'a>> {
        if self.rest.is_empty() {
            return None;
        }
        if self.rest[0] != MARKER {
            let end = self
                .rest
                .iter()
                .position(|&b| b == MARKER)
                .unwrap_or(self.rest.len());
            let (lit, rest) = self.rest.split_at(end);
            self.rest = rest;
            return Some(Directive::Literal(lit));
        }

        let mut i = 1;
        let mut trailing = false;
        let mut zero_flag = false;
        match self.rest.get(i).copied() {
            Some(MARKER) => {
                self.rest = &self.rest[2..];
                return Some(Directive::Escape);
            }
            Some(b'-') => {
                trailing = true;
                i += 1;
            }
            Some(b'0') => {
                zero_flag = true;
                i += 1;
            }
            _ => {}
        }

        let mut width = 0usize;
        if matches!(self.rest.get(i).copied(), Some(b'1'..=b'9')) {
            while width < 100 {
                match self.rest.get(i).copied() {
                    Some(d @ b'0'..=b'9') => {
                        width = width * 10 + usize::from(d - b'0');
                        i += 1;
                    }
                    _ => break,
                }
            }
        }

        let selector = self.rest.get(i).copied();
        self.rest = &self.rest[(i + 1).min(self.rest.len())..];
        match selector {
            Some(b'h') => Some(Directive::Slice(SliceSpec {
                upper: false,
                trailing,
                zero_flag,
                width,
            })),
            Some(b'H') => Some(Directive::Slice(SliceSpec {
                upper: true,
                trailing,
                zero_flag,
                width,
            })),
            Some(other) => Some(Directive::Verbatim(other)),
            // pattern ended inside a directive; the marker stands alone
            None => Some(Directive::Escape),
        }
    }
}

/// Expand `pattern` with `digest` into `out`.
///
/// The first append that would exceed the buffer aborts the whole expansion
/// with [`HashmvError::BufferOverflow`]; a slice directive wider than the
/// digest aborts with [`HashmvError::UnsatisfiableWidth`].
pub fn expand_into(out: &mut BoundedCursor<'_>, pattern: &str, digest: &[u8]) -> Result<()> {
    for directive in directives(pattern) {
        match directive {
            Directive::Literal(lit) => {
                out.put_bytes(lit)?;
            }
            Directive::Escape => {
                out.put_byte(MARKER)?;
            }
            Directive::Verbatim(b) => {
                out.put_byte(MARKER)?;
                out.put_byte(b)?;
            }
            Directive::Slice(spec) => emit_slice(out, spec, digest)?,
        }
    }
    Ok(())
}

/// All-zero stand-in digest for the dry-run expansion. Hex output length
/// depends only on digest length, so the dry run and the real expansion
/// produce results of identical size.
pub fn zero_digest(len: usize) -> Vec<u8> {
    vec![0; len]
}

fn emit_slice(out: &mut BoundedCursor<'_>, spec: SliceSpec, digest: &[u8]) -> Result<()> {
    let pad = spec.width % 2 == 1;
    let byte_width = spec.width / 2 + usize::from(pad);
    let mut start = 0;
    let mut end = digest.len();
    if byte_width > 0 {
        if byte_width > digest.len() {
            return Err(HashmvError::UnsatisfiableWidth {
                width: spec.width,
                digest_len: digest.len(),
            });
        }
        if spec.trailing {
            start = digest.len() - byte_width;
        } else {
            end = byte_width;
        }
    }
    // Odd width: the half-byte digit leads a trailing slice but a leading
    // slice emits whole bytes and drops the final digit.
    if pad && spec.trailing {
        out.put_hex_nibble(digest[start] & 0xf, spec.upper)?;
        start += 1;
    }
    for &b in &digest[start..end] {
        out.put_hex_byte(b, spec.upper)?;
    }
    if pad && !spec.trailing {
        let _ = out.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(pattern: &str, digest: &[u8]) -> Result<String> {
        let mut buf = [0u8; 256];
        let mut cur = BoundedCursor::new(&mut buf);
        expand_into(&mut cur, pattern, digest)?;
        Ok(String::from_utf8(cur.finish().to_vec()).unwrap())
    }

    const DIGEST8: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
    const DIGEST4: [u8; 4] = [0xaa, 0xbb, 0xcc, 0xdd];

    #[test]
    fn literal_and_escape_round_trip() {
        assert_eq!(expand("plain-name.txt", &DIGEST8).unwrap(), "plain-name.txt");
        assert_eq!(expand("100%% done", &DIGEST8).unwrap(), "100% done");
    }

    #[test]
    fn whole_digest_both_cases() {
        assert_eq!(expand("%h", &DIGEST4).unwrap(), "aabbccdd");
        assert_eq!(expand("%H", &DIGEST4).unwrap(), "AABBCCDD");
    }

    #[test]
    fn leading_and_trailing_slices() {
        assert_eq!(expand("%4h", &DIGEST8).unwrap(), "0102");
        assert_eq!(expand("%-4h", &DIGEST8).unwrap(), "0708");
        assert_eq!(expand("%16h", &DIGEST8).unwrap(), "0102030405060708");
    }

    #[test]
    fn combined_slices_scenario() {
        assert_eq!(
            expand("%h-%-8h.txt", &DIGEST8).unwrap(),
            "0102030405060708-05060708.txt"
        );
    }

    // The half-byte digit trails a leading slice and leads a trailing one.
    #[test]
    fn odd_width_boundary_placement() {
        assert_eq!(expand("%3h", &DIGEST4).unwrap(), "aab");
        assert_eq!(expand("%-3h", &DIGEST4).unwrap(), "cdd");
        assert_eq!(expand("%1h", &DIGEST4).unwrap(), "a");
        assert_eq!(expand("%-1h", &DIGEST4).unwrap(), "d");
        assert_eq!(expand("%7H", &DIGEST4).unwrap(), "AABBCCD");
        assert_eq!(expand("%-7H", &DIGEST4).unwrap(), "ABBCCDD");
    }

    // Every width against a hex-string reference: a leading slice of width
    // w is the first w characters of the byte-slice encoding, a trailing
    // slice is the final w characters.
    #[test]
    fn slice_widths_match_reference() {
        let full = hex::encode(DIGEST8);
        for w in 1..=16usize {
            let bytes = w / 2 + w % 2;
            let leading = &hex::encode(&DIGEST8[..bytes])[..w];
            assert_eq!(expand(&format!("%{w}h"), &DIGEST8).unwrap(), leading);
            assert_eq!(leading, &full[..w]);

            let tail_hex = hex::encode(&DIGEST8[8 - bytes..]);
            let trailing = &tail_hex[tail_hex.len() - w..];
            assert_eq!(expand(&format!("%-{w}h"), &DIGEST8).unwrap(), trailing);
            assert_eq!(trailing, &full[16 - w..]);
        }
    }

    #[test]
    fn odd_width_trailing_takes_low_nibble() {
        // trailing %-3h covers bytes [2, 4); the half-byte digit is the low
        // nibble of byte 2 (0xcc -> 'c'), emitted first
        assert_eq!(expand("%-3h", &[0xaa, 0xbb, 0x1c, 0xdd]).unwrap(), "cdd");
    }

    #[test]
    fn width_past_digest_is_unsatisfiable() {
        assert!(matches!(
            expand("%9h", &DIGEST4),
            Err(HashmvError::UnsatisfiableWidth {
                width: 9,
                digest_len: 4
            })
        ));
        assert!(matches!(
            expand("%17h", &DIGEST8),
            Err(HashmvError::UnsatisfiableWidth { .. })
        ));
        // exactly 2 * len is fine
        assert_eq!(expand("%8h", &DIGEST4).unwrap(), "aabbccdd");
    }

    #[test]
    fn unrecognized_directives_pass_through() {
        assert_eq!(expand("%x", &DIGEST4).unwrap(), "%x");
        assert_eq!(expand("a%sb", &DIGEST4).unwrap(), "a%sb");
        // consumed sign and width digits are not replayed
        assert_eq!(expand("%-5x", &DIGEST4).unwrap(), "%x");
        assert_eq!(expand("%07q", &DIGEST4).unwrap(), "%q");
    }

    #[test]
    fn zero_flag_is_reserved() {
        // parsed and accepted, width parity still decides padding
        assert_eq!(expand("%04h", &DIGEST4).unwrap(), "aabb");
        assert_eq!(expand("%03h", &DIGEST4).unwrap(), "aab");
    }

    #[test]
    fn trailing_marker_is_literal() {
        assert_eq!(expand("name.%", &DIGEST4).unwrap(), "name.%");
        assert_eq!(expand("name.%-12", &DIGEST4).unwrap(), "name.%");
    }

    #[test]
    fn dry_run_is_idempotent_and_sized_like_the_real_thing() {
        let zeros = zero_digest(8);
        let a = expand("%h-%-8h.txt", &zeros).unwrap();
        let b = expand("%h-%-8h.txt", &zeros).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), expand("%h-%-8h.txt", &DIGEST8).unwrap().len());
        assert_eq!(a, "0000000000000000-00000000.txt");
    }

    #[test]
    fn overflow_is_reported() {
        let mut buf = [0u8; 8];
        let mut cur = BoundedCursor::new(&mut buf);
        assert!(matches!(
            expand_into(&mut cur, "%h", &DIGEST8),
            Err(HashmvError::BufferOverflow)
        ));
        // a fitting pattern on the same capacity succeeds
        let mut buf = [0u8; 8];
        let mut cur = BoundedCursor::new(&mut buf);
        expand_into(&mut cur, "%6h", &DIGEST8).unwrap();
        assert_eq!(cur.finish(), b"010203");
    }

    #[test]
    fn directive_tokenizer_shapes() {
        let toks: Vec<_> = directives("a%%%-8hb%q").collect();
        assert_eq!(
            toks,
            vec![
                Directive::Literal(b"a"),
                Directive::Escape,
                Directive::Slice(SliceSpec {
                    upper: false,
                    trailing: true,
                    zero_flag: false,
                    width: 8
                }),
                Directive::Literal(b"b"),
                Directive::Verbatim(b'q'),
            ]
        );
    }
}
