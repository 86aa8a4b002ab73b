/*
 * Bit-unpacking decoder (SPEC_FULL.md §4.3). Unlike the encoder this path is
 * attacker-facing: it never trusts the input length and rejects malformed
 * headers instead of reading past the end of the buffer (the historical
 * CVE-2017-11367 out-of-bounds read this guards against is the reason
 * `decode_header` treats any mark >= packs.len() as `InvalidHeader` rather
 * than indexing `packs` with it).
 */

use crate::model::Model;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid pack header byte 0x{byte:02x}")]
    InvalidHeader { byte: u8 },
    #[error("truncated input: needed {needed} more byte(s), {available} available")]
    Truncated { needed: usize, available: usize },
}

/// Number of leading one-bits in `byte`, interpreted as a pack-scheme mark:
/// -1 for literal (MSB clear), 0/1/2 for a pack index, >=3 for malformed.
fn decode_header(byte: u8) -> i32 {
    (!byte).leading_zeros() as i32 - 1
}

/// Decodes a full `input` buffer produced by `encode`, appending the
/// reconstructed bytes to `out`.
pub fn decode(model: &Model, input: &[u8], out: &mut Vec<u8>) -> Result<(), DecodeError> {
    let mut p = 0usize;
    while p < input.len() {
        let h = input[p];
        let mark = decode_header(h);

        if mark == -1 {
            if h == 0x00 {
                p += 1;
                if p >= input.len() {
                    log::debug!("decode: truncated literal escape at end of input");
                    return Err(DecodeError::Truncated {
                        needed: 1,
                        available: 0,
                    });
                }
                out.push(input[p]);
                p += 1;
            } else {
                out.push(h);
                p += 1;
            }
            continue;
        }

        if mark < 0 || mark as usize >= model.packs.len() {
            log::debug!("decode: rejecting header byte 0x{h:02x} (mark {mark})");
            return Err(DecodeError::InvalidHeader { byte: h });
        }

        let scheme = &model.packs[mark as usize];
        let bytes_packed = scheme.bytes_packed();
        if p + bytes_packed > input.len() {
            log::debug!(
                "decode: truncated pack code word at offset {p}, need {bytes_packed} bytes, have {}",
                input.len() - p
            );
            return Err(DecodeError::Truncated {
                needed: bytes_packed,
                available: input.len() - p,
            });
        }

        let mut word_bytes = [0u8; 4];
        word_bytes[..bytes_packed].copy_from_slice(&input[p..p + bytes_packed]);
        let word = u32::from_be_bytes(word_bytes);

        let bu = scheme.bytes_unpacked();
        let lead_id = ((word >> scheme.offsets[0]) & scheme.masks[0]) as usize;
        let mut last = model.chars_by_id[lead_id];
        out.push(last);

        for i in 1..bu {
            let sid = ((word >> scheme.offsets[i]) & scheme.masks[i]) as u8;
            let b = model
                .char_by_successor_id(last, sid)
                .unwrap_or(crate::model::INVALID);
            out.push(b);
            last = b;
        }

        p += bytes_packed;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_model::default_model;
    use crate::encoder::encode;

    #[test]
    fn decode_header_partitions_correctly() {
        assert_eq!(decode_header(0x00), -1);
        assert_eq!(decode_header(0x7F), -1);
        assert_eq!(decode_header(0x80), 0);
        assert_eq!(decode_header(0xBF), 0);
        assert_eq!(decode_header(0xC0), 1);
        assert_eq!(decode_header(0xDF), 1);
        assert_eq!(decode_header(0xE0), 2);
        assert_eq!(decode_header(0xEF), 2);
        assert_eq!(decode_header(0xF0), 3);
        assert_eq!(decode_header(0xFE), 6);
    }

    #[test]
    fn rejects_invalid_header_without_reading_past_end() {
        let model = default_model();
        let mut out = Vec::new();
        let err = decode(&model, &[0xFE, 0x00, 0x00], &mut out).unwrap_err();
        assert_eq!(err, DecodeError::InvalidHeader { byte: 0xFE });
    }

    #[test]
    fn rejects_truncated_pack_code_word() {
        let model = default_model();
        let mut out = Vec::new();
        // 0xC0 is a pack-1 header (2 bytes packed), only 1 byte supplied.
        let err = decode(&model, &[0xC0], &mut out).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn rejects_truncated_escape_literal() {
        let model = default_model();
        let mut out = Vec::new();
        let err = decode(&model, &[0x00], &mut out).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                needed: 1,
                available: 0
            }
        );
    }

    #[test]
    fn round_trips_through_default_model() {
        let model = default_model();
        for text in [
            "",
            "a",
            "This is a test.",
            "the quick brown fox jumps over the lazy dog",
        ] {
            let mut encoded = Vec::new();
            encode(&model, text.as_bytes(), &mut encoded);
            let mut decoded = Vec::new();
            decode(&model, &encoded, &mut decoded).unwrap();
            assert_eq!(decoded, text.as_bytes());
        }
    }
}
