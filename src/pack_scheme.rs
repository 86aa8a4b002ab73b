/*
 * A PackScheme is a fixed layout describing how many original bytes get
 * folded into one big-endian code word, and where each index lands inside
 * that word.
 *
 * Construction takes a vector of bit widths `[header_width, field_width...]`
 * (see SPEC_FULL.md §4.4) and derives everything else: the packed byte
 * count, the per-field offsets (right-aligned against a 32-bit word) and
 * masks, and the header byte that lets the decoder tell this scheme apart
 * from its siblings by a simple leading-ones count (§4.1).
 */

use crate::ModelError;

/// Maximum number of successor bytes a single code word can ever carry.
/// Fixed for wire compatibility with the reference implementation.
pub const MAX_SUCCESSOR_LEN: usize = 7;

/// Largest field-width vector a scheme can be built from: one header slot
/// plus up to MAX_SUCCESSOR_LEN + 1 (leading byte + successors) fields.
pub const MAX_CONSECUTIVES: usize = MAX_SUCCESSOR_LEN + 2;

const_assert!(MAX_CONSECUTIVES == 9);

/// Maximum `bytes_unpacked` any scheme in this crate can have.
pub const MAX_BYTES_UNPACKED: usize = MAX_SUCCESSOR_LEN + 1;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackScheme {
    pub header: u8,
    /// Mask applied to the first byte before comparing against `header`;
    /// kept alongside `header` for C-header round-tripping (SPEC_FULL.md §6),
    /// even though the codec itself dispatches via `leading_ones()`.
    pub header_mask: u8,
    pub bytes_packed: u8,
    pub bytes_unpacked: u8,
    pub offsets: Vec<u32>,
    pub masks: Vec<u32>,
}

impl PackScheme {
    /// Builds a scheme from a bit-width vector: `widths[0]` is the header
    /// width, `widths[1..]` are the field widths (leading-byte index first,
    /// successor ranks after). See SPEC_FULL.md §4.4.
    pub fn from_widths(widths: &[u32]) -> Result<Self, ModelError> {
        if widths.len() < 2 {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack scheme needs a header width and at least one field width, got {widths:?}"
            )));
        }
        if widths.len() - 1 > MAX_BYTES_UNPACKED {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack scheme has {} fields, more than MAX_SUCCESSOR_LEN+1 = {}",
                widths.len() - 1,
                MAX_BYTES_UNPACKED
            )));
        }

        let header_width = widths[0];
        let field_widths = &widths[1..];

        let total_bits: u32 = widths.iter().sum();
        if total_bits % 8 != 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack scheme widths {widths:?} sum to {total_bits} bits, not a whole number of bytes"
            )));
        }
        let bytes_packed = total_bits / 8;
        if ![1, 2, 4].contains(&bytes_packed) {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack scheme bytes_packed must be 1, 2 or 4, got {bytes_packed}"
            )));
        }

        let bytes_unpacked = field_widths.len() as u32;

        let mut masks = Vec::with_capacity(field_widths.len());
        let mut offsets = Vec::with_capacity(field_widths.len());
        let mut consumed = header_width;
        for &w in field_widths {
            consumed += w;
            masks.push((1u32 << w) - 1);
            offsets.push(32 - consumed);
        }

        if header_width == 0 || header_width > 7 {
            return Err(ModelError::InvalidConfiguration(format!(
                "pack scheme header width must be in 1..=7, got {header_width}"
            )));
        }
        let header = (((1u32 << header_width) - 2) << (8 - header_width)) as u8;
        let header_mask = (((1u32 << header_width) - 1) << (8 - header_width)) as u8;

        Ok(PackScheme {
            header,
            header_mask,
            bytes_packed: bytes_packed as u8,
            bytes_unpacked: bytes_unpacked as u8,
            offsets,
            masks,
        })
    }

    /// Number of leading one-bits in this scheme's header prefix, i.e. the
    /// `mark` value DecodeHeader returns for it (SPEC_FULL.md §4.1).
    pub fn leading_ones(&self) -> u32 {
        (!self.header).leading_zeros()
    }

    #[inline]
    pub fn bytes_unpacked(&self) -> usize {
        self.bytes_unpacked as usize
    }

    #[inline]
    pub fn bytes_packed(&self) -> usize {
        self.bytes_packed as usize
    }
}

/// The three canonical pack schemes used when the trainer is not asked to
/// search for better ones (SPEC_FULL.md §4.1).
pub fn canonical_schemes(count: usize) -> Result<Vec<PackScheme>, ModelError> {
    if !(1..=3).contains(&count) {
        return Err(ModelError::InvalidConfiguration(format!(
            "encoding_types must be in 1..=3, got {count}"
        )));
    }
    let all = [
        PackScheme::from_widths(&[2, 4, 2])?,
        PackScheme::from_widths(&[3, 4, 3, 3, 3])?,
        PackScheme::from_widths(&[4, 5, 4, 4, 4, 3, 3, 3, 2])?,
    ];
    Ok(all[..count].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack0_matches_reference_layout() {
        let p = PackScheme::from_widths(&[2, 4, 2]).unwrap();
        assert_eq!(p.header, 0x80);
        assert_eq!(p.header_mask, 0xC0);
        assert_eq!(p.bytes_packed, 1);
        assert_eq!(p.bytes_unpacked, 2);
        assert_eq!(p.masks, vec![0xF, 0x3]);
        assert_eq!(p.offsets, vec![2, 0]);
        assert_eq!(p.leading_ones(), 1);
    }

    #[test]
    fn pack1_matches_reference_layout() {
        let p = PackScheme::from_widths(&[3, 4, 3, 3, 3]).unwrap();
        assert_eq!(p.header, 0xC0);
        assert_eq!(p.bytes_packed, 2);
        assert_eq!(p.bytes_unpacked, 4);
        assert_eq!(p.masks, vec![0xF, 0x7, 0x7, 0x7]);
        assert_eq!(p.offsets, vec![9, 6, 3, 0]);
        assert_eq!(p.leading_ones(), 2);
    }

    #[test]
    fn pack2_matches_reference_layout() {
        let p = PackScheme::from_widths(&[4, 5, 4, 4, 4, 3, 3, 3, 2]).unwrap();
        assert_eq!(p.header, 0xE0);
        assert_eq!(p.bytes_packed, 4);
        assert_eq!(p.bytes_unpacked, 8);
        assert_eq!(p.leading_ones(), 3);
    }

    #[test]
    fn rejects_non_byte_aligned_widths() {
        let err = PackScheme::from_widths(&[2, 4, 1]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn canonical_schemes_trims_to_count() {
        assert_eq!(canonical_schemes(1).unwrap().len(), 1);
        assert_eq!(canonical_schemes(2).unwrap().len(), 2);
        assert_eq!(canonical_schemes(3).unwrap().len(), 3);
        assert!(canonical_schemes(0).is_err());
        assert!(canonical_schemes(4).is_err());
    }
}
