/*
 * The Model is the immutable parameter block shared by the Encoder and the
 * Decoder (SPEC_FULL.md §3). It is built once, either by the Trainer or by
 * parsing a C-header text dump, and never mutated afterwards — callers hold
 * it behind a shared reference (or, for the crate-wide default, behind an
 * Arc, see `default_model`).
 *
 * Table shapes are pinned to the C-header format of SPEC_FULL.md §6, which
 * is the bit-compatibility contract: `successor_ids_by_chr_id_and_chr_id` is
 * square (leading-rank by leading-rank), not leading-rank by successor-rank.
 * A byte's successor *rank* (0..S-1) is only ever produced as the *value*
 * stored in that table; `chars_by_chr_and_successor_id` is the table keyed
 * by that rank.
 */

use crate::pack_scheme::{canonical_schemes, PackScheme, MAX_SUCCESSOR_LEN};
use thiserror::Error;

/// Sentinel for "this byte/rank is not indexed".
pub const INVALID: u8 = 0xFF;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid model configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to parse model header text: {0}")]
    HeaderParseError(String),
}

/// An immutable compression model: the leader/successor lookup tables plus
/// the ordered list of pack schemes they parameterize.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub min_char: u8,
    /// Exclusive upper bound of the indexable byte range (see `char_by_successor_id`).
    pub max_char: u8,
    /// C: number of indexed leading bytes (a power of two, typically 32).
    pub leading_count: usize,
    /// S: number of tracked successor ranks per leader (a power of two, typically 16).
    pub successor_count: usize,
    pub chars_by_id: Vec<u8>,
    pub ids_by_char: [u8; 256],
    /// Row-major [leading_count][leading_count]: `successor_ids[r * leading_count + r']`
    /// is the successor *rank* (0..successor_count-1, or INVALID) of `chars_by_id[r']`
    /// as a successor of `chars_by_id[r]`.
    successor_ids: Vec<u8>,
    /// Row-major [max_char - min_char][successor_count].
    chars_by_successor_id: Vec<u8>,
    pub packs: Vec<PackScheme>,
}

impl Model {
    /// Builds and validates a Model from its raw tables. This is the single
    /// choke point every constructor (trainer, header parser) goes through,
    /// so no caller can observe a Model violating SPEC_FULL.md §3.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_char: u8,
        max_char: u8,
        chars_by_id: Vec<u8>,
        ids_by_char: [u8; 256],
        successor_ids: Vec<u8>,
        chars_by_successor_id: Vec<u8>,
        successor_count: usize,
        packs: Vec<PackScheme>,
    ) -> Result<Self, ModelError> {
        let leading_count = chars_by_id.len();
        let model = Model {
            min_char,
            max_char,
            leading_count,
            successor_count,
            chars_by_id,
            ids_by_char,
            successor_ids,
            chars_by_successor_id,
            packs,
        };
        model.validate()?;
        Ok(model)
    }

    /// Convenience constructor using the canonical pack schemes of §4.1,
    /// trimmed to `encoding_types` entries (1..=3).
    #[allow(clippy::too_many_arguments)]
    pub fn with_canonical_packs(
        min_char: u8,
        max_char: u8,
        chars_by_id: Vec<u8>,
        ids_by_char: [u8; 256],
        successor_ids: Vec<u8>,
        chars_by_successor_id: Vec<u8>,
        successor_count: usize,
        encoding_types: usize,
    ) -> Result<Self, ModelError> {
        let packs = canonical_schemes(encoding_types)?;
        Self::new(
            min_char,
            max_char,
            chars_by_id,
            ids_by_char,
            successor_ids,
            chars_by_successor_id,
            successor_count,
            packs,
        )
    }

    pub fn max_successor_len(&self) -> usize {
        MAX_SUCCESSOR_LEN
    }

    /// The successor rank of leading-rank `other` as a successor of
    /// leading-rank `leader`, or `INVALID` if `other` is not among
    /// `leader`'s top-S successors.
    #[inline]
    pub fn successor_id(&self, leader: u8, other: u8) -> u8 {
        self.successor_ids[leader as usize * self.leading_count + other as usize]
    }

    /// The byte whose successor rank (under predecessor `byte`) is
    /// `successor_id`, or `None` if `byte` is outside the indexed range.
    #[inline]
    pub fn char_by_successor_id(&self, byte: u8, successor_id: u8) -> Option<u8> {
        if byte < self.min_char || byte >= self.max_char {
            return None;
        }
        let row = (byte - self.min_char) as usize;
        let value = self.chars_by_successor_id[row * self.successor_count + successor_id as usize];
        Some(value)
    }

    /// All the invariants from SPEC_FULL.md §3, checked eagerly so every
    /// other Model method can assume they hold.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.min_char > self.max_char {
            return Err(ModelError::InvalidConfiguration(format!(
                "min_char {} is greater than max_char {}",
                self.min_char, self.max_char
            )));
        }
        if !self.leading_count.is_power_of_two() || self.leading_count == 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "leading_count {} is not a positive power of two",
                self.leading_count
            )));
        }
        if !self.successor_count.is_power_of_two() || self.successor_count == 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "successor_count {} is not a positive power of two",
                self.successor_count
            )));
        }
        if self.chars_by_id.len() != self.leading_count {
            return Err(ModelError::InvalidConfiguration(
                "chars_by_id length does not match leading_count".into(),
            ));
        }
        if self.successor_ids.len() != self.leading_count * self.leading_count {
            return Err(ModelError::InvalidConfiguration(
                "successor_ids shape mismatch".into(),
            ));
        }
        let rows = self.max_char as usize - self.min_char as usize;
        if self.chars_by_successor_id.len() != rows * self.successor_count {
            return Err(ModelError::InvalidConfiguration(
                "chars_by_successor_id shape mismatch".into(),
            ));
        }
        if !(1..=3).contains(&self.packs.len()) {
            return Err(ModelError::InvalidConfiguration(format!(
                "packs.len() must be in 1..=3, got {}",
                self.packs.len()
            )));
        }

        for (i, &c) in self.chars_by_id.iter().enumerate() {
            if self.ids_by_char[c as usize] != i as u8 {
                return Err(ModelError::InvalidConfiguration(format!(
                    "ids_by_char[{}] = {} does not invert chars_by_id[{}] = {}",
                    c, self.ids_by_char[c as usize], i, c
                )));
            }
        }

        for (bid, &b) in self.chars_by_id.iter().enumerate() {
            if b < self.min_char || b >= self.max_char {
                continue;
            }
            for (cid, &c) in self.chars_by_id.iter().enumerate() {
                let sid = self.successor_id(bid as u8, cid as u8);
                if sid == INVALID {
                    continue;
                }
                let resolved = self.char_by_successor_id(b, sid).unwrap();
                if resolved != c {
                    return Err(ModelError::InvalidConfiguration(format!(
                        "chars_by_successor_id[{b}][{sid}] = {resolved} does not match successor {c} of leader {b}"
                    )));
                }
            }
        }

        // Pack headers must be mutually distinguishable by leading-ones count.
        let mut seen = std::collections::HashSet::new();
        for p in &self.packs {
            if !seen.insert(p.leading_ones()) {
                return Err(ModelError::InvalidConfiguration(
                    "two pack schemes share the same header prefix".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_model() -> Model {
        let mut ids_by_char = [INVALID; 256];
        ids_by_char[b'a' as usize] = 0;
        ids_by_char[b'b' as usize] = 1;
        let chars_by_id = vec![b'a', b'b'];
        // successor_ids is [2][2]: rows/cols indexed by leading rank.
        let mut successor_ids = vec![INVALID; 2 * 2];
        successor_ids[0 * 2 + 0] = 0; // 'a' is successor-rank 0 of leader 'a'
        successor_ids[0 * 2 + 1] = 1; // 'b' is successor-rank 1 of leader 'a'
        let mut chars_by_successor_id = vec![INVALID; (b'b' - b'a') as usize * 2];
        chars_by_successor_id[0] = b'a';
        chars_by_successor_id[1] = b'b';
        Model::with_canonical_packs(
            b'a',
            b'b',
            chars_by_id,
            ids_by_char,
            successor_ids,
            chars_by_successor_id,
            2,
            1,
        )
        .unwrap()
    }

    #[test]
    fn validates_consistent_tables() {
        trivial_model();
    }

    #[test]
    fn rejects_inverted_range() {
        let err = Model::with_canonical_packs(
            10,
            5,
            vec![b'a'],
            [INVALID; 256],
            vec![INVALID],
            vec![],
            1,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_non_power_of_two_leading_count() {
        let chars_by_id = vec![b'a', b'b', b'c'];
        let mut ids_by_char = [INVALID; 256];
        ids_by_char[b'a' as usize] = 0;
        ids_by_char[b'b' as usize] = 1;
        ids_by_char[b'c' as usize] = 2;
        let err = Model::with_canonical_packs(
            b'a',
            b'c',
            chars_by_id,
            ids_by_char,
            vec![INVALID; 3 * 3],
            vec![INVALID; 2 * 2],
            2,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_mismatched_successor_table_shape() {
        let chars_by_id = vec![b'a', b'b'];
        let mut ids_by_char = [INVALID; 256];
        ids_by_char[b'a' as usize] = 0;
        ids_by_char[b'b' as usize] = 1;
        let err = Model::with_canonical_packs(
            b'a',
            b'b',
            chars_by_id,
            ids_by_char,
            vec![INVALID; 3], // wrong: should be 2*2 = 4
            vec![INVALID; 2],
            2,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfiguration(_)));
    }
}
