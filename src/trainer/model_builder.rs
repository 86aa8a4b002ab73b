/*
 * ModelBuilder turns ranked bigram counts into a Model (SPEC_FULL.md §4.6),
 * and optionally searches for better pack schemes than the canonical ones
 * (§4.7). This is the biggest single piece of the trainer, matching the
 * ~25% share the spec assigns it.
 */

use crate::model::{Model, ModelError, INVALID};
use crate::pack_scheme::{canonical_schemes, PackScheme, MAX_BYTES_UNPACKED};
use crate::trainer::bigram_counter::BigramCounter;
use crate::trainer::corpus_reader::{segments, InputOptions};

#[derive(Clone, Debug)]
pub struct TrainOptions {
    pub input_options: InputOptions,
    /// log2(C): number of indexed leading bytes.
    pub max_leading_bits: u32,
    /// log2(S): number of tracked successor ranks per leader.
    pub max_successor_bits: u32,
    /// Number of pack schemes to keep, 1..=3.
    pub encoding_types: usize,
    /// Whether to run the §4.7 pack-scheme search instead of using the
    /// canonical schemes.
    pub optimize: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            input_options: InputOptions::default(),
            max_leading_bits: 5, // C = 32
            max_successor_bits: 4, // S = 16
            encoding_types: 3,
            optimize: false,
        }
    }
}

/// Trains a Model from a raw corpus (SPEC_FULL.md §4.5-§4.7).
pub fn train(corpus: &[u8], options: &TrainOptions) -> Result<Model, ModelError> {
    let leading_count = 1usize << options.max_leading_bits;
    let successor_count = 1usize << options.max_successor_bits;

    let mut counter = BigramCounter::new();
    let mut segment_count = 0usize;
    for segment in segments(corpus, options.input_options) {
        counter.count_segment(segment);
        segment_count += 1;
    }
    log::info!("corpus segmentation complete: {segment_count} training segment(s)");

    let chars_by_id = counter.first_count.top_k(leading_count);
    if chars_by_id.is_empty() {
        return Err(ModelError::InvalidConfiguration(
            "corpus produced no leading bytes to train on".into(),
        ));
    }
    // The corpus may have fewer distinct leading bytes than the requested
    // power-of-two C; shrink to the largest power of two the corpus can
    // actually fill rather than padding with meaningless entries.
    let floor_pow2 = 1usize << (usize::BITS - 1 - (chars_by_id.len() as u32).leading_zeros());
    let leading_count = floor_pow2.min(leading_count);
    let chars_by_id: Vec<u8> = chars_by_id.into_iter().take(leading_count).collect();
    let leading_count = chars_by_id.len();
    log::info!("bigram counting complete: {leading_count} leading byte(s) ranked");

    let mut ids_by_char = [INVALID; 256];
    for (rank, &c) in chars_by_id.iter().enumerate() {
        ids_by_char[c as usize] = rank as u8;
    }

    // successor_ids[r][r'] = successor rank of chars_by_id[r'] as a
    // successor of chars_by_id[r], for r,r' both leading ranks.
    let mut successor_ids = vec![INVALID; leading_count * leading_count];
    let min_char = *chars_by_id.iter().min().unwrap();
    // Widen to u16 so a top leading byte of 0xFF computes an exclusive
    // bound of 256 instead of wrapping back to 0, which would otherwise
    // underflow the `rows` subtraction below. Narrowing back to u8 for
    // `Model.max_char` still wraps in that one case, but `Model::new`'s
    // `validate()` rejects the resulting min_char > max_char as
    // `InvalidConfiguration` rather than ever computing `rows` from it.
    let max_char_exclusive = *chars_by_id.iter().max().unwrap() as u16 + 1;
    let max_char = max_char_exclusive as u8;
    let rows = max_char_exclusive as usize - min_char as usize;
    let mut chars_by_successor_id = vec![INVALID; rows * successor_count];

    for (r, &leader) in chars_by_id.iter().enumerate() {
        let successors = counter.successors_of(leader, successor_count);
        let row = (leader - min_char) as usize;
        for (rank, &succ_byte) in successors.iter().enumerate() {
            chars_by_successor_id[row * successor_count + rank] = succ_byte;
            if let Some(rp) = chars_by_id.iter().position(|&b| b == succ_byte) {
                successor_ids[r * leading_count + rp] = rank as u8;
            }
        }
    }
    log::info!("ranking complete: successor tables built for {leading_count} leader(s)");

    let packs = if options.optimize {
        let schemes = search_pack_schemes(corpus, options, &ids_by_char, &successor_ids, leading_count)?;
        log::info!("pack-scheme search complete: {} scheme(s) selected", schemes.len());
        schemes
    } else {
        canonical_schemes(options.encoding_types)?
    };

    Model::new(
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

/// One size class's worth of candidate widths to consider during
/// optimization, grouped by `bytes_packed`. The header width is chosen to
/// match the canonical scheme for that size class; only the distribution of
/// bits among fields is searched, which keeps the search space small while
/// still letting the corpus pick a layout other than the canonical one.
fn candidate_widths_for_size(bytes_packed: u32, max_leading_bits: u32, max_successor_bits: u32) -> Vec<Vec<u32>> {
    let header_width = match bytes_packed {
        1 => 2,
        2 => 3,
        4 => 4,
        _ => unreachable!("bytes_packed is always 1, 2 or 4"),
    };
    let budget = bytes_packed * 8 - header_width;
    let lead_width = max_leading_bits.min(budget);
    let mut candidates = Vec::new();

    // Try every number of successor fields that fits the remaining budget
    // once the leading field is fixed at `lead_width`, splitting the rest
    // evenly (down-rounded) among successor fields, clamped to
    // max_successor_bits and MAX_BYTES_UNPACKED-1 successor slots.
    let remaining_after_lead = budget - lead_width;
    let max_fields = (MAX_BYTES_UNPACKED as u32 - 1).min(remaining_after_lead);
    for successor_fields in 1..=max_fields {
        let per_field = (remaining_after_lead / successor_fields).min(max_successor_bits);
        if per_field == 0 {
            continue;
        }
        let used = per_field * successor_fields;
        if used > remaining_after_lead {
            continue;
        }
        let mut widths = vec![header_width, lead_width];
        widths.extend(std::iter::repeat(per_field).take(successor_fields as usize));
        // Any leftover bits must land on the last successor field for the
        // total to sum to bytes_packed*8 exactly, but growing it past
        // max_successor_bits would violate §4.7's own search constraint —
        // drop the candidate rather than accept an oversized field.
        let total: u32 = widths.iter().sum();
        let target = bytes_packed * 8;
        if total == target {
            candidates.push(widths);
        } else if total < target {
            let slack = target - total;
            let Some(last) = widths.last_mut() else {
                continue;
            };
            if *last + slack > max_successor_bits {
                continue;
            }
            *last += slack;
            candidates.push(widths);
        }
    }
    candidates
}

/// §4.7: for each size class, score every candidate scheme by how well it
/// compresses the corpus and keep the winner.
fn search_pack_schemes(
    corpus: &[u8],
    options: &TrainOptions,
    ids_by_char: &[u8; 256],
    successor_ids: &[u8],
    leading_count: usize,
) -> Result<Vec<PackScheme>, ModelError> {
    let mut winners = Vec::new();
    for &bytes_packed in &[1u32, 2, 4][..options.encoding_types] {
        let candidates = candidate_widths_for_size(bytes_packed, options.max_leading_bits, options.max_successor_bits);
        let mut best: Option<(PackScheme, f64)> = None;
        for widths in candidates {
            let scheme = match PackScheme::from_widths(&widths) {
                Ok(s) => s,
                Err(_) => continue,
            };
            let ratio = score_scheme(&scheme, corpus, ids_by_char, successor_ids, leading_count);
            match &best {
                Some((_, best_ratio)) if *best_ratio <= ratio => {}
                _ => best = Some((scheme, ratio)),
            }
        }
        match best {
            Some((scheme, _)) => winners.push(scheme),
            None => winners.push(canonical_schemes(3)?[match bytes_packed {
                1 => 0,
                2 => 1,
                _ => 2,
            }]
            .clone()),
        }
    }
    Ok(winners)
}

/// Accumulated `ratio = bytes_packed/bytes_unpacked` over every corpus
/// position where `scheme` can encode, lower is better (SPEC_FULL.md §4.7).
/// Positions where the scheme cannot encode contribute nothing.
fn score_scheme(
    scheme: &PackScheme,
    corpus: &[u8],
    ids_by_char: &[u8; 256],
    successor_ids: &[u8],
    leading_count: usize,
) -> f64 {
    let bu = scheme.bytes_unpacked();
    if corpus.len() < bu {
        return f64::INFINITY;
    }
    let mut total_ratio = 0.0;
    let mut fits = 0u64;
    for p in 0..=(corpus.len() - bu) {
        let id0 = ids_by_char[corpus[p] as usize];
        if id0 == INVALID || (id0 as u32) > scheme.masks[0] {
            continue;
        }
        let mut prev = id0;
        let mut ok = true;
        for i in 1..bu {
            let idk = ids_by_char[corpus[p + i] as usize];
            if idk == INVALID {
                ok = false;
                break;
            }
            let sk = successor_ids[prev as usize * leading_count + idk as usize];
            if sk == INVALID || (sk as u32) > scheme.masks[i] {
                ok = false;
                break;
            }
            prev = idk;
        }
        if ok {
            fits += 1;
            total_ratio += scheme.bytes_packed() as f64 / bu as f64;
        }
    }
    if fits == 0 {
        f64::INFINITY
    } else {
        total_ratio
    }
}
