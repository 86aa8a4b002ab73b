/*
 * CorpusReader segments a stream of training bytes into the units the
 * BigramCounter counts over (SPEC_FULL.md §4.5). It is expressed as an
 * iterator adapter over byte slices, following the chained-lazy-sequence
 * style the spec asks for rather than building an intermediate Vec<Vec<u8>>.
 */

use bitflags::bitflags;
use filebuffer::FileBuffer;
use std::path::Path;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InputOptions: u32 {
        const SPLIT_NEWLINE                      = 0b0000_0001;
        const SPLIT_WHITESPACE_AND_NEWLINE        = 0b0000_0010;
        const STRIP_WHITESPACE                    = 0b0000_0100;
        const STRIP_PUNCTUATION                   = 0b0000_1000;
        const STRIP_WHITESPACE_AND_PUNCTUATION    = 0b0001_0000;
    }
}

impl Default for InputOptions {
    fn default() -> Self {
        InputOptions::SPLIT_NEWLINE | InputOptions::STRIP_WHITESPACE
    }
}

const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

fn is_newline_separator(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn is_whitespace_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | 0x0B | 0x0C | 0xC2 | 0xAD)
}

fn is_whitespace(b: u8) -> bool {
    is_newline_separator(b) || is_whitespace_separator(b)
}

fn is_punctuation(b: u8) -> bool {
    PUNCTUATION.contains(&b)
}

/// Minimum segment length worth handing to the BigramCounter: a segment of
/// length < 2 contributes no bigrams.
const MIN_SEGMENT_LEN: usize = 2;

/// Splits `data` into training segments according to `options`, dropping
/// segments shorter than two bytes. Returned slices borrow from `data`.
pub fn segments<'a>(data: &'a [u8], options: InputOptions) -> impl Iterator<Item = &'a [u8]> {
    let split_newline = options.contains(InputOptions::SPLIT_NEWLINE)
        || options.contains(InputOptions::SPLIT_WHITESPACE_AND_NEWLINE);
    let split_whitespace = options.contains(InputOptions::SPLIT_WHITESPACE_AND_NEWLINE);

    let is_separator = move |b: u8| -> bool {
        (split_newline && is_newline_separator(b)) || (split_whitespace && is_whitespace_separator(b))
    };

    data.split(move |&b| is_separator(b))
        .map(move |segment| strip(segment, options))
        .filter(|segment| segment.len() >= MIN_SEGMENT_LEN)
}

fn strip(segment: &[u8], options: InputOptions) -> &[u8] {
    let strip_whitespace = options.contains(InputOptions::STRIP_WHITESPACE)
        || options.contains(InputOptions::STRIP_WHITESPACE_AND_PUNCTUATION);
    let strip_punctuation = options.contains(InputOptions::STRIP_PUNCTUATION)
        || options.contains(InputOptions::STRIP_WHITESPACE_AND_PUNCTUATION);

    let should_trim = |b: u8| (strip_whitespace && is_whitespace(b)) || (strip_punctuation && is_punctuation(b));

    let start = segment.iter().position(|&b| !should_trim(b)).unwrap_or(segment.len());
    let end = segment.iter().rposition(|&b| !should_trim(b)).map(|i| i + 1).unwrap_or(start);
    &segment[start..end]
}

/// Reads a corpus file via a memory map and yields its training segments.
/// Kept separate from `segments` so small in-memory corpora never pay for
/// an mmap, mirroring the crate's split between slice-based and
/// file-backed input paths.
pub fn segments_from_file(path: impl AsRef<Path>, options: InputOptions) -> std::io::Result<Vec<Vec<u8>>> {
    let buffer = FileBuffer::open(path)?;
    Ok(segments(&buffer, options).map(|s| s.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_splits_on_newline_and_strips_whitespace() {
        let data = b" hello \n  world  \r\nfoo";
        let segs: Vec<&[u8]> = segments(data, InputOptions::default()).collect();
        assert_eq!(segs, vec![b"hello".as_slice(), b"world".as_slice(), b"foo".as_slice()]);
    }

    #[test]
    fn runs_of_separators_produce_no_empty_segments() {
        let data = b"a\n\n\nbb";
        let segs: Vec<&[u8]> = segments(data, InputOptions::SPLIT_NEWLINE).collect();
        assert_eq!(segs, vec![b"bb".as_slice()]);
    }

    #[test]
    fn short_segments_are_dropped() {
        let data = b"a\nbb\nc";
        let segs: Vec<&[u8]> = segments(data, InputOptions::SPLIT_NEWLINE).collect();
        assert_eq!(segs, vec![b"bb".as_slice()]);
    }

    #[test]
    fn strip_punctuation_trims_leading_and_trailing_only() {
        let data = b"\"hello, world!\"";
        let segs: Vec<&[u8]> = segments(
            data,
            InputOptions::SPLIT_NEWLINE | InputOptions::STRIP_PUNCTUATION,
        )
        .collect();
        assert_eq!(segs, vec![b"hello, world".as_slice()]);
    }

    #[test]
    fn split_whitespace_and_newline_splits_on_spaces_too() {
        let data = b"foo bar\tbaz";
        let segs: Vec<&[u8]> =
            segments(data, InputOptions::SPLIT_WHITESPACE_AND_NEWLINE).collect();
        assert_eq!(segs, vec![b"foo".as_slice(), b"bar".as_slice(), b"baz".as_slice()]);
    }
}
