/*
 * The trainer turns a raw text corpus into a Model: segment it
 * (CorpusReader), count bigrams (BigramCounter), and rank + optionally
 * search pack schemes (ModelBuilder). SPEC_FULL.md §2 puts these three
 * components at roughly 45% of the core implementation combined.
 */

pub mod bigram_counter;
pub mod corpus_reader;
pub mod model_builder;

pub use bigram_counter::{BigramCounter, Counter};
pub use corpus_reader::{segments, segments_from_file, InputOptions};
pub use model_builder::{train, TrainOptions};
