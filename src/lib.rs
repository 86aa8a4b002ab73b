// #![cfg_attr(debug_assertions, deny(warnings))]

#[macro_use]
extern crate static_assertions;

pub mod decoder;
pub mod default_model;
pub mod encoder;
pub mod header_codec;
pub mod model;
pub mod pack_scheme;
pub mod trainer;

pub use decoder::DecodeError;
pub use model::{Model, ModelError};

/// Encodes `input` against the crate-wide default model, appending the
/// compressed bytes to `out`. Convenience wrapper over `encoder::encode`
/// for callers who do not need a custom-trained Model.
pub fn compress(input: &[u8], out: &mut Vec<u8>) -> usize {
    let model = default_model::default_model();
    encoder::encode(&model, input, out)
}

/// Decodes `input` against the crate-wide default model, appending the
/// reconstructed bytes to `out`.
pub fn decompress(input: &[u8], out: &mut Vec<u8>) -> Result<(), DecodeError> {
    let model = default_model::default_model();
    decoder::decode(&model, input, out)
}
