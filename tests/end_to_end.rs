/*
 * End-to-end scenarios from SPEC_FULL.md §8, exercised against the
 * crate's own library API and its `shocod` CLI front end.
 */

use assert_cmd::Command;
use predicates::prelude::*;
use shoco_rs::default_model::default_model;
use shoco_rs::{compress, decompress};

fn round_trip(input: &[u8]) {
    let mut encoded = Vec::new();
    compress(input, &mut encoded);
    let mut decoded = Vec::new();
    decompress(&encoded, &mut decoded).expect("round trip must decode");
    assert_eq!(decoded, input);
}

#[test]
fn scenario_empty_input() {
    let mut out = Vec::new();
    compress(b"", &mut out);
    assert!(out.is_empty());
}

#[test]
fn scenario_single_low_ascii_byte() {
    let mut out = Vec::new();
    compress(b"a", &mut out);
    assert_eq!(out, vec![0x61]);
}

#[test]
fn scenario_single_high_bit_byte() {
    let mut out = Vec::new();
    compress(&[0x80], &mut out);
    assert_eq!(out, vec![0x00, 0x80]);
}

#[test]
fn scenario_the_round_trips() {
    round_trip(b"the");
}

#[test]
fn scenario_this_is_a_test_round_trips() {
    round_trip(b"This is a test.");
}

#[test]
fn scenario_non_ascii_bytes_are_escaped() {
    let input = "Just \u{03c0}.".as_bytes();
    let mut encoded = Vec::new();
    compress(input, &mut encoded);

    let model = default_model();
    for &b in input {
        if b >= 0x80 && model.ids_by_char[b as usize] == shoco_rs::model::INVALID {
            assert!(
                encoded.windows(2).any(|w| w == [0x00, b]),
                "expected escaped byte 0x{b:02x} in encoded output"
            );
        }
    }

    let mut decoded = Vec::new();
    decompress(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded, input);
}

#[test]
fn decoder_rejects_malformed_header_without_reading_past_end() {
    let mut out = Vec::new();
    let err = decompress(&[0xFE, 0x00, 0x00], &mut out).unwrap_err();
    assert_eq!(err, shoco_rs::DecodeError::InvalidHeader { byte: 0xFE });
}

#[test]
fn decoder_rejects_truncated_pack_code_word() {
    let mut out = Vec::new();
    let err = decompress(&[0xC0], &mut out).unwrap_err();
    assert!(matches!(err, shoco_rs::DecodeError::Truncated { .. }));
}

#[test]
fn cli_encode_then_decode_round_trips() {
    let mut encode_cmd = Command::cargo_bin("shocod").unwrap();
    let encoded = encode_cmd
        .arg("encode")
        .write_stdin("This is a test.")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let mut decode_cmd = Command::cargo_bin("shocod").unwrap();
    decode_cmd
        .arg("decode")
        .write_stdin(encoded)
        .assert()
        .success()
        .stdout(predicate::eq("This is a test."));
}

#[test]
fn cli_decode_rejects_malformed_input() {
    let mut cmd = Command::cargo_bin("shocod").unwrap();
    cmd.arg("decode")
        .write_stdin(vec![0xFE, 0x00, 0x00])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pack header byte"));
}

#[test]
fn cli_train_then_encode_with_custom_model() {
    let dir = std::env::temp_dir().join(format!(
        "shoco-rs-test-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let corpus_path = dir.join("corpus.txt");
    let model_path = dir.join("model.h");
    std::fs::write(
        &corpus_path,
        "the quick brown fox jumps over the lazy dog\n\
the dog barks at the fox\nthe quick fox runs away from the dog\n",
    )
    .unwrap();

    let mut train_cmd = Command::cargo_bin("shocod").unwrap();
    train_cmd
        .arg("train")
        .arg("--corpus")
        .arg(&corpus_path)
        .arg("--output")
        .arg(&model_path)
        .assert()
        .success();

    let mut encode_cmd = Command::cargo_bin("shocod").unwrap();
    encode_cmd
        .arg("--model")
        .arg(&model_path)
        .arg("encode")
        .write_stdin("the fox")
        .assert()
        .success();

    std::fs::remove_dir_all(&dir).ok();
}
