/*
 * Thin CLI front end over the library API: encode/decode short strings
 * against a Model, or train a new one from a corpus file.
 */

use clap::{Parser, Subcommand};
use shoco_rs::default_model::{default_model, set_default_model};
use shoco_rs::header_codec::{parse_header, write_header};
use shoco_rs::trainer::{segments_from_file, train, TrainOptions};
use shoco_rs::{decoder, encoder};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "shocod", version, about = "Compress and decompress short strings")]
struct Cli {
    /// Path to a C-header model file to use instead of the bundled default.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a string read from stdin, writing raw bytes to stdout.
    Encode,
    /// Decompress raw bytes read from stdin, writing the original string to stdout.
    Decode,
    /// Train a new model from a corpus file and write it as a C header.
    Train {
        /// Path to the training corpus.
        #[arg(long)]
        corpus: PathBuf,
        /// Where to write the trained model's C-header text.
        #[arg(long)]
        output: PathBuf,
        /// Search for optimal pack schemes instead of using the canonical ones.
        #[arg(long)]
        optimize: bool,
        /// log2 of the number of indexed leading bytes.
        #[arg(long, default_value_t = 5)]
        leading_bits: u32,
        /// log2 of the number of tracked successor ranks per leader.
        #[arg(long, default_value_t = 4)]
        successor_bits: u32,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let model = match &cli.model {
        Some(path) => {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("shocod: failed to read model file {}: {err}", path.display());
                    return ExitCode::FAILURE;
                }
            };
            match parse_header(&text) {
                Ok(model) => {
                    set_default_model(model);
                    default_model()
                }
                Err(err) => {
                    eprintln!("shocod: failed to parse model from {}: {err}", path.display());
                    return ExitCode::FAILURE;
                }
            }
        }
        None => default_model(),
    };

    match cli.command {
        Command::Encode => {
            let mut input = Vec::new();
            if let Err(err) = std::io::Read::read_to_end(&mut std::io::stdin(), &mut input) {
                eprintln!("shocod: failed to read stdin: {err}");
                return ExitCode::FAILURE;
            }
            let mut out = Vec::new();
            encoder::encode(&model, &input, &mut out);
            if let Err(err) = std::io::Write::write_all(&mut std::io::stdout(), &out) {
                eprintln!("shocod: failed to write stdout: {err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Decode => {
            let mut input = Vec::new();
            if let Err(err) = std::io::Read::read_to_end(&mut std::io::stdin(), &mut input) {
                eprintln!("shocod: failed to read stdin: {err}");
                return ExitCode::FAILURE;
            }
            let mut out = Vec::new();
            if let Err(err) = decoder::decode(&model, &input, &mut out) {
                eprintln!("shocod: {err}");
                return ExitCode::FAILURE;
            }
            if let Err(err) = std::io::Write::write_all(&mut std::io::stdout(), &out) {
                eprintln!("shocod: failed to write stdout: {err}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Train {
            corpus,
            output,
            optimize,
            leading_bits,
            successor_bits,
        } => {
            let options = TrainOptions {
                optimize,
                max_leading_bits: leading_bits,
                max_successor_bits: successor_bits,
                ..TrainOptions::default()
            };
            // Read the corpus through the mmap-backed file path rather than
            // slurping it into a heap buffer first.
            let segments = match segments_from_file(&corpus, options.input_options) {
                Ok(segs) => segs,
                Err(err) => {
                    eprintln!("shocod: failed to read corpus {}: {err}", corpus.display());
                    return ExitCode::FAILURE;
                }
            };
            let corpus_bytes: Vec<u8> = segments.join(&b'\n');
            let model = match train(&corpus_bytes, &options) {
                Ok(model) => model,
                Err(err) => {
                    eprintln!("shocod: training failed: {err}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(err) = fs::write(&output, write_header(&model)) {
                eprintln!("shocod: failed to write model to {}: {err}", output.display());
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
    }
}
