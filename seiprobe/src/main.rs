use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use decode::{DecoderOptions, H264Decoder, HeaderMatch, MappedFile};
use log::{debug, LevelFilter};

use crate::report::TextReport;

mod report;

/// Prints the frame packing arrangement SEI messages of an H.264 Annex B byte stream.
#[derive(Parser, Debug)]
struct Args {
    /// Byte stream to scan, `-` for stdin
    #[arg(short, long)]
    file_path: String,

    /// Only match NAL unit headers that are exactly 0x06
    #[arg(long)]
    exact_header: bool,

    /// Decode every SEI message of a NAL unit, not just the first
    #[arg(long)]
    all_messages: bool,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions {
            header_match: match self.exact_header {
                true => HeaderMatch::ExactByte,
                false => HeaderMatch::NalUnitType,
            },
            all_messages: self.all_messages,
        }
    }
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logger(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(level_filter(verbose))
        .parse_default_env()
        .init();
}

fn run(args: &Args) -> Result<()> {
    let options = args.decoder_options();
    let mut report = TextReport::new(BufWriter::new(io::stdout().lock()));

    let summary = if args.file_path == "-" {
        debug!("reading byte stream from stdin");
        H264Decoder::with_options(io::stdin().lock(), options)
            .decode(&mut report)
            .context("failed to read stdin")?
    } else {
        let mapped = MappedFile::from_file_path(&args.file_path)
            .with_context(|| format!("failed to open {}", args.file_path))?;
        debug!("mapped {} bytes from {}", mapped.as_bytes().len(), args.file_path);
        H264Decoder::with_options(mapped.as_bytes(), options)
            .decode(&mut report)
            .with_context(|| format!("failed to read {}", args.file_path))?
    };

    report.summary(&summary);
    report.finish().context("failed to write report")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);
    run(&args)
}
