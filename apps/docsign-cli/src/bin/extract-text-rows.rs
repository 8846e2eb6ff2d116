//! Cut scanned pages into per-line images using Tesseract word boxes

use anyhow::Context;
use clap::Parser;
use docsign_cli::{parse_args, preflight, run};
use std::path::PathBuf;
use std::process::ExitCode;
use textrows_core::{
    BatchReport, RowExtractor, Tesseract, DEFAULT_LANG, DEFAULT_MIN_CONFIDENCE, DEFAULT_PROGRAM,
};

#[derive(Parser, Debug)]
#[command(name = "extract-text-rows")]
#[command(version, about = "Split scanned images into one PNG per text line")]
struct Args {
    /// Image file, or a directory of .png/.jpg/.jpeg images
    input: PathBuf,

    /// Crops go to OUTPUT_DIR/<image stem>/line_<n>.png
    output_dir: PathBuf,

    /// Tesseract language
    #[arg(long, env = "TEXTROWS_LANG", default_value = DEFAULT_LANG)]
    lang: String,

    /// Words whose truncated confidence does not exceed this are ignored
    #[arg(long, default_value_t = DEFAULT_MIN_CONFIDENCE)]
    min_confidence: i32,

    /// Tesseract executable
    #[arg(long, env = "TESSERACT_CMD", default_value = DEFAULT_PROGRAM)]
    tesseract: String,

    /// Print a JSON summary instead of status lines
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    docsign_cli::init_tracing();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };

    run(|| {
        preflight(&[("Input", args.input.as_path())])?;

        let extractor = RowExtractor::new(
            Tesseract::new()
                .with_program(&args.tesseract)
                .with_lang(&args.lang),
        )
        .with_min_confidence(args.min_confidence);

        let report = if args.input.is_dir() {
            extractor
                .process_directory(&args.input, &args.output_dir)
                .with_context(|| format!("failed to read {}", args.input.display()))?
        } else {
            let processed = extractor
                .process_image(&args.input, &args.output_dir)
                .with_context(|| format!("failed to process {}", args.input.display()))?;
            BatchReport {
                processed: vec![processed],
                failed: vec![],
            }
        };

        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for image in &report.processed {
                println!(
                    "{}: {} rows -> {}",
                    image.image.display(),
                    image.rows.len(),
                    image.output_dir.display()
                );
            }
            for failed in &report.failed {
                println!("{}: FAILED ({})", failed.image.display(), failed.error);
            }
        }

        if report.has_failures() {
            anyhow::bail!(
                "{} of {} images failed",
                report.failed.len(),
                report.failed.len() + report.processed.len()
            );
        }
        Ok(())
    })
}
