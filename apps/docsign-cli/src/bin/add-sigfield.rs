//! Insert an empty signature form field into a PDF

use anyhow::Context;
use clap::Parser;
use docsign_cli::{parse_args, parse_rect, preflight, run};
use docsign_core::{add_signature_field_file, SignatureFieldSpec};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "add-sigfield")]
#[command(version, about = "Add an empty digital-signature field to a PDF")]
struct Args {
    /// PDF to read
    input_pdf: PathBuf,

    /// Where to write the PDF with the new field
    output_pdf: PathBuf,

    /// Field name (/T)
    #[arg(long, default_value = "Signature1")]
    name: String,

    /// 1-based page that carries the widget
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Widget rectangle in PDF points
    #[arg(long, value_name = "X1,Y1,X2,Y2", default_value = "0,0,100,50", value_parser = parse_rect)]
    rect: [f64; 4],
}

fn main() -> ExitCode {
    docsign_cli::init_tracing();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };

    run(|| {
        preflight(&[("Input PDF", args.input_pdf.as_path())])?;

        let spec = SignatureFieldSpec::new(&args.name)
            .with_page(args.page)
            .with_rect(args.rect);
        add_signature_field_file(&args.input_pdf, &args.output_pdf, &spec).with_context(|| {
            format!(
                "failed to add signature field to {}",
                args.input_pdf.display()
            )
        })?;

        println!(
            "Added signature field '{}' on page {}: {}",
            args.name,
            args.page,
            args.output_pdf.display()
        );
        Ok(())
    })
}
