//! Sign an existing signature field of a PDF via an incremental update

use anyhow::Context;
use clap::Parser;
use docsign_cli::{parse_args, preflight, run};
use docsign_core::{sign_copies, sign_pdf_file, SignOptions};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sign-pdf")]
#[command(
    version,
    about = "Sign an existing signature field of a PDF",
    after_help = "Example: sign-pdf input.pdf output.pdf cert.crt key.pem Signature1 123e4567-e89b-12d3-a456-426614174000"
)]
struct Args {
    /// PDF containing an unsigned signature field
    input_pdf: PathBuf,

    /// Signed PDF to write (a directory when --copies is given)
    output_pdf: PathBuf,

    /// PEM certificate of the signer
    cert_file: PathBuf,

    /// PEM private key (PKCS#8 or SEC1, P-256)
    key_file: PathBuf,

    /// Name of the existing signature field
    signature_name: String,

    /// Document ID embedded in the reason; generated when omitted
    #[arg(conflicts_with = "copies")]
    uuid: Option<String>,

    /// Reason text; " - ID: <uuid>" is appended
    #[arg(long, env = "DOCSIGN_REASON", default_value = "Digital signature")]
    reason: String,

    /// Signing location (/Location)
    #[arg(long)]
    location: Option<String>,

    /// Signer contact information (/ContactInfo)
    #[arg(long)]
    contact_info: Option<String>,

    /// Write this many signed copies named signed_<uuid>.pdf into OUTPUT_PDF
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    copies: Option<u32>,
}

fn main() -> ExitCode {
    docsign_cli::init_tracing();
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };

    run(|| {
        preflight(&[
            ("Input PDF", args.input_pdf.as_path()),
            ("Certificate", args.cert_file.as_path()),
            ("Key", args.key_file.as_path()),
        ])?;

        let options = SignOptions {
            reason: args.reason.clone(),
            document_id: args.uuid.clone(),
            location: args.location.clone(),
            contact_info: args.contact_info.clone(),
        };

        let signed = match args.copies {
            Some(copies) => sign_copies(
                &args.input_pdf,
                &args.output_pdf,
                &args.cert_file,
                &args.key_file,
                &args.signature_name,
                &options,
                copies as usize,
            ),
            None => sign_pdf_file(
                &args.input_pdf,
                &args.output_pdf,
                &args.cert_file,
                &args.key_file,
                &args.signature_name,
                &options,
            )
            .map(|signed| vec![signed]),
        }
        .with_context(|| format!("failed to sign {}", args.input_pdf.display()))?;

        for document in &signed {
            println!("PDF signed successfully: {}", document.path.display());
            if args.uuid.is_none() {
                println!("Document ID: {}", document.document_id);
            }
        }
        Ok(())
    })
}
