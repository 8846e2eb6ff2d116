//! Shared plumbing for the command-line tools
//!
//! Every binary follows the same shape: install logging on stderr, parse
//! arguments, check that input paths exist, run, and map the outcome to
//! exit code 0 or 1.

use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber; `RUST_LOG` overrides the default `warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout is reserved for status lines
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parse arguments, exiting 0 for `--help`/`--version` and 1 for usage errors
pub fn parse_args<T: Parser>() -> Result<T, ExitCode> {
    T::try_parse().map_err(|err| {
        let _ = err.print();
        if err.use_stderr() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    })
}

/// Run the tool body, reporting failures on stderr and returning 1
pub fn run(body: impl FnOnce() -> anyhow::Result<()>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = write_error(&mut std::io::stderr().lock(), &err);
            ExitCode::FAILURE
        }
    }
}

/// Write `Error: <message>`, then the cause listing when the error wraps
/// another one (with a backtrace if `RUST_BACKTRACE` is set)
pub fn write_error(out: &mut impl Write, err: &anyhow::Error) -> std::io::Result<()> {
    writeln!(out, "Error: {err:#}")?;
    if err.chain().nth(1).is_some() {
        writeln!(out, "\n{err:?}")?;
    }
    Ok(())
}

/// Check input paths before doing any work
///
/// Fails with `<what> not found: <path>` for the first missing path.
pub fn preflight(inputs: &[(&'static str, &Path)]) -> anyhow::Result<()> {
    for &(what, path) in inputs {
        docsign_core::ensure_exists(what, path)?;
    }
    Ok(())
}

/// Parse `x1,y1,x2,y2` into a rectangle
pub fn parse_rect(value: &str) -> Result<[f64; 4], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected x1,y1,x2,y2 but got '{}'", value));
    }

    let mut rect = [0.0; 4];
    for (slot, part) in rect.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", part))?;
    }

    if rect[2] <= rect[0] || rect[3] <= rect[1] {
        return Err("x2 must exceed x1 and y2 must exceed y1".to_string());
    }
    Ok(rect)
}
