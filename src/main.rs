use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

/// Converts text-format conformance fixtures to JSON.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Directory containing .textproto fixture files
    #[arg(default_value = "cel-spec/tests/simple/testdata")]
    input: PathBuf,

    /// Directory the .json files are written to
    #[arg(default_value = "testdata")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let converted = textproto2json::convert_all(&args.input, &args.out)
        .with_context(|| format!("converting fixtures from {}", args.input.display()))?;
    info!("converted {converted} fixture files into {}", args.out.display());
    Ok(())
}
