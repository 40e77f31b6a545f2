//! `yaml2json` CLI — convert YAML documents into line-delimited JSON.
//!
//! ## Usage
//!
//! ```sh
//! # stdin → stdout
//! echo 'foo: FOO' | yaml2json
//!
//! # One or more files, converted in order ("-" reads stdin)
//! yaml2json a.yaml b.yaml - c.yaml
//!
//! # Version and build
//! yaml2json --version
//! ```
//!
//! Each YAML document becomes one compact JSON line on stdout. The first
//! error stops the run with a `yaml2json: ...` message on stderr and exit
//! status 1; lines already written stay on stdout.
//!
//! Set `RUST_LOG=debug` to trace source and document progress on stderr.

use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use yaml2json_core::{ConvertError, Converter, Options};

const APP_NAME: &str = "yaml2json";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_COMMIT: &str = match option_env!("YAML2JSON_GIT_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

#[derive(Parser)]
#[command(
    name = APP_NAME,
    about = "Convert YAML documents into line-delimited JSON",
    disable_version_flag = true
)]
struct Cli {
    /// Show version
    #[arg(short = 'v', long)]
    version: bool,

    /// YAML files to convert, in order ("-" for stdin; stdin if none given)
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{APP_NAME}: {}", describe(&err));
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.version {
        println!("{APP_NAME} v{VERSION}, build {GIT_COMMIT}");
        return Ok(());
    }

    init_tracing()?;

    let options = Options::from_args(cli.files);
    debug!(?options, "starting conversion");

    Converter::new(&options).run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}

/// Render an error for stderr. Source errors already say what failed to
/// load; everything else is reported as a plain `error:`.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ConvertError>() {
        Some(ConvertError::Source { .. }) => err.to_string(),
        _ => format!("error: {err}"),
    }
}

/// Log to stderr so stdout carries nothing but JSON lines. Defaults to
/// `warn`, which keeps a successful run silent.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))
}
