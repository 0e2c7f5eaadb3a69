//! `docpatch` — apply and inspect PATCH-DOC protocol messages.
//!
//! Usage:
//!   docpatch apply --document doc.json --message msg.json
//!   docpatch inspect --message msg.json
//!   docpatch roundtrip --document doc.json
//!
//! Results are written to stdout; logs (filtered by `RUST_LOG`) to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docpatch_protocol::{cli, Protocol, DEFAULT_VERSION};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docpatch", version)]
#[command(about = "Apply and inspect PATCH-DOC protocol messages")]
struct Cli {
    /// Protocol version messages are checked against
    #[arg(long, env = "DOCPATCH_PROTOCOL_VERSION", default_value = DEFAULT_VERSION)]
    protocol_version: String,

    /// Pretty-print JSON output
    #[arg(long, short = 'p', global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a message to a document and print the patched document
    Apply {
        #[arg(long, short = 'd')]
        document: PathBuf,
        #[arg(long, short = 'm')]
        message: PathBuf,
    },
    /// Print a summary of a message
    Inspect {
        #[arg(long, short = 'm')]
        message: PathBuf,
    },
    /// Load a document and print it re-serialized
    Roundtrip {
        #[arg(long, short = 'd')]
        document: PathBuf,
    },
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    let protocol = Protocol::new(&args.protocol_version)?;

    let output = match &args.command {
        Command::Apply { document, message } => {
            cli::apply(&protocol, &read(document)?, &read(message)?, args.pretty)
                .with_context(|| format!("applying {} to {}", message.display(), document.display()))?
        }
        Command::Inspect { message } => cli::inspect(&protocol, &read(message)?, args.pretty)
            .with_context(|| format!("inspecting {}", message.display()))?,
        Command::Roundtrip { document } => cli::roundtrip(&read(document)?, args.pretty)
            .with_context(|| format!("loading {}", document.display()))?,
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
