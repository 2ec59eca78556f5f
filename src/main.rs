//! vido - VTODO task manager CLI
//!
//! A command-line task manager over RFC 5545 VTODO files in vdir-style list
//! directories, compatible with CalDAV sync clients that write the same
//! storage.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vido::cli::Cli;
use vido::output::emit_error;

fn main() {
    // Tracing is opt-in via RUST_LOG.
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli.run() {
        emit_error(&err);
        std::process::exit(err.exit_code());
    }
}
