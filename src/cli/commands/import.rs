//! Import command - add quotes from a JSON file.
//!
//! The file must hold a JSON array of `{text, author?, category}` objects.
//! Records that are not quote-shaped are skipped; invalid JSON aborts the
//! import without touching the store.

use anyhow::{Context, Result};
use colored::Colorize;
use quotesync::config::Config;
use quotesync::store::ImportMode;
use std::io::Read;
use std::path::PathBuf;

use crate::cli::open_store;

/// Arguments for the import command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    quotes import quotes.json                 Add new quotes, skip duplicates\n    \
    quotes import quotes.json --mode append   Add every quote\n    \
    quotes import backup.json --mode replace  Replace the whole collection\n    \
    cat quotes.json | quotes import -         Read from stdin")]
pub struct Args {
    /// JSON file to import, or "-" for stdin
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// How imported quotes combine with existing ones
    #[arg(short, long, value_enum, default_value = "dedup")]
    pub mode: ImportMode,
}

/// Executes the import command.
pub fn run(args: Args) -> Result<()> {
    let raw = if args.file.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };

    let config = Config::load()?;
    let mut store = open_store(&config)?;

    let summary = store
        .import_all(&raw, args.mode)
        .context("Failed to import quotes")?;

    println!(
        "{}",
        format!(
            "Imported successfully. {} new quote(s) added.",
            summary.added
        )
        .green()
    );
    if summary.duplicates > 0 {
        println!(
            "{}",
            format!("Skipped {} duplicate(s).", summary.duplicates).dimmed()
        );
    }
    if summary.invalid > 0 {
        println!(
            "{}",
            format!("Ignored {} record(s) that are not quotes.", summary.invalid).yellow()
        );
    }

    Ok(())
}
