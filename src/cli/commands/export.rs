//! Export command - save the collection as a JSON file.

use anyhow::{Context, Result};
use colored::Colorize;
use quotesync::config::Config;
use std::path::{Path, PathBuf};

use crate::cli::open_store;

/// Arguments for the export command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    quotes export                      Write quotes.json to the current directory\n    \
    quotes export --timestamped        Write quotes_<date>-<time>.json\n    \
    quotes export -o ~/backups/        Write into a directory\n    \
    quotes export --stdout | jq length Print instead of writing a file")]
pub struct Args {
    /// Destination file or directory
    #[arg(short, long, value_name = "PATH", conflicts_with = "stdout")]
    pub output: Option<PathBuf>,

    /// Print the JSON to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Add a timestamp to the file name (overrides the config setting)
    #[arg(long)]
    pub timestamped: bool,
}

/// Executes the export command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    let artifact = store
        .export_all(args.timestamped || config.timestamped_exports)
        .context("Failed to export quotes")?;

    if args.stdout {
        println!("{}", artifact.contents);
        return Ok(());
    }

    let path = destination(args.output.as_deref(), &artifact.file_name);
    std::fs::write(&path, &artifact.contents)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    eprintln!(
        "{} {} quote(s) to {}",
        "Exported".green(),
        store.len(),
        path.display()
    );
    Ok(())
}

/// Resolves where the export goes: an explicit file, a file named
/// `file_name` inside an explicit directory, or `file_name` in the
/// current directory.
fn destination(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}
