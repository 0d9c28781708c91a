//! List command - list quotes, optionally for one category.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;

use crate::cli::format::{truncate, OutputFormat};
use crate::cli::open_store;

/// Arguments for the list command.
#[derive(clap::Args)]
pub struct Args {
    /// Only list this category ("all" for every quote; defaults to the
    /// selected category)
    #[arg(short, long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;

    let category = args
        .category
        .as_deref()
        .map(str::trim)
        .unwrap_or_else(|| store.selected_category());
    let view = store.filtered_view(category);

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!(
            "{}",
            format!("No quotes available for category '{category}'.").yellow()
        );
        return Ok(());
    }

    println!(
        "{}  {}",
        format!("{} quote(s)", view.len()).bold(),
        format!("category: {category}").dimmed()
    );
    println!();
    for quote in view {
        println!(
            "  {:60}  {:20}  {}",
            truncate(&quote.text, 60),
            truncate(quote.author_or_unknown(), 20).cyan(),
            quote.category.dimmed()
        );
    }

    Ok(())
}
