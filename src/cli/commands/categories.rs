//! Categories command - list categories and mark the selected one.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use quotesync::storage::ALL_CATEGORIES;

use crate::cli::format::OutputFormat;
use crate::cli::open_store;

#[derive(clap::Args)]
pub struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let categories = store.categories();

    if args.format == OutputFormat::Json {
        let json = serde_json::json!({
            "selected": store.selected_category(),
            "categories": categories,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    let selected = store.selected_category();
    let marker = |name: &str| {
        if name == selected {
            "*".green().to_string()
        } else {
            " ".to_string()
        }
    };

    println!("{} {}", marker(ALL_CATEGORIES), "All Categories".dimmed());
    for category in &categories {
        let count = store.filtered_view(category).len();
        println!(
            "{} {}  {}",
            marker(category),
            category,
            format!("({count})").dimmed()
        );
    }

    Ok(())
}
