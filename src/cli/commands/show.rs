//! Show command - display a random quote.
//!
//! Picks from the selected category (see `quotes filter`) unless a category
//! is given, and remembers the pick for `quotes show --last`.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use quotesync::store::DisplayState;

use crate::cli::format::{quote_lines, OutputFormat};
use crate::cli::open_store;

/// Arguments for the show command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    quotes show                    Random quote from the selected category\n    \
    quotes show -c Life            Random quote from 'Life' only\n    \
    quotes show --last             The quote shown last in this session")]
pub struct Args {
    /// Pick from this category instead of the selected one
    #[arg(short, long, value_name = "CATEGORY", conflicts_with = "last")]
    pub category: Option<String>,

    /// Show the last viewed quote instead of a new one
    #[arg(long)]
    pub last: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the show command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut store = open_store(&config)?;

    if args.last {
        return match store.last_viewed() {
            Some(quote) => {
                match args.format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quote)?),
                    OutputFormat::Text => {
                        println!("{}", quote_lines(&quote));
                        println!("{}", "Last viewed in this session".dimmed());
                    }
                }
                Ok(())
            }
            None => {
                println!("{}", "No quote viewed in this session yet.".yellow());
                Ok(())
            }
        };
    }

    let mut rng = rand::thread_rng();
    let state = match args.category.as_deref() {
        Some(category) => store.show_random_in(category.trim(), &mut rng),
        None => store.show_random(&mut rng),
    };

    match (state, args.format) {
        (DisplayState::Quote(quote), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        (DisplayState::Quote(quote), OutputFormat::Text) => println!("{}", quote_lines(&quote)),
        (DisplayState::Empty { .. }, OutputFormat::Json) => println!("null"),
        (DisplayState::Empty { category }, OutputFormat::Text) => {
            println!(
                "{}",
                format!("No quotes available for category '{category}'.").yellow()
            );
        }
    }

    Ok(())
}
