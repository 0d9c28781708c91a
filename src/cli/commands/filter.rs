//! Filter command - select the category used by `show` and `list`.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use quotesync::store::StoreError;

use crate::cli::open_store;

#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    quotes filter Life    Only show quotes from 'Life'\n    \
    quotes filter all     Show quotes from every category")]
pub struct Args {
    /// Category name, or "all"
    pub category: String,
}

pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut store = open_store(&config)?;

    match store.select_category(&args.category) {
        Ok(()) => {
            println!(
                "{} {}",
                "Selected category:".green(),
                store.selected_category()
            );
            Ok(())
        }
        Err(StoreError::UnknownCategory(name)) => {
            let known = store.categories().join(", ");
            anyhow::bail!("Unknown category '{name}'. Known categories: all, {known}")
        }
        Err(e) => Err(e.into()),
    }
}
