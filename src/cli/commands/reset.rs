//! Reset command - restore the built-in quotes.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use std::io::{self, BufRead, Write};

use crate::cli::open_store;

#[derive(clap::Args)]
pub struct Args {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run(args: Args) -> Result<()> {
    if !args.yes && !confirm("This will clear saved quotes and restore defaults. Continue?")? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    let config = Config::load()?;
    let mut store = open_store(&config)?;
    store.reset_to_defaults()?;

    println!("{}", "Quotes reset to defaults.".green());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
