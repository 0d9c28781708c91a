//! Add command - add a quote and post it to the feed.

use anyhow::Result;
use colored::Colorize;
use quotesync::config::Config;
use quotesync::remote::RemoteClient;

use crate::cli::format::quote_lines;
use crate::cli::{open_store, runtime};

/// Arguments for the add command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    quotes add \"Simplicity is prerequisite for reliability.\" -a Dijkstra -c Engineering\n    \
    quotes add \"Less is more.\" -a \"Mies van der Rohe\" -c Design --offline")]
pub struct Args {
    /// The quote text
    pub text: String,

    /// Who said it
    #[arg(short, long)]
    pub author: String,

    /// Category used for filtering
    #[arg(short, long)]
    pub category: String,

    /// Do not post the new quote to the feed
    #[arg(long)]
    pub offline: bool,
}

/// Executes the add command.
///
/// The quote is saved locally first. Posting it to the feed is best-effort
/// and its outcome only goes to the log.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let mut store = open_store(&config)?;

    let quote = store.add(&args.text, &args.author, &args.category)?;

    println!("{}", "New quote added successfully!".green());
    println!("{}", quote_lines(&quote));

    if config.post_new_quotes && !args.offline {
        let client = RemoteClient::with_url(&config.endpoint);
        runtime()?.block_on(client.notify_new_quote(&quote));
    }

    Ok(())
}
