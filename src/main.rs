use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "quotes")]
#[command(version)]
#[command(about = "A local quote collection that syncs with a remote feed")]
#[command(long_about = "quotes keeps a collection of quotes in a local database, shows\n\
    random ones filtered by category, and merges in new quotes from a\n\
    remote feed on demand or on a timer via the background daemon.")]
#[command(after_help = "EXAMPLES:\n    \
    quotes show                       Show a random quote\n    \
    quotes add \"Stay hungry\" -a Jobs -c Inspiration\n    \
    quotes filter Life                Only show quotes from Life\n    \
    quotes export                     Write quotes.json to the current directory\n    \
    quotes import backup.json         Merge quotes from a file\n    \
    quotes sync                       Fetch new quotes from the feed\n    \
    quotes daemon start               Sync in the background\n\n\
    For more information about a command, run 'quotes <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show a random quote from the selected category
    #[command(long_about = "Picks a random quote from the currently selected category (or the\n\
        one given with --category) and remembers it as the last viewed quote\n\
        for this session. Use --last to show that quote again.")]
    Show(commands::show::Args),

    /// Add a quote to the collection
    #[command(long_about = "Adds a quote and saves the collection. Unless --offline is given\n\
        or post_new_quotes is disabled, the quote is also posted to the\n\
        remote feed; a failed post never undoes the local add.")]
    Add(commands::add::Args),

    /// List quotes
    List(commands::list::Args),

    /// List categories and the selected one
    Categories(commands::categories::Args),

    /// Select the category used by show and list
    #[command(long_about = "Sets the category filter and remembers it across runs.\n\
        Use \"all\" to clear the filter.")]
    Filter(commands::filter::Args),

    /// Import quotes from a JSON file
    #[command(long_about = "Reads a JSON array of quotes and merges it into the collection.\n\
        Entries without text or category are skipped. By default quotes\n\
        that already exist are skipped too; see --mode.")]
    Import(commands::import::Args),

    /// Export all quotes to a JSON file
    Export(commands::export::Args),

    /// Clear saved quotes and restore the built-in ones
    Reset(commands::reset::Args),

    /// Fetch quotes from the remote feed and merge them
    #[command(long_about = "Runs one sync against the configured endpoint. When the daemon\n\
        is running the sync is handed to it, so it never overlaps with the\n\
        periodic one. Use --local to sync in this process instead.")]
    Sync(commands::sync::Args),

    /// Show store, sync and daemon status
    Status,

    /// View and manage configuration settings
    #[command(long_about = "Provides subcommands to show, get, and set configuration values.\n\
        Configuration is stored in ~/.quotesync/config.yaml.")]
    Config(commands::config::Args),

    /// Manage the background sync daemon
    #[command(long_about = "Controls the background daemon that syncs with the remote feed\n\
        on a fixed interval and answers manual sync requests.")]
    Daemon(commands::daemon::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The foreground daemon installs its own file logger.
    let daemon_logs_itself = matches!(&cli.command, Commands::Daemon(args) if args.is_foreground_start());

    if !daemon_logs_itself {
        let filter = if cli.verbose {
            "quotesync=debug,quotes=debug"
        } else {
            "quotesync=info,quotes=info"
        };

        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }

    match cli.command {
        Commands::Show(args) => commands::show::run(args),
        Commands::Add(args) => commands::add::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Categories(args) => commands::categories::run(args),
        Commands::Filter(args) => commands::filter::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Reset(args) => commands::reset::run(args),
        Commands::Sync(args) => commands::sync::run(args),
        Commands::Status => commands::status::run(),
        Commands::Config(args) => commands::config::run(args),
        Commands::Daemon(args) => commands::daemon::run(args),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}
