//! Output formatting shared by CLI commands.

use clap::ValueEnum;
use colored::Colorize;
use quotesync::storage::Quote;

/// Output format options for CLI commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default).
    #[default]
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Renders a quote as two terminal lines: the text, then author and category.
pub fn quote_lines(quote: &Quote) -> String {
    format!(
        "\"{}\"\n  {} {}  {}",
        quote.text.bold(),
        "—".dimmed(),
        quote.author_or_unknown().cyan(),
        format!("[{}]", quote.category).dimmed()
    )
}

/// Shortens `text` to at most `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
