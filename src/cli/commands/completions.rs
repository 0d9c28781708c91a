//! Completions command - generate shell completion scripts.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io;

/// Arguments for the completions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    quotes completions bash > ~/.local/share/bash-completion/completions/quotes\n    \
    quotes completions zsh > ~/.zfunc/_quotes\n    \
    quotes completions fish > ~/.config/fish/completions/quotes.fish")]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL", value_enum)]
    pub shell: Shell,
}

/// Writes completions for `cmd` to stdout.
///
/// Called from main.rs, which owns the top-level clap command.
pub fn generate_completions(cmd: &mut Command, shell: Shell) {
    generate(shell, cmd, "quotes", &mut io::stdout());
}
