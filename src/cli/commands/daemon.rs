//! Daemon management commands.
//!
//! Starts, stops and inspects the background process that syncs quotes
//! from the feed on a timer.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::process::Command;
use std::time::Duration;

use quotesync::daemon::{send_command_sync, DaemonCommand, DaemonResponse, DaemonState};

/// Daemon management subcommands.
#[derive(Subcommand)]
pub enum DaemonSubcommand {
    /// Start the background daemon.
    Start {
        /// Run in foreground (don't daemonize).
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the running daemon.
    Stop,

    /// Show daemon status and sync statistics.
    Status,

    /// Show daemon logs.
    Logs {
        /// Number of lines to show.
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,

        /// Follow log output (like tail -f).
        #[arg(short, long)]
        follow: bool,
    },
}

/// Arguments for the daemon command.
#[derive(clap::Args)]
pub struct Args {
    #[command(subcommand)]
    pub command: DaemonSubcommand,
}

impl Args {
    /// True for `daemon start --foreground`, which sets up its own logging.
    pub fn is_foreground_start(&self) -> bool {
        matches!(self.command, DaemonSubcommand::Start { foreground: true })
    }
}

/// Executes the daemon command.
pub fn run(args: Args) -> Result<()> {
    match args.command {
        DaemonSubcommand::Start { foreground } => run_start(foreground),
        DaemonSubcommand::Stop => run_stop(),
        DaemonSubcommand::Status => run_status(),
        DaemonSubcommand::Logs { lines, follow } => run_logs(lines, follow),
    }
}

fn run_start(foreground: bool) -> Result<()> {
    let state = DaemonState::new()?;

    if state.is_running() {
        println!(
            "{} Daemon is already running (PID {})",
            "Warning:".yellow(),
            state.get_pid().unwrap_or(0)
        );
        return Ok(());
    }

    if foreground {
        println!("{}", "Starting daemon in foreground...".green());
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();

        let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
        return rt.block_on(quotesync::daemon::run_daemon());
    }

    println!("{}", "Starting daemon in background...".green());

    let current_exe = std::env::current_exe().context("Failed to get current executable path")?;
    let child = Command::new(&current_exe)
        .args(["daemon", "start", "--foreground"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("Failed to spawn daemon process")?;

    println!(
        "{} Daemon started with PID {}",
        "Success:".green(),
        child.id()
    );
    println!(
        "{}",
        format!("Logs available at: {:?}", state.log_file).dimmed()
    );

    Ok(())
}

fn run_stop() -> Result<()> {
    let state = DaemonState::new()?;

    if !state.is_running() {
        println!("{}", "Daemon is not running".yellow());
        return Ok(());
    }

    let pid = state.get_pid().unwrap_or(0);
    println!("Stopping daemon (PID {pid})...");

    match send_command_sync(&state.socket_path, DaemonCommand::Stop) {
        Ok(DaemonResponse::Stopping) => {
            if wait_for_exit(&state, Duration::from_secs(3)) {
                println!("{}", "Daemon stopped".green());
                return Ok(());
            }
            println!(
                "{}",
                "Daemon did not stop gracefully, sending SIGTERM...".yellow()
            );
        }
        Ok(resp) => {
            println!("Unexpected response: {resp:?}");
        }
        Err(e) => {
            tracing::debug!("Failed to send stop command: {}", e);
            println!("{}", "Socket not available, sending SIGTERM...".yellow());
        }
    }

    kill_process(pid)?;

    if wait_for_exit(&state, Duration::from_secs(1)) {
        let _ = state.cleanup();
        println!("{}", "Daemon stopped".green());
    } else {
        println!("{}", "Warning: Daemon may still be running".yellow());
    }

    Ok(())
}

/// Polls until the daemon is gone or `timeout` passes.
fn wait_for_exit(state: &DaemonState, timeout: Duration) -> bool {
    let step = Duration::from_millis(100);
    let mut waited = Duration::ZERO;
    while waited < timeout {
        if !state.is_running() {
            return true;
        }
        std::thread::sleep(step);
        waited += step;
    }
    !state.is_running()
}

/// Sends SIGTERM to a process.
fn kill_process(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        // SAFETY: plain signal delivery to a PID read from our own PID file.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        anyhow::bail!("Killing processes not supported on this platform");
    }
}

fn run_status() -> Result<()> {
    let state = DaemonState::new()?;

    if !state.is_running() {
        println!("{}", "Daemon is not running".yellow());
        return Ok(());
    }

    println!("{}", "Daemon Status".green().bold());
    println!();

    match send_command_sync(&state.socket_path, DaemonCommand::Status) {
        Ok(DaemonResponse::Status {
            pid,
            uptime_seconds,
            ..
        }) => {
            println!("  {} {}", "Status:".dimmed(), "running".green());
            println!("  {} {}", "PID:".dimmed(), pid);
            println!("  {} {}", "Uptime:".dimmed(), format_duration(uptime_seconds));
        }
        Ok(_) | Err(_) => {
            println!(
                "  {} {} {}",
                "Status:".dimmed(),
                "running".green(),
                "(socket unavailable)".dimmed()
            );
            println!("  {} {}", "PID:".dimmed(), state.get_pid().unwrap_or(0));
            return Ok(());
        }
    }

    if let Ok(DaemonResponse::Stats(stats)) =
        send_command_sync(&state.socket_path, DaemonCommand::Stats)
    {
        println!();
        println!("{}", "Sync Statistics".green().bold());
        println!();
        println!("  {} {}", "Completed:".dimmed(), stats.syncs_completed);
        println!("  {} {}", "Skipped:".dimmed(), stats.syncs_skipped);
        if stats.syncs_failed > 0 {
            println!("  {} {}", "Failed:".dimmed(), stats.syncs_failed.to_string().red());
        }
        println!("  {} {}", "Quotes added:".dimmed(), stats.quotes_added);
        if let Some(at) = stats.last_sync_at {
            println!(
                "  {} {}",
                "Last sync:".dimmed(),
                at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

/// Formats a duration in seconds as a human-readable string.
fn format_duration(seconds: u64) -> String {
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m {}s", s / 60, s % 60),
        s if s < 86400 => format!("{}h {}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d {}h", s / 86400, (s % 86400) / 3600),
    }
}

fn run_logs(lines: usize, follow: bool) -> Result<()> {
    let state = DaemonState::new()?;

    if !state.log_file.exists() {
        println!("{}", "No log file found".yellow());
        println!(
            "{}",
            format!("Expected at: {:?}", state.log_file).dimmed()
        );
        return Ok(());
    }

    let file = File::open(&state.log_file).context("Failed to open log file")?;
    let mut reader = BufReader::new(file);

    if follow {
        println!("{}", format!("Following {:?}...", state.log_file).dimmed());
        println!("{}", "Press Ctrl+C to stop".dimmed());
        println!();

        reader.seek(SeekFrom::End(0))?;
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => std::thread::sleep(Duration::from_millis(100)),
                Ok(_) => print!("{line}"),
                Err(e) => {
                    tracing::debug!("Error reading log: {}", e);
                    break;
                }
            }
        }
    } else {
        let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();
        let start = all_lines.len().saturating_sub(lines);
        for line in &all_lines[start..] {
            println!("{line}");
        }
    }

    Ok(())
}
