mod cli;
mod client;
mod history;
mod native;

use std::time::Duration;

use clap::Parser;
use cli::Cli;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use history::{EngineConfig, HistoryEngine, JsonPinnedItems};
use native::{PlatformClipboard, PlatformHistory};

/// How long a cancelled command may take to unwind before the process exits.
const INTERRUPT_GRACE: Duration = Duration::from_millis(250);

/// Exit status when an interrupt has to end the process directly.
const INTERRUPTED_EXIT: i32 = 1;

fn init_tracing(verbose: bool, quiet: bool) {
    let fallback = if quiet {
        "off"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let pinned_root = cli
        .pinned_dir
        .clone()
        .or_else(history::pinned::default_root)
        .unwrap_or_default();
    let config = EngineConfig {
        live_timeout: Duration::from_millis(cli.timeout_ms),
    };
    let engine = HistoryEngine::new(
        PlatformHistory::new(),
        PlatformClipboard::new(),
        JsonPinnedItems::new(pinned_root),
        config,
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, cancelling");
            trigger.cancel();
            // A thread stuck inside a native call never observes the token.
            tokio::time::sleep(INTERRUPT_GRACE).await;
            tracing::warn!("command did not stop after interrupt, exiting");
            std::process::exit(INTERRUPTED_EXIT);
        }
    });

    let output = client::OutputOptions {
        strip_ansi: cli.strip_ansi,
        line_ending: cli.line_ending,
    };
    let mut stdout = std::io::stdout();
    let command = client::run(&engine, cli.command, &output, &cancel, &mut stdout);
    let code = match client::run_until_cancelled(&cancel, command).await {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            if !cli.quiet {
                eprintln!("cbhist: {e}");
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}
