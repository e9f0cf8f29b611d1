use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use tracing::warn;

use crate::cli::{Args, Commands};
use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::lister::{self, ListEntry};
use crate::notify::{Notifier, StdoutNotifier};
use crate::refresh::AlfredRefresher;
use crate::terminal::TerminalChoice;
use crate::terminal::automation::Osascript;
use crate::terminal::opener::ScriptedLauncher;
use crate::terminal::resolver::SpotlightProbe;
use crate::tmux::interface::TmuxCli;

pub fn handle(args: Args) -> Result<()> {
    match args.command {
        Commands::List { query, json } => list(query.as_deref().unwrap_or(""), json),
        Commands::Run { request } => run(request.as_deref().unwrap_or("")),
        Commands::Completions { shell } => completions(shell),
    }
}

/// Prints the session rows for `query`.
pub fn list(query: &str, json: bool) -> Result<()> {
    let config = load_config();

    let entries: Vec<ListEntry> = match TmuxCli::locate(config.tmux.path.as_deref()) {
        Ok(tmux) => {
            let tmux = tmux.with_socket(config.tmux.socket.as_deref());
            lister::list_entries(&tmux, query, Utc::now())
        }
        Err(_) => vec![lister::tmux_missing_entry()],
    };

    let output = if json {
        lister::render_json(&entries)? + "\n"
    } else {
        lister::render_text(&entries)
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .context("Failed to write session list")?;
    Ok(())
}

/// Dispatches one encoded request and prints its notification.
///
/// Request failures are reported as notifications, never as an error
/// return.
pub fn run(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Ok(());
    }

    let notifier = StdoutNotifier;
    let config = load_config();

    let tmux = match TmuxCli::locate(config.tmux.path.as_deref()) {
        Ok(tmux) => tmux,
        Err(e) => {
            return notifier.notify(&DispatchError::from_tmux(e, "").notification());
        }
    };

    let tmux = tmux.with_socket(config.tmux.socket.as_deref());

    let session_root = config
        .session_root()
        .inspect_err(|e| warn!("no session root: {e:#}"))
        .ok();

    let runner = Osascript;
    let probe = SpotlightProbe;
    let launcher = ScriptedLauncher::new(&runner, &config.timing);
    let refresher = AlfredRefresher::new(&runner, &config.refresh.keyword);

    let dispatcher = Dispatcher::new(
        &tmux,
        &probe,
        &launcher,
        &refresher,
        TerminalChoice::parse(&config.terminal),
        session_root,
    );

    match dispatcher.run(raw) {
        Some(notification) => notifier.notify(&notification),
        None => Ok(()),
    }
}

fn completions(shell: Shell) -> Result<()> {
    let mut command = Args::command();
    let name = command.get_name().to_string();
    generate(shell, &mut command, name, &mut io::stdout());
    Ok(())
}

/// A broken config file must not block the launcher: fall back to the
/// defaults and say so in the log.
fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!("ignoring unreadable config: {e:#}");
        Config::default().with_overrides(|key| std::env::var(key).ok())
    })
}
