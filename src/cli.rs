//! CLI argument parser
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Command-line argument parser for `alfred-tmux`.
#[derive(Debug, Parser)]
#[command(name = "alfred-tmux")]
#[command(
    about = "List and manage tmux sessions from a macOS launcher",
    long_about = "alfred-tmux - tmux sessions at a keystroke.

Key Features:
 - List sessions with their status, window count and idle time.
 - Attach to or create a session in iTerm2, Ghostty or Terminal.
 - Detach clients from or delete a session.

Examples:
 alfred-tmux list work         # sessions whose name contains `work`
 alfred-tmux run work          # attach to `work` in the preferred terminal
 alfred-tmux run create:demo   # create `demo` and attach to it
 alfred-tmux run delete:demo   # kill `demo`

The terminal is chosen by `terminal` in ~/.config/alfred-tmux/config.toml
or the TMUX_TERMINAL variable (auto, iterm, ghostty, terminal).

Use `alfred-tmux <COMMAND> --help` for more details."
)]
pub struct Args {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands for `alfred-tmux`.
#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(
        about = "List tmux sessions",
        long_about = "List tmux sessions whose name contains QUERY, attached
sessions first, then by most recent activity. Without a match, offer to create
a session named QUERY.",
        alias = "l"
    )]
    List {
        /// Case-insensitive filter on the session name
        query: Option<String>,

        #[clap(long, help = "Print the rows as JSON")]
        json: bool,
    },

    #[command(
        about = "Run an encoded session request",
        long_about = "Run a request of the form <action>:<session>, where action
is one of attach, create, delete or detach. A bare session name attaches.
The outcome is printed as a single notification line.",
        alias = "r"
    )]
    Run {
        /// The encoded request, e.g. `create:demo`
        request: Option<String>,
    },

    #[command(about = "Generate shell completions")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn run_accepts_encoded_requests() {
        let args = Args::parse_from(["alfred-tmux", "run", "create:demo"]);
        match args.command {
            Commands::Run { request } => {
                assert_eq!(request.as_deref(), Some("create:demo"))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_without_request_parses() {
        let args = Args::parse_from(["alfred-tmux", "-v", "run"]);
        assert!(args.verbose);
        assert!(matches!(args.command, Commands::Run { request: None }));
    }

    #[test]
    fn list_takes_query_and_json_flag() {
        let args = Args::parse_from(["alfred-tmux", "list", "dev", "--json"]);
        match args.command {
            Commands::List { query, json } => {
                assert_eq!(query.as_deref(), Some("dev"));
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
