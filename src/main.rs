use clap::Parser;

use alfred_tmux::{actions, cli};

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    // stdout carries notifications and list rows, so logs go to stderr
    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    actions::handle(args)
}
