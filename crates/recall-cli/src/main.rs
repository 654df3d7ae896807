//! recall - CLI for recalling earlier exchanges of a Claude Code conversation

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use cli::{Cli, Command};
use commands::show::View;

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    // stdout carries hook JSON and markdown, so logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.use_color() {
        colored::control::set_override(false);
    }

    match &cli.command {
        Command::Hook => commands::hook::run(&cli),
        Command::Fetch { args } => commands::fetch::run(&cli, args),
        Command::Show {
            page,
            around,
            search,
        } => commands::show::run(
            &cli,
            View::from_args(*page, around.as_deref(), search.as_deref()),
        ),
        Command::Index {
            transcript,
            session_id,
        } => commands::index::run(&cli, transcript, session_id.as_deref()),
        Command::Status => commands::status::run(&cli),
    }
}
