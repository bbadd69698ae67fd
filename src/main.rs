mod cli;
mod commands;
mod config;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use std::io;
use std::process::ExitCode;

use cli::{Cli, Command};
use commands::Output;
use config::{Config, Settings};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    if let Command::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "tfsync", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::resolve(&cli, &Config::load()?)?;
    let client = settings.client();
    let ctx = settings.apply_context();
    let out = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    match cli.command {
        Command::Org(cmd) => commands::organization::run(&client, &ctx, cmd, out),
        Command::Workspace(cmd) => commands::workspace::run(&client, &ctx, cmd, out),
        Command::Team(cmd) => commands::team::run(&client, &ctx, cmd, out),
        Command::SshKey(cmd) => commands::ssh_key::run(&client, &ctx, cmd, out),
        Command::Vcs(cmd) => commands::vcs::run(&client, &ctx, cmd, out),
        Command::Var(cmd) => commands::variable::run(&client, &ctx, cmd, out),
        Command::Run(cmd) => commands::run::run(&client, &ctx, cmd, out),
        Command::Completions { .. } => Ok(()),
    }
}
