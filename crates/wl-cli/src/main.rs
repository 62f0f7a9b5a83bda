use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wl_cli::commands::{Workspace, cache, commit, edit, list, start};
use wl_cli::{Cli, Commands, Config};

/// Load config and apply the global overrides.
fn open_workspace(cli: &Cli) -> Result<Workspace> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Workspace::new(config, cli.file.clone(), cli.now)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut out = io::stdout().lock();

    match &cli.command {
        Some(Commands::Start {
            issue,
            comment,
            time,
            continue_last,
        }) => {
            let workspace = open_workspace(&cli)?;
            start::start(
                &mut out,
                &workspace,
                issue.as_deref(),
                comment,
                time.as_deref(),
                *continue_last,
            )?;
        }
        Some(Commands::Log {
            args,
            continue_last,
        }) => {
            let workspace = open_workspace(&cli)?;
            start::log(&mut out, &workspace, args, *continue_last)?;
        }
        Some(Commands::Stop { time }) => {
            let workspace = open_workspace(&cli)?;
            edit::stop(&mut out, &workspace, time.as_deref())?;
        }
        Some(Commands::Edit { time }) => {
            let workspace = open_workspace(&cli)?;
            edit::time(&mut out, &workspace, time.as_deref(), false, false)?;
        }
        Some(Commands::Time {
            time,
            insert_break,
            start: edit_start,
        }) => {
            let workspace = open_workspace(&cli)?;
            edit::time(
                &mut out,
                &workspace,
                time.as_deref(),
                *insert_break,
                *edit_start,
            )?;
        }
        Some(Commands::Delete) => {
            let workspace = open_workspace(&cli)?;
            edit::delete(&mut out, &workspace)?;
        }
        Some(Commands::Comment { comment, append }) => {
            let workspace = open_workspace(&cli)?;
            edit::comment(&mut out, &workspace, comment, *append)?;
        }
        Some(Commands::Issue { args }) => {
            let workspace = open_workspace(&cli)?;
            edit::issue(&mut out, &workspace, args)?;
        }
        Some(Commands::List {
            all,
            combine,
            no_breaks,
            breaks,
            summaries,
            json,
        }) => {
            let workspace = open_workspace(&cli)?;
            let options = list::ListOptions {
                all: *all,
                combine: *combine,
                breaks: *breaks || !(*all || *combine || *no_breaks),
                summaries: *summaries,
                json: *json,
            };
            list::run(&mut out, &workspace, &options)?;
        }
        Some(Commands::Commit { yes }) => {
            let workspace = open_workspace(&cli)?;
            commit::run(&mut out, &workspace, *yes)?;
        }
        Some(Commands::Current) => {
            let workspace = open_workspace(&cli)?;
            list::current(&mut out, &workspace)?;
        }
        Some(Commands::ClearCache) => {
            let workspace = open_workspace(&cli)?;
            cache::clear(&mut out, &workspace)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
