//! Doppel CLI entry point.
//!
//! Binary name: `doppel`
//!
//! Parses CLI arguments, initializes the data directory and services,
//! then dispatches to the command handlers.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, ProfileCommand, TodoCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,doppel=debug",
        _ => "trace",
    };
    doppel_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "doppel", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Chat { session, lab } => {
            cli::chat::loop_runner::run_chat_loop(&state, session, lab).await?;
        }

        Commands::Profile { action } => match action {
            ProfileCommand::Show => {
                cli::profile::show_profile(&state, cli.json).await?;
            }
            ProfileCommand::Add { category, entry } => {
                cli::profile::add_entry(&state, &category, &entry, cli.json).await?;
            }
            ProfileCommand::Remove { category, entry } => {
                cli::profile::remove_entry(&state, &category, &entry, cli.json).await?;
            }
            ProfileCommand::Export { out } => {
                cli::profile::export_profile(&state, out).await?;
            }
            ProfileCommand::Import { path } => {
                cli::profile::import_profile(&state, &path, cli.json).await?;
            }
        },

        Commands::Sessions { trash, kind } => {
            cli::session::list_sessions(&state, trash, kind, cli.json).await?;
        }

        Commands::Trash { id } => {
            cli::session::trash_session(&state, &id, cli.json).await?;
        }

        Commands::Restore { id } => {
            cli::session::restore_session(&state, &id, cli.json).await?;
        }

        Commands::Purge { force } => {
            cli::session::purge_sessions(&state, force, cli.json).await?;
        }

        Commands::Decide { question, experts } => {
            cli::decide::decide(&state, &question, experts, cli.json).await?;
        }

        Commands::Decisions => {
            cli::decide::list_decisions(&state, cli.json).await?;
        }

        Commands::Tasks { text } => {
            cli::tasks::extract_tasks(&state, &text, cli.json).await?;
        }

        Commands::Todo { action } => match action {
            TodoCommand::List => {
                cli::todo::list_todos(&state, cli.json).await?;
            }
            TodoCommand::Add { text } => {
                cli::todo::add_todo(&state, &text, cli.json).await?;
            }
            TodoCommand::Done { id } => {
                cli::todo::mark_done(&state, &id, cli.json).await?;
            }
            TodoCommand::Clear => {
                cli::todo::clear_done(&state, cli.json).await?;
            }
        },

        Commands::Translate { text, to } => {
            cli::translate::translate_text(&state, &text, &to, cli.json).await?;
        }

        Commands::Imagine { prompt, video, out } => {
            cli::media::imagine(&state, &prompt, video, out, cli.json).await?;
        }

        Commands::Gallery => {
            cli::media::list_gallery(&state, cli.json).await?;
        }

        Commands::Live { input, output } => {
            cli::live::run_live(&state, &input, output, cli.json).await?;
        }

        Commands::Recordings => {
            cli::live::list_recordings(&state, cli.json).await?;
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    doppel_observe::tracing_setup::shutdown_tracing();
    Ok(())
}
