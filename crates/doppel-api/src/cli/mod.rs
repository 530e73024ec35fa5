//! CLI command definitions and dispatch for the `doppel` binary.
//!
//! Uses clap derive macros for argument parsing. Top-level commands map
//! one to one onto the engines: `chat`, `decide`, `tasks`, `imagine`,
//! `live`, with noun subcommands for the stored domains (`profile`,
//! `todo`) and session trash management.

pub mod chat;
pub mod decide;
pub mod live;
pub mod media;
pub mod profile;
pub mod session;
pub mod status;
pub mod tasks;
pub mod todo;
pub mod translate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Your digital twin: it chats, decides, and remembers like you.
#[derive(Parser)]
#[command(name = "doppel", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat with your twin.
    Chat {
        /// Resume a session by id (a unique prefix is enough).
        #[arg(long)]
        session: Option<String>,

        /// Open a prompt-lab session instead of a chat.
        #[arg(long)]
        lab: bool,
    },

    /// Show or edit the personality profile.
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// List sessions.
    #[command(alias = "ls")]
    Sessions {
        /// List the trash instead of active sessions.
        #[arg(long)]
        trash: bool,

        /// Only sessions of this kind (chat, prompt-lab).
        #[arg(long)]
        kind: Option<String>,
    },

    /// Move a session to the trash.
    #[command(alias = "rm")]
    Trash {
        /// Session id (a unique prefix is enough).
        id: String,
    },

    /// Restore a session from the trash.
    Restore {
        /// Session id (a unique prefix is enough).
        id: String,
    },

    /// Permanently delete everything in the trash.
    Purge {
        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Simulate a decision as yourself.
    Decide {
        /// The decision to make.
        question: String,

        /// Convene three adversarial experts instead of a solo verdict.
        #[arg(long)]
        experts: bool,
    },

    /// Browse past decisions.
    Decisions,

    /// Extract action items from text and add them to your todos.
    Tasks {
        /// The text to decompose.
        text: String,
    },

    /// Manage the todo list.
    Todo {
        #[command(subcommand)]
        action: TodoCommand,
    },

    /// Translate text.
    Translate {
        /// The text to translate.
        text: String,

        /// Target language (a plain name, e.g. "Japanese").
        #[arg(long)]
        to: String,
    },

    /// Generate an image or video from a prompt.
    Imagine {
        /// The generation prompt.
        prompt: String,

        /// Generate a video instead of an image.
        #[arg(long)]
        video: bool,

        /// Write the artifact to this file when possible.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Browse generated media.
    Gallery,

    /// Hold a live voice conversation from a PCM file.
    Live {
        /// 16 kHz mono s16le PCM file to stream as microphone input.
        #[arg(long)]
        input: PathBuf,

        /// Write the twin's 24 kHz reply audio to this PCM file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Browse live session transcripts.
    Recordings,

    /// System status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Show the full profile.
    Show,

    /// Add one entry to a category.
    Add {
        /// Category (values, traits, mental-models, habits, principles, interests).
        category: String,

        /// The entry text.
        entry: String,
    },

    /// Remove one entry from a category.
    Remove {
        /// Category (values, traits, mental-models, habits, principles, interests).
        category: String,

        /// The entry text to remove.
        entry: String,
    },

    /// Export the profile as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Import a profile snapshot from JSON, replacing the current one.
    Import {
        /// The JSON file to import.
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum TodoCommand {
    /// List todos.
    #[command(alias = "ls")]
    List,

    /// Add a todo.
    Add {
        /// The todo text.
        text: String,
    },

    /// Mark a todo done.
    Done {
        /// Todo id (a unique prefix is enough).
        id: String,
    },

    /// Remove all done todos.
    Clear,
}
