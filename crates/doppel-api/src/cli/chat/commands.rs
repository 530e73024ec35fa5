//! Slash command parsing and execution for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for the session,
//! per-turn options, and profile analysis.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Start a new session on the next message.
    New,
    /// Show conversation history for this session.
    History,
    /// Redo the latest exchange.
    Regenerate,
    /// Distill this conversation into the profile.
    Analyze,
    /// Toggle extended reasoning for upcoming turns.
    Reason,
    /// Toggle web-search grounding for upcoming turns.
    Ground,
    /// Attach a file to the next message.
    Attach(String),
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim().to_string());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/regenerate" | "/redo" => Some(ChatCommand::Regenerate),
        "/analyze" => Some(ChatCommand::Analyze),
        "/reason" => Some(ChatCommand::Reason),
        "/ground" => Some(ChatCommand::Ground),
        "/attach" => match arg {
            Some(path) if !path.is_empty() => Some(ChatCommand::Attach(path)),
            _ => Some(ChatCommand::Unknown("/attach requires a file path".to_string())),
        },
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}        {}", style("/help").cyan(), "Show this help message");
    println!("  {}       {}", style("/clear").cyan(), "Clear the screen");
    println!("  {}        {}", style("/exit").cyan(), "End the chat session");
    println!("  {}         {}", style("/new").cyan(), "Start a new session on the next message");
    println!("  {}     {}", style("/history").cyan(), "Show this session's messages");
    println!("  {}  {}", style("/regenerate").cyan(), "Redo the latest exchange");
    println!("  {}     {}", style("/analyze").cyan(), "Update your profile from this conversation");
    println!("  {}      {}", style("/reason").cyan(), "Toggle extended reasoning");
    println!("  {}      {}", style("/ground").cyan(), "Toggle web-search grounding");
    println!("  {}      {}", style("/attach").cyan(), "Attach a file to the next message");
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
