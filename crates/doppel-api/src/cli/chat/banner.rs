//! Welcome banner display for chat sessions.

use console::style;

use doppel_types::session::{Session, SessionKind};

/// Print the banner at the start of a chat session.
///
/// Shows the session kind, the model the conversation will run on, and
/// whether this resumes an existing session or starts lazily on the
/// first message.
pub fn print_welcome_banner(kind: SessionKind, model: &str, resumed: Option<&Session>) {
    let tagline = match kind {
        SessionKind::Chat => "Chatting as your twin.",
        SessionKind::PromptLab => "Prompt lab: a scratchpad for trying prompts.",
    };

    println!();
    println!("  {} {}", style("⚡").bold(), style("Doppel").cyan().bold());
    println!("  {}", style(tagline).dim());
    println!();
    println!("  {}    {}", style("Model:").bold(), style(model).dim());
    match resumed {
        Some(session) => {
            println!(
                "  {}  {} {}",
                style("Session:").bold(),
                session.title,
                style(format!("({})", short_id(session))).dim()
            );
        }
        None => {
            println!(
                "  {}  {}",
                style("Session:").bold(),
                style("new (created on your first message)").dim()
            );
        }
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// First 8 hex chars of the session id, enough to resume with `--session`.
pub fn short_id(session: &Session) -> String {
    session.id.simple().to_string()[..8].to_string()
}
