//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: session resolution, welcome
//! banner, the input loop, slash commands, per-turn option toggles, and
//! reply rendering. Sessions are created lazily on the first message.

use std::path::Path;
use std::time::Instant;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use uuid::Uuid;

use doppel_core::session::SessionFilter;
use doppel_core::turn::{TurnOptions, TurnOutcome};
use doppel_types::error::TurnError;
use doppel_types::session::{Attachment, ChatMessage, MessageRole, Session, SessionKind};

use crate::cli::session::resolve_session;
use crate::state::AppState;

use super::banner::{print_welcome_banner, short_id};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

/// Run the interactive chat loop.
pub async fn run_chat_loop(
    state: &AppState,
    resume: Option<String>,
    lab: bool,
) -> anyhow::Result<()> {
    let ai = state.ai()?;

    let resumed = match resume {
        Some(prefix) => Some(resolve_session(state, &prefix, SessionFilter::active()).await?),
        None => None,
    };
    let kind = resumed.as_ref().map(|s| s.kind).unwrap_or(if lab {
        SessionKind::PromptLab
    } else {
        SessionKind::Chat
    });

    print_welcome_banner(kind, &state.config.models.reasoning, resumed.as_ref());
    if let Some(session) = &resumed {
        print_recent_history(session);
    }

    let renderer = ChatRenderer::new();
    let mut current: Option<Uuid> = resumed.map(|s| s.id);
    let mut reasoning = false;
    let mut grounding = false;
    let mut pending_attachment: Option<Attachment> = None;

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("failed to initialize input: {e}"))?;

    loop {
        let event = chat_input.read_line().await;
        match event {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                // Slash commands
                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => {
                            commands::print_help();
                            continue;
                        }
                        ChatCommand::Clear => {
                            chat_input.clear();
                            continue;
                        }
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                        ChatCommand::New => {
                            current = None;
                            println!(
                                "\n  {} Next message starts a fresh session.\n",
                                style("*").cyan().bold()
                            );
                            continue;
                        }
                        ChatCommand::History => {
                            match current {
                                Some(id) => match state.sessions.get(id).await? {
                                    Some(session) => print_full_history(&session),
                                    None => print_notice("This session no longer exists."),
                                },
                                None => print_notice("No conversation yet."),
                            }
                            continue;
                        }
                        ChatCommand::Regenerate => {
                            match current {
                                Some(id) => {
                                    let spinner = thinking_spinner("thinking...");
                                    let started = Instant::now();
                                    let result = ai.turns.regenerate(id).await;
                                    spinner.finish_and_clear();
                                    render_turn_result(&renderer, result, started);
                                }
                                None => print_notice("No conversation yet."),
                            }
                            continue;
                        }
                        ChatCommand::Analyze => {
                            match current {
                                Some(id) => {
                                    let spinner = thinking_spinner("analyzing...");
                                    match ai.turns.analyze_session(id).await {
                                        Ok(profile) => {
                                            spinner.finish_and_clear();
                                            let total: usize =
                                                doppel_types::profile::ProfileCategory::ALL
                                                    .iter()
                                                    .map(|c| profile.entries(*c).len())
                                                    .sum();
                                            println!(
                                                "\n  {} Profile updated: {} entr{} across 6 categories. {}\n",
                                                style("✓").green().bold(),
                                                style(total).bold(),
                                                if total == 1 { "y" } else { "ies" },
                                                style("+10 points").dim()
                                            );
                                        }
                                        Err(e) => {
                                            spinner.finish_and_clear();
                                            print_error(&e.to_string());
                                        }
                                    }
                                }
                                None => print_notice("No conversation to analyze yet."),
                            }
                            continue;
                        }
                        ChatCommand::Reason => {
                            reasoning = !reasoning;
                            print_toggle("Extended reasoning", reasoning);
                            continue;
                        }
                        ChatCommand::Ground => {
                            grounding = !grounding;
                            print_toggle("Web-search grounding", grounding);
                            continue;
                        }
                        ChatCommand::Attach(path) => {
                            match load_attachment(&path).await {
                                Ok((attachment, size)) => {
                                    println!(
                                        "\n  {} Attached {} ({:.1} KB); it rides on your next message.\n",
                                        style("*").cyan().bold(),
                                        style(&attachment.name).bold(),
                                        size as f64 / 1024.0
                                    );
                                    pending_attachment = Some(attachment);
                                }
                                Err(e) => {
                                    warn!(error = %e, "Attachment load failed");
                                    print_error(&format!("{e:#}"));
                                }
                            }
                            continue;
                        }
                        ChatCommand::Unknown(cmd_name) => {
                            println!(
                                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                                style("?").yellow().bold(),
                                style(cmd_name).dim()
                            );
                            continue;
                        }
                    }
                }

                // Regular message: create the session on first send.
                let session_id = match current {
                    Some(id) => id,
                    None => {
                        let session = ai.turns.start_session(kind).await?;
                        info!(session_id = %session.id, kind = %session.kind, "Session started");
                        println!(
                            "  {}",
                            style(format!("(started session {})", short_id(&session))).dim()
                        );
                        current = Some(session.id);
                        session.id
                    }
                };

                let options = TurnOptions {
                    reasoning,
                    grounding,
                    attachment: pending_attachment.take(),
                };

                let spinner = thinking_spinner("thinking...");
                let started = Instant::now();
                let result = ai.turns.send(session_id, text, options).await;
                spinner.finish_and_clear();
                render_turn_result(&renderer, result, started);
            }
        }
    }

    Ok(())
}

fn thinking_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Print a completed turn, a busy notice, or an error.
fn render_turn_result(
    renderer: &ChatRenderer,
    result: Result<TurnOutcome, TurnError>,
    started: Instant,
) {
    match result {
        Ok(TurnOutcome::Completed(reply)) => {
            println!();
            println!("  {}", style("Doppel >").cyan().bold());
            renderer.print_reply(&reply.text, &reply.citations);

            let mut notes = vec![format!("{:.1}s", started.elapsed().as_secs_f64())];
            if reply.deep_reasoning {
                notes.push("reasoned".to_string());
            }
            if !reply.citations.is_empty() {
                notes.push("grounded".to_string());
            }
            println!();
            println!("  {}", style(notes.join(" · ")).dim());
            println!();
        }
        Ok(TurnOutcome::Busy) => {
            print_notice("Your twin is still answering; wait for the current turn.");
        }
        Err(TurnError::NothingToRegenerate) => {
            print_notice("Nothing to regenerate yet.");
        }
        Err(e) => print_error(&e.to_string()),
    }
}

fn print_notice(message: &str) {
    println!("\n  {} {message}\n", style("!").yellow().bold());
}

fn print_error(message: &str) {
    eprintln!("\n  {} {message}\n", style("!").red().bold());
}

fn print_toggle(label: &str, enabled: bool) {
    let value = if enabled {
        style("on").green().bold()
    } else {
        style("off").dim()
    };
    println!("\n  {} {label}: {value}\n", style("*").cyan().bold());
}

/// Tail of the resumed conversation, so the user remembers where they were.
fn print_recent_history(session: &Session) {
    let skip = session.messages.len().saturating_sub(4);
    for message in &session.messages[skip..] {
        print_message_line(message);
    }
    if !session.messages.is_empty() {
        println!();
    }
}

fn print_full_history(session: &Session) {
    println!();
    for message in &session.messages {
        print_message_line(message);
    }
    println!();
}

fn print_message_line(message: &ChatMessage) {
    let label = match message.role {
        MessageRole::User => format!("{}", style("You").green().bold()),
        MessageRole::Model => format!("{}", style("Doppel").cyan().bold()),
        MessageRole::System => format!("{}", style("note").dim()),
    };
    println!("  {label} {}", preview(&message.text, 100));
}

/// Char-boundary-safe preview with an ellipsis.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Read a file and wrap it as an attachment, sniffing the kind from its
/// extension. Returns the attachment and the raw byte size.
async fn load_attachment(path_str: &str) -> anyhow::Result<(Attachment, usize)> {
    let path = Path::new(path_str);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("could not read {path_str}"))?;
    let size = bytes.len();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let data = BASE64.encode(&bytes);

    let attachment = match ext.as_str() {
        "png" => Attachment::image("image/png", data, name),
        "jpg" | "jpeg" => Attachment::image("image/jpeg", data, name),
        "webp" => Attachment::image("image/webp", data, name),
        "gif" => Attachment::image("image/gif", data, name),
        "pdf" => Attachment::file("application/pdf", data, name),
        "txt" => Attachment::file("text/plain", data, name),
        "md" => Attachment::file("text/markdown", data, name),
        _ => Attachment::file("application/octet-stream", data, name),
    };
    Ok((attachment, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_char_boundary() {
        assert_eq!(preview("short", 100), "short");
        let long = "é".repeat(150);
        let cut = preview(&long, 100);
        assert_eq!(cut.chars().count(), 101);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("a\nb\nc", 100), "a b c");
    }
}
