//! Session CLI commands: list, trash, restore, purge.
//!
//! Sessions are addressed by id prefix (hyphens optional), resolved
//! against the relevant partition. Purge is the only permanent
//! operation and asks for confirmation.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use doppel_core::session::SessionFilter;
use doppel_types::session::{Session, SessionKind, SessionState};

use crate::state::AppState;

/// List sessions from the active partition or the trash.
pub async fn list_sessions(
    state: &AppState,
    trash: bool,
    kind: Option<String>,
    json: bool,
) -> Result<()> {
    let mut filter = if trash {
        SessionFilter::trash()
    } else {
        SessionFilter::active()
    };
    if let Some(kind) = kind {
        let kind = kind.parse::<SessionKind>().map_err(|e| anyhow::anyhow!(e))?;
        filter = filter.with_kind(kind);
    }

    let sessions = state.sessions.list(filter).await?;

    if json {
        let summaries: Vec<_> = sessions.iter().map(summary_json).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        if trash {
            println!("  {} Trash is empty.", style("i").blue().bold());
        } else {
            println!(
                "  {} No sessions yet. Start one with: {}",
                style("i").blue().bold(),
                style("doppel chat").yellow()
            );
        }
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ];
    if trash {
        header.insert(4, Cell::new("Deleted").fg(Color::White));
    }
    table.set_header(header);

    for session in &sessions {
        let kind_cell = match session.kind {
            SessionKind::Chat => Cell::new("chat").fg(Color::Cyan),
            SessionKind::PromptLab => Cell::new("prompt lab").fg(Color::Magenta),
        };
        let mut row = vec![
            Cell::new(&session.title),
            kind_cell,
            Cell::new(session.messages.len()),
            Cell::new(format_relative_time(&session.updated_at)).fg(Color::DarkGrey),
            Cell::new(short_id(session)).fg(Color::DarkGrey),
        ];
        if trash {
            let deleted = match session.state {
                SessionState::Deleted { deleted_at } => format_relative_time(&deleted_at),
                SessionState::Active => String::new(),
            };
            row.insert(4, Cell::new(deleted).fg(Color::Red));
        }
        table.add_row(row);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" },
        if trash { " in the trash" } else { "" }
    );
    println!();

    Ok(())
}

/// Move a session to the trash.
pub async fn trash_session(state: &AppState, id: &str, json: bool) -> Result<()> {
    let session = resolve_session(state, id, SessionFilter::active()).await?;
    state.sessions.soft_delete(session.id).await?;

    if json {
        println!("{}", serde_json::json!({"trashed": true, "id": session.id}));
    } else {
        println!(
            "  {} Moved '{}' to the trash. Restore with: {}",
            style("✓").green().bold(),
            session.title,
            style(format!("doppel restore {}", short_id(&session))).yellow()
        );
    }
    Ok(())
}

/// Restore a session from the trash.
pub async fn restore_session(state: &AppState, id: &str, json: bool) -> Result<()> {
    let session = resolve_session(state, id, SessionFilter::trash()).await?;
    state.sessions.restore(session.id).await?;

    if json {
        println!("{}", serde_json::json!({"restored": true, "id": session.id}));
    } else {
        println!(
            "  {} Restored '{}'.",
            style("✓").green().bold(),
            session.title
        );
    }
    Ok(())
}

/// Permanently delete everything in the trash.
pub async fn purge_sessions(state: &AppState, force: bool, json: bool) -> Result<()> {
    let trashed = state.sessions.list(SessionFilter::trash()).await?;
    if trashed.is_empty() {
        if json {
            println!("{}", serde_json::json!({"purged": 0}));
        } else {
            println!("  {} Trash is already empty.", style("i").blue().bold());
        }
        return Ok(());
    }

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete {} trashed session{}? This cannot be undone.",
                style(trashed.len()).red().bold(),
                if trashed.len() == 1 { "" } else { "s" }
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let purged = state.sessions.purge_deleted().await?;

    if json {
        println!("{}", serde_json::json!({"purged": purged}));
    } else {
        println!(
            "  {} Purged {} session{}.",
            style("✓").red().bold(),
            purged,
            if purged == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Resolve an id prefix to exactly one session in the given partition.
///
/// Accepts prefixes with or without hyphens, case-insensitive.
pub async fn resolve_session(
    state: &AppState,
    prefix: &str,
    filter: SessionFilter,
) -> Result<Session> {
    let needle = prefix.replace('-', "").to_lowercase();
    if needle.is_empty() {
        anyhow::bail!("empty session id");
    }

    let sessions = state.sessions.list(filter).await?;
    let mut matches: Vec<Session> = sessions
        .into_iter()
        .filter(|s| s.id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("no session matches '{prefix}'"),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(short_id).collect();
            anyhow::bail!("'{prefix}' is ambiguous: {n} sessions match ({})", ids.join(", "))
        }
    }
}

fn summary_json(session: &Session) -> serde_json::Value {
    serde_json::json!({
        "id": session.id,
        "title": session.title,
        "kind": session.kind,
        "state": session.state,
        "messages": session.messages.len(),
        "created_at": session.created_at,
        "updated_at": session.updated_at,
    })
}

fn short_id(session: &Session) -> String {
    session.id.simple().to_string()[..8].to_string()
}

pub(crate) fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
