//! Todo list CLI commands: list, add, done, clear.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use doppel_types::twin::TodoItem;

use crate::cli::session::format_relative_time;
use crate::state::AppState;

/// List all todos, open ones first.
pub async fn list_todos(state: &AppState, json: bool) -> Result<()> {
    let todos = state.state_owner.todos().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&todos)?);
        return Ok(());
    }

    if todos.is_empty() {
        println!();
        println!(
            "  {} No todos. Add one with {} or extract some with {}",
            style("i").blue().bold(),
            style("doppel todo add \"...\"").yellow(),
            style("doppel tasks \"...\"").yellow()
        );
        println!();
        return Ok(());
    }

    let (open, done): (Vec<&TodoItem>, Vec<&TodoItem>) =
        todos.iter().partition(|t| !t.done);

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("Task").fg(Color::White),
        Cell::new("Added").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);

    for item in open.iter().chain(done.iter()) {
        let (mark, text_cell) = if item.done {
            (
                Cell::new("✓").fg(Color::Green),
                Cell::new(&item.text).fg(Color::DarkGrey),
            )
        } else {
            (Cell::new("○"), Cell::new(&item.text))
        };
        table.add_row(vec![
            mark,
            text_cell,
            Cell::new(format_relative_time(&item.created_at)).fg(Color::DarkGrey),
            Cell::new(short_id(item)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} open, {} done",
        style(open.len()).bold(),
        style(done.len()).dim()
    );
    println!();
    Ok(())
}

/// Add a single todo.
pub async fn add_todo(state: &AppState, text: &str, json: bool) -> Result<()> {
    let added = state.state_owner.add_todos(vec![text.to_string()]).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&added)?);
    } else {
        println!("  {} Added: {}", style("✓").green().bold(), text);
    }
    Ok(())
}

/// Mark a todo done, addressed by id prefix.
pub async fn mark_done(state: &AppState, id: &str, json: bool) -> Result<()> {
    let item = resolve_todo(state, id).await?;
    state.state_owner.set_todo_done(item.id, true).await?;

    if json {
        println!("{}", serde_json::json!({"done": true, "id": item.id}));
    } else {
        println!("  {} Done: {}", style("✓").green().bold(), item.text);
    }
    Ok(())
}

/// Remove all done todos.
pub async fn clear_done(state: &AppState, json: bool) -> Result<()> {
    let cleared = state.state_owner.clear_done_todos().await?;

    if json {
        println!("{}", serde_json::json!({"cleared": cleared}));
    } else if cleared == 0 {
        println!("  {} Nothing to clear.", style("i").blue().bold());
    } else {
        println!(
            "  {} Cleared {} done todo{}.",
            style("✓").green().bold(),
            cleared,
            if cleared == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Resolve an id prefix to exactly one todo.
async fn resolve_todo(state: &AppState, prefix: &str) -> Result<TodoItem> {
    let needle = prefix.replace('-', "").to_lowercase();
    if needle.is_empty() {
        anyhow::bail!("empty todo id");
    }

    let todos = state.state_owner.todos().await?;
    let mut matches: Vec<TodoItem> = todos
        .into_iter()
        .filter(|t| t.id.simple().to_string().starts_with(&needle))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("no todo matches '{prefix}'"),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("'{prefix}' is ambiguous: {n} todos match"),
    }
}

fn short_id(item: &TodoItem) -> String {
    item.id.simple().to_string()[..8].to_string()
}
