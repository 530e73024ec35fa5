//! Task extraction CLI command.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state::AppState;

/// Extract action items from text and append them to the todo list.
pub async fn extract_tasks(state: &AppState, text: &str, json: bool) -> Result<()> {
    let ai = state.ai()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("extracting actions...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let tasks = ai.extractor.extract(text).await;
    spinner.finish_and_clear();
    let tasks = tasks?;

    if tasks.is_empty() {
        if json {
            println!("{}", serde_json::json!({"tasks": [], "added": 0}));
        } else {
            println!("  {} Nothing actionable found.", style("i").blue().bold());
        }
        return Ok(());
    }

    let added = state.state_owner.add_todos(tasks.clone()).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "tasks": tasks,
                "added": added.len(),
            }))?
        );
        return Ok(());
    }

    println!();
    for item in &added {
        println!("  {} {}", style("+").green().bold(), item.text);
    }
    println!();
    println!(
        "  {} task{} added to your todos. See them with: {}",
        style(added.len()).bold(),
        if added.len() == 1 { "" } else { "s" },
        style("doppel todo list").yellow()
    );
    println!();
    Ok(())
}
