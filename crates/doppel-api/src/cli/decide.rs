//! Decision simulation CLI commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::chat::renderer::ChatRenderer;
use crate::cli::session::format_relative_time;
use crate::state::AppState;

/// Simulate a decision and print the persisted record.
pub async fn decide(state: &AppState, question: &str, experts: bool, json: bool) -> Result<()> {
    let ai = state.ai()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(if experts {
        "convening the panel..."
    } else {
        "deliberating..."
    });
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let record = ai.simulator.simulate(question, experts).await;
    spinner.finish_and_clear();
    let record = record?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let renderer = ChatRenderer::new();

    println!();
    println!("  {} {}", style("?").cyan().bold(), style(&record.question).bold());
    println!();
    for line in renderer.render(&record.decision).trim_end().lines() {
        println!("  {line}");
    }
    println!();

    for expert in &record.experts {
        println!(
            "  {}",
            style(format!("── {} ({}) ──", expert.role, expert.style)).dim()
        );
        for line in renderer.render(&expert.opinion).trim_end().lines() {
            println!("  {line}");
        }
        println!();
    }

    println!("  {}", style("Recorded. +5 points").dim());
    println!();
    Ok(())
}

/// List past decision records, newest first.
pub async fn list_decisions(state: &AppState, json: bool) -> Result<()> {
    let mut records = state.state_owner.decisions().await?;
    records.reverse();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No decisions yet. Try: {}",
            style("i").blue().bold(),
            style("doppel decide \"should I take the job?\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("When").fg(Color::White),
        Cell::new("Question").fg(Color::White),
        Cell::new("Mode").fg(Color::White),
        Cell::new("Verdict").fg(Color::White),
    ]);

    for record in &records {
        let mode = if record.experts.is_empty() {
            Cell::new("solo").fg(Color::Cyan)
        } else {
            Cell::new("panel").fg(Color::Magenta)
        };
        table.add_row(vec![
            Cell::new(format_relative_time(&record.created_at)).fg(Color::DarkGrey),
            Cell::new(truncate(&record.question, 48)),
            mode,
            Cell::new(truncate(&record.decision, 60)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} decision{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
