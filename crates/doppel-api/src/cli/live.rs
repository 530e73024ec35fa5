//! Live voice session CLI commands.
//!
//! Without audio hardware plumbing, the session reads capture audio from
//! a raw PCM file and renders model audio onto a file-backed timeline, so
//! the whole duplex loop runs end to end from the terminal.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use tokio_util::sync::CancellationToken;

use doppel_infra::audio::{PcmFileSink, PcmFileSource};
use doppel_types::live::{LiveConfig, LiveRecord, Speaker};
use doppel_types::twin::POINTS_LIVE_SESSION;

use crate::cli::session::format_relative_time;
use crate::state::AppState;

/// Voice persona for the live channel. The profile context block is
/// appended when the profile has content.
const LIVE_SYSTEM_PROMPT: &str = "You are the user's digital twin on a voice call, \
speaking as them in the first person. Keep replies short and conversational; \
this is spoken audio, not prose.";

/// Run one live session against a PCM capture file.
pub async fn run_live(
    state: &AppState,
    input: &Path,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let ai = state.ai()?;

    let mic = PcmFileSource::load(input)
        .await
        .with_context(|| format!("failed to read capture audio from {}", input.display()))?;
    let speaker = PcmFileSink::new();

    let profile = state.state_owner.profile().await?;
    let system = match profile.context_block() {
        Some(block) => format!("{LIVE_SYSTEM_PROMPT}\n\n{block}"),
        None => LIVE_SYSTEM_PROMPT.to_string(),
    };
    let config = LiveConfig {
        model: state.config.models.live.clone(),
        system: Some(system),
    };

    // Ctrl-C hangs up instead of killing the process mid-session.
    let stop = CancellationToken::new();
    let canceller = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    if !json {
        println!();
        println!(
            "  {} Live with your twin (model {})",
            style("●").red().bold(),
            style(&state.config.models.live).cyan()
        );
        println!(
            "  {} Streaming {:.1}s of audio from {}. Press Ctrl-C to hang up.",
            style("i").blue().bold(),
            mic.remaining_secs(),
            style(input.display()).bold()
        );
        println!();
    }

    let outcome = state
        .live
        .run(&ai.gateway, config, mic, &speaker, stop)
        .await?;

    if let Some(path) = &output {
        speaker
            .write_to(path)
            .await
            .with_context(|| format!("failed to write model audio to {}", path.display()))?;
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "record": outcome.record,
                "status": outcome.status,
                "playback_secs": speaker.duration_secs(),
            })
        );
        return Ok(());
    }

    match &outcome.record {
        Some(record) => {
            for turn in &record.turns {
                let label = match turn.speaker {
                    Speaker::User => style("You >").green().bold(),
                    Speaker::Model => style("Doppel >").cyan().bold(),
                };
                println!("  {label} {}", turn.text);
            }
            println!();
            println!(
                "  {} Recorded {:.0}s live session {} {}",
                style("✓").green().bold(),
                record.duration_secs,
                style(format!("[{}]", short_id(record))).dim(),
                style(format!("+{POINTS_LIVE_SESSION} points")).dim()
            );
        }
        None => println!(
            "  {} Nothing was transcribed; the session was not recorded.",
            style("i").blue().bold()
        ),
    }
    if let Some(status) = &outcome.status {
        println!("  {}", style(format!("(closed: {status})")).dim());
    }
    if let Some(path) = &output {
        println!(
            "  {} Wrote {:.1}s of model audio to {}",
            style("✓").green().bold(),
            speaker.duration_secs(),
            style(path.display()).bold()
        );
    }
    println!();
    Ok(())
}

/// List recorded live sessions, newest first.
pub async fn list_recordings(state: &AppState, json: bool) -> Result<()> {
    let mut records = state.state_owner.live_records().await?;
    records.reverse();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No recordings yet. Start one with {}",
            style("i").blue().bold(),
            style("doppel live --input conversation.pcm").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("When").fg(Color::White),
        Cell::new("Length").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
        Cell::new("Opening").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);

    for record in &records {
        let opening = record
            .turns
            .first()
            .map(|turn| truncate(&turn.text, 48))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(format_relative_time(&record.started_at)),
            Cell::new(format!("{:.0}s", record.duration_secs)),
            Cell::new(record.turns.len()),
            Cell::new(opening),
            Cell::new(short_id(record)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} recording(s)", style(records.len()).bold());
    println!();
    Ok(())
}

fn short_id(record: &LiveRecord) -> String {
    record.id.simple().to_string()[..8].to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
