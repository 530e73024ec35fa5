//! Media generation CLI commands: imagine and the gallery.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use doppel_types::gateway::MediaJobParams;
use doppel_types::twin::{GalleryItem, MediaKind};

use crate::cli::session::format_relative_time;
use crate::state::AppState;

/// Generate an image or a short video from a prompt.
pub async fn imagine(
    state: &AppState,
    prompt: &str,
    video: bool,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let ai = state.ai()?;
    let kind = if video {
        MediaKind::Video
    } else {
        MediaKind::Image
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} ({elapsed})")
            .unwrap(),
    );
    spinner.set_message(format!("generating {kind}..."));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let item = state
        .media
        .generate(
            &ai.gateway,
            MediaJobParams {
                kind,
                prompt: prompt.to_string(),
            },
        )
        .await;
    spinner.finish_and_clear();
    let item = item?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
        return Ok(());
    }

    println!(
        "  {} Generated {} {}",
        style("✓").green().bold(),
        kind,
        style(format!("[{}]", short_id(&item))).dim()
    );
    match out {
        Some(path) => save_artifact(&item.uri, &path).await?,
        None => println!("  {}", style(artifact_label(&item.uri)).dim()),
    }
    Ok(())
}

/// List everything in the gallery, newest first.
pub async fn list_gallery(state: &AppState, json: bool) -> Result<()> {
    let mut items = state.state_owner.gallery().await?;
    items.reverse();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!();
        println!(
            "  {} The gallery is empty. Generate something with {}",
            style("i").blue().bold(),
            style("doppel imagine \"a fox in watercolor\"").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Kind").fg(Color::White),
        Cell::new("Prompt").fg(Color::White),
        Cell::new("When").fg(Color::White),
        Cell::new("Artifact").fg(Color::White),
    ]);

    for item in &items {
        let kind_cell = match item.kind {
            MediaKind::Image => Cell::new("image").fg(Color::Cyan),
            MediaKind::Video => Cell::new("video").fg(Color::Magenta),
        };
        table.add_row(vec![
            kind_cell,
            Cell::new(truncate(&item.prompt, 48)),
            Cell::new(format_relative_time(&item.created_at)).fg(Color::DarkGrey),
            Cell::new(artifact_label(&item.uri)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} item(s)", style(items.len()).bold());
    println!();
    Ok(())
}

/// Save an inline artifact to disk; remote artifacts only print their URI.
async fn save_artifact(uri: &str, path: &Path) -> Result<()> {
    let Some((_, payload)) = split_data_uri(uri) else {
        println!(
            "  {} The artifact is hosted remotely; fetch it from:",
            style("!").yellow().bold()
        );
        println!("  {uri}");
        return Ok(());
    };

    let bytes = BASE64
        .decode(payload)
        .context("artifact data URI is not valid base64")?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "  {} Saved to {}",
        style("✓").green().bold(),
        style(path.display()).bold()
    );
    Ok(())
}

/// Split a `data:` URI into its mime type and base64 payload.
fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    Some((header.split(';').next().unwrap_or(header), payload))
}

/// Short human label for an artifact URI. Inline data URIs can run to
/// megabytes, so they are summarized rather than printed.
fn artifact_label(uri: &str) -> String {
    match split_data_uri(uri) {
        Some((mime, payload)) => {
            let kib = payload.len() * 3 / 4 / 1024;
            format!("{mime} inline ({kib} KiB); pass --out to save it")
        }
        None => truncate(uri, 56),
    }
}

fn short_id(item: &GalleryItem) -> String {
    item.id.simple().to_string()[..8].to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_data_uri() {
        let (mime, payload) = split_data_uri("data:image/png;base64,AAAA").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(payload, "AAAA");

        assert!(split_data_uri("https://example.com/fox.png").is_none());
        assert!(split_data_uri("data:no-comma-here").is_none());
    }

    #[test]
    fn test_artifact_label_summarizes_inline_data() {
        let label = artifact_label(&format!("data:video/mp4;base64,{}", "A".repeat(4096)));
        assert!(label.starts_with("video/mp4 inline (3 KiB)"));

        assert_eq!(
            artifact_label("https://example.com/fox.png"),
            "https://example.com/fox.png"
        );
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let text = "é".repeat(60);
        let cut = truncate(&text, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }
}
