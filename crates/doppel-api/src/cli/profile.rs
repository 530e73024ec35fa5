//! Profile CLI commands: show, add, remove, export, import.
//!
//! Direct edits and snapshot import go through the state owner, which
//! sanitizes and stamps `updated_at`; this module only renders.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use console::style;

use doppel_types::profile::{Profile, ProfileCategory};

use crate::state::AppState;

/// Show the full profile, one section per category.
pub async fn show_profile(state: &AppState, json: bool) -> Result<()> {
    let profile = state.state_owner.profile().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    if profile.is_empty() {
        println!();
        println!(
            "  {} Your profile is empty. Chat with {} and run {} to build it,",
            style("i").blue().bold(),
            style("doppel chat").yellow(),
            style("/analyze").yellow()
        );
        println!(
            "  or add entries directly: {}",
            style("doppel profile add values \"directness\"").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  {}", style("Your profile").cyan().bold());
    println!();
    for category in ProfileCategory::ALL {
        let entries = profile.entries(category);
        if entries.is_empty() {
            continue;
        }
        println!("  {}", style(format!("── {} ──", category.label())).dim());
        for entry in entries {
            println!("  {} {}", style("•").dim(), entry);
        }
        println!();
    }
    if let Some(updated_at) = &profile.updated_at {
        println!(
            "  {}",
            style(format!(
                "Updated {}",
                super::session::format_relative_time(updated_at)
            ))
            .dim()
        );
        println!();
    }

    Ok(())
}

/// Add one entry to a category.
pub async fn add_entry(state: &AppState, category: &str, entry: &str, json: bool) -> Result<()> {
    let category = parse_category(category)?;
    let profile = state.state_owner.add_profile_entry(category, entry).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "  {} Added to {}: {} ({} entr{})",
            style("✓").green().bold(),
            style(category.label()).bold(),
            entry,
            profile.entries(category).len(),
            if profile.entries(category).len() == 1 { "y" } else { "ies" }
        );
    }
    Ok(())
}

/// Remove one entry from a category.
pub async fn remove_entry(state: &AppState, category: &str, entry: &str, json: bool) -> Result<()> {
    let category = parse_category(category)?;

    let before = state.state_owner.profile().await?;
    if !before.entries(category).iter().any(|e| e == entry) {
        println!(
            "  {} '{}' is not in {}.",
            style("!").yellow().bold(),
            entry,
            style(category.label()).bold()
        );
        return Ok(());
    }

    let profile = state
        .state_owner
        .remove_profile_entry(category, entry)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "  {} Removed from {}: {}",
            style("✓").green().bold(),
            style(category.label()).bold(),
            entry
        );
    }
    Ok(())
}

/// Export the profile as pretty JSON, to a file or stdout.
pub async fn export_profile(state: &AppState, out: Option<PathBuf>) -> Result<()> {
    let profile = state.state_owner.profile().await?;
    let rendered = serde_json::to_string_pretty(&profile)?;

    match out {
        Some(path) => {
            tokio::fs::write(&path, rendered.as_bytes())
                .await
                .with_context(|| format!("could not write {}", path.display()))?;
            println!(
                "  {} Exported profile to {}",
                style("✓").green().bold(),
                style(path.display()).bold()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Import a profile snapshot, replacing the current profile.
pub async fn import_profile(state: &AppState, path: &Path, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read {}", path.display()))?;
    let snapshot: Profile =
        serde_json::from_str(&raw).with_context(|| format!("invalid profile JSON in {}", path.display()))?;

    let profile = state.state_owner.replace_profile(snapshot).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        let total: usize = ProfileCategory::ALL
            .iter()
            .map(|c| profile.entries(*c).len())
            .sum();
        println!(
            "  {} Imported profile: {} entr{} across 6 categories.",
            style("✓").green().bold(),
            style(total).bold(),
            if total == 1 { "y" } else { "ies" }
        );
    }
    Ok(())
}

fn parse_category(raw: &str) -> Result<ProfileCategory> {
    raw.parse::<ProfileCategory>().map_err(|e| {
        anyhow::anyhow!(
            "{e} (expected one of: values, traits, mental-models, habits, principles, interests)"
        )
    })
}
