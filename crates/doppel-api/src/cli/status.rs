//! System status dashboard command.

use anyhow::Result;
use console::style;

use doppel_core::session::SessionFilter;
use doppel_infra::secret::resolve_api_key;
use doppel_types::profile::ProfileCategory;

use crate::cli::session::format_relative_time;
use crate::state::AppState;

/// Display the status dashboard.
///
/// Works without an API key: everything here comes from local state.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    // Gather stats
    let active = state.sessions.list(SessionFilter::active()).await?.len();
    let trashed = state.sessions.list(SessionFilter::trash()).await?.len();

    let profile = state.state_owner.profile().await?;
    let profile_entries: usize = ProfileCategory::ALL
        .iter()
        .map(|category| profile.entries(*category).len())
        .sum();

    let todos = state.state_owner.todos().await?;
    let todos_open = todos.iter().filter(|todo| !todo.done).count();
    let todos_done = todos.len() - todos_open;

    let points = state.state_owner.points().await?;
    let decisions = state.state_owner.decisions().await?.len();
    let recordings = state.state_owner.live_records().await?.len();
    let gallery = state.state_owner.gallery().await?.len();
    let key_configured = resolve_api_key().is_ok();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "api_key_configured": key_configured,
            "sessions": {
                "active": active,
                "trash": trashed,
            },
            "profile_entries": profile_entries,
            "points": points.total,
            "todos": {
                "open": todos_open,
                "done": todos_done,
            },
            "decisions": decisions,
            "recordings": recordings,
            "gallery": gallery,
            "models": {
                "fast": state.config.models.fast,
                "reasoning": state.config.models.reasoning,
                "live": state.config.models.live,
                "image": state.config.models.image,
                "video": state.config.models.video,
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Doppel v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    // Twin state
    println!("  {}", style("── Twin ──").dim());
    if profile_entries == 0 {
        println!(
            "  Profile: {} ({} in a chat to build it)",
            style("empty").yellow(),
            style("/analyze").yellow()
        );
    } else {
        println!("  Profile: {} entries", style(profile_entries).bold());
    }
    println!("  Points:  {}", style(points.total).bold());
    if let Some(last) = points.entries.last() {
        println!(
            "  {}",
            style(format!(
                "latest: +{} for {} ({})",
                last.delta,
                last.reason,
                format_relative_time(&last.at)
            ))
            .dim()
        );
    }
    println!();

    // Sessions
    println!("  {}", style("── Sessions ──").dim());
    println!("  Active: {}", style(active).green());
    if trashed > 0 {
        println!("  Trash:  {}", style(trashed).dim());
    }
    println!();

    // Activity counts
    println!("  {}", style("── Activity ──").dim());
    println!("  Decisions:  {decisions}");
    println!("  Recordings: {recordings}");
    println!("  Gallery:    {gallery}");
    println!(
        "  Todos:      {} open, {} done",
        style(todos_open).bold(),
        todos_done
    );
    println!();

    // Models
    println!("  {}", style("── Models ──").dim());
    println!("  Fast:      {}", style(&state.config.models.fast).cyan());
    println!(
        "  Reasoning: {}",
        style(&state.config.models.reasoning).cyan()
    );
    println!("  Live:      {}", style(&state.config.models.live).cyan());
    println!(
        "  {}",
        style(format!(
            "media: {} / {}",
            state.config.models.image, state.config.models.video
        ))
        .dim()
    );
    println!();

    // System
    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    if key_configured {
        println!("  API key:  {}", style("configured").green());
    } else {
        println!(
            "  API key:  {} (set DOPPEL_GEMINI_API_KEY)",
            style("not set").yellow()
        );
    }
    println!();

    Ok(())
}
