//! Translation CLI command.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state::AppState;

/// Translate text into a target language.
pub async fn translate_text(state: &AppState, text: &str, to: &str, json: bool) -> Result<()> {
    let ai = state.ai()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("translating to {to}..."));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let translated = doppel_core::translate::translate(&ai.gateway, text, to).await;
    spinner.finish_and_clear();
    let translated = translated?;

    if json {
        println!(
            "{}",
            serde_json::json!({"language": to, "translation": translated})
        );
    } else {
        println!();
        for line in translated.lines() {
            println!("  {line}");
        }
        println!();
        println!("  {}", style(format!("({to})")).dim());
        println!();
    }
    Ok(())
}
