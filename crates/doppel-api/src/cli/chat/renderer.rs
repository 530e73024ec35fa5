//! Terminal markdown rendering for model replies.
//!
//! Replies come back as markdown; `termimad` turns them into styled
//! terminal text. Citations from grounded turns are listed after the
//! body in dimmed text.

use console::style;
use termimad::MadSkin;

use doppel_types::gateway::Citation;

/// Terminal markdown renderer.
pub struct ChatRenderer {
    skin: MadSkin,
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);
        Self { skin }
    }

    /// Render markdown to styled terminal text.
    pub fn render(&self, markdown: &str) -> String {
        self.skin.term_text(markdown).to_string()
    }

    /// Print a full reply: rendered body, then any citations.
    pub fn print_reply(&self, text: &str, citations: &[Citation]) {
        for line in self.render(text).trim_end().lines() {
            println!("  {line}");
        }
        if !citations.is_empty() {
            println!();
            println!("  {}", style("Sources:").dim());
            for citation in citations {
                let label = if citation.title.is_empty() {
                    citation.uri.clone()
                } else {
                    format!("{} ({})", citation.title, citation.uri)
                };
                println!("  {} {}", style("•").dim(), style(label).dim());
            }
        }
    }
}
