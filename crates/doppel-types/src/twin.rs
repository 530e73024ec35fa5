//! Supplemental state domains: todos, points, gallery.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::ResponseSchema;

/// Points awarded when a conversation analysis updates the profile.
pub const POINTS_ANALYSIS: i64 = 10;
/// Points awarded per simulated decision.
pub const POINTS_DECISION: i64 = 5;
/// Points awarded when a live session produces a transcript.
pub const POINTS_LIVE_SESSION: i64 = 5;

/// One actionable item extracted from free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: Uuid,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.into(),
            done: false,
            created_at: Utc::now(),
        }
    }
}

/// An append-only points entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub reason: String,
    pub delta: i64,
    pub at: DateTime<Utc>,
}

/// Running points total with history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsLedger {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub entries: Vec<PointsEntry>,
}

impl PointsLedger {
    pub fn award(&mut self, reason: impl Into<String>, delta: i64) {
        self.total += delta;
        self.entries.push(PointsEntry {
            reason: reason.into(),
            delta,
            at: Utc::now(),
        });
    }
}

/// Kind of generated media artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            _ => Err(format!("unknown media kind: {s}")),
        }
    }
}

/// A completed media generation kept in the gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: Uuid,
    pub kind: MediaKind,
    pub prompt: String,
    /// Remote URI or local path of the artifact.
    pub uri: String,
    pub created_at: DateTime<Utc>,
}

impl GalleryItem {
    pub fn new(kind: MediaKind, prompt: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            prompt: prompt.into(),
            uri: uri.into(),
            created_at: Utc::now(),
        }
    }
}

/// Structured-output shape for task extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaskPlanDraft {
    /// Concise verb-led actions in dependency order. Empty when nothing is
    /// actionable.
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl TaskPlanDraft {
    pub fn output_schema() -> ResponseSchema {
        ResponseSchema {
            name: "task_plan".to_string(),
            schema: schemars::schema_for!(TaskPlanDraft).to_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_award_accumulates() {
        let mut ledger = PointsLedger::default();
        ledger.award("analysis", POINTS_ANALYSIS);
        ledger.award("decision", POINTS_DECISION);
        assert_eq!(ledger.total, 15);
        assert_eq!(ledger.entries.len(), 2);
        assert_eq!(ledger.entries[0].reason, "analysis");
    }

    #[test]
    fn test_media_kind_roundtrip() {
        for kind in [MediaKind::Image, MediaKind::Video] {
            let parsed: MediaKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("hologram".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_task_plan_missing_field_defaults_empty() {
        let draft: TaskPlanDraft = serde_json::from_str("{}").unwrap();
        assert!(draft.tasks.is_empty());
    }

    #[test]
    fn test_todo_starts_open() {
        let todo = TodoItem::new("Buy milk");
        assert!(!todo.done);
        assert_eq!(todo.text, "Buy milk");
    }
}
