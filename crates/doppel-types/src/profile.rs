//! The structured personality profile.
//!
//! A [`Profile`] is six named string-list categories plus a last-updated
//! timestamp. The shape invariant is load-bearing: every category is always
//! a list, never null. Lenient deserializers normalize absent or malformed
//! input to empty lists, and [`Profile::sanitize`] (idempotent) runs on
//! every external load and after every merge.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gateway::ResponseSchema;

/// A user's evolving personality model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "lenient_list")]
    pub values: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub personality_traits: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub mental_models: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub work_habits: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub decision_principles: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub interests: Vec<String>,
    /// When the profile last changed. Stamped by the caller after a merge
    /// or edit, not by the synthesizer.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Accept anything for a category field but only keep an array of strings;
/// everything else normalizes to an empty list.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Accept a valid RFC 3339 string or normalize to `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}

impl Profile {
    /// True when every category is empty.
    pub fn is_empty(&self) -> bool {
        ProfileCategory::ALL
            .iter()
            .all(|c| self.entries(*c).is_empty())
    }

    /// Normalize entries: trim whitespace, drop empties, dedup preserving
    /// first occurrence. Idempotent.
    pub fn sanitize(mut self) -> Self {
        for category in ProfileCategory::ALL {
            let entries = self.entries_mut(category);
            let mut seen = std::collections::HashSet::new();
            *entries = entries
                .iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .filter(|e| seen.insert(e.clone()))
                .collect();
        }
        self
    }

    /// Entries of one category.
    pub fn entries(&self, category: ProfileCategory) -> &[String] {
        match category {
            ProfileCategory::Values => &self.values,
            ProfileCategory::PersonalityTraits => &self.personality_traits,
            ProfileCategory::MentalModels => &self.mental_models,
            ProfileCategory::WorkHabits => &self.work_habits,
            ProfileCategory::DecisionPrinciples => &self.decision_principles,
            ProfileCategory::Interests => &self.interests,
        }
    }

    /// Mutable entries of one category.
    pub fn entries_mut(&mut self, category: ProfileCategory) -> &mut Vec<String> {
        match category {
            ProfileCategory::Values => &mut self.values,
            ProfileCategory::PersonalityTraits => &mut self.personality_traits,
            ProfileCategory::MentalModels => &mut self.mental_models,
            ProfileCategory::WorkHabits => &mut self.work_habits,
            ProfileCategory::DecisionPrinciples => &mut self.decision_principles,
            ProfileCategory::Interests => &mut self.interests,
        }
    }

    /// Render the profile as a context prefix for a conversational turn.
    /// `None` when the profile has nothing to say.
    pub fn context_block(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut block = String::from(
            "My personality profile (respond as my digital twin, consistent with this):",
        );
        for category in ProfileCategory::ALL {
            let entries = self.entries(category);
            if !entries.is_empty() {
                block.push_str("\n- ");
                block.push_str(category.label());
                block.push_str(": ");
                block.push_str(&entries.join(", "));
            }
        }
        Some(block)
    }
}

/// The six fixed profile categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileCategory {
    Values,
    PersonalityTraits,
    MentalModels,
    WorkHabits,
    DecisionPrinciples,
    Interests,
}

impl ProfileCategory {
    pub const ALL: [ProfileCategory; 6] = [
        ProfileCategory::Values,
        ProfileCategory::PersonalityTraits,
        ProfileCategory::MentalModels,
        ProfileCategory::WorkHabits,
        ProfileCategory::DecisionPrinciples,
        ProfileCategory::Interests,
    ];

    /// Human-readable label used in context blocks and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            ProfileCategory::Values => "Values",
            ProfileCategory::PersonalityTraits => "Personality traits",
            ProfileCategory::MentalModels => "Mental models",
            ProfileCategory::WorkHabits => "Work habits",
            ProfileCategory::DecisionPrinciples => "Decision principles",
            ProfileCategory::Interests => "Interests",
        }
    }
}

impl fmt::Display for ProfileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfileCategory::Values => "values",
            ProfileCategory::PersonalityTraits => "personality_traits",
            ProfileCategory::MentalModels => "mental_models",
            ProfileCategory::WorkHabits => "work_habits",
            ProfileCategory::DecisionPrinciples => "decision_principles",
            ProfileCategory::Interests => "interests",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ProfileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "values" => Ok(ProfileCategory::Values),
            "personality_traits" | "traits" => Ok(ProfileCategory::PersonalityTraits),
            "mental_models" => Ok(ProfileCategory::MentalModels),
            "work_habits" | "habits" => Ok(ProfileCategory::WorkHabits),
            "decision_principles" | "principles" => Ok(ProfileCategory::DecisionPrinciples),
            "interests" => Ok(ProfileCategory::Interests),
            _ => Err(format!("unknown profile category: {s}")),
        }
    }
}

/// The structured-output shape the profile synthesizer asks the model for.
///
/// Missing fields default to empty lists rather than failing the merge.
/// Doc comments become schema descriptions the model sees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProfileDraft {
    /// Core personal values observed or previously recorded.
    #[serde(default)]
    pub values: Vec<String>,
    /// Stable personality traits, each a short phrase.
    #[serde(default)]
    pub personality_traits: Vec<String>,
    /// Recurring mental models or frameworks the user reasons with.
    #[serde(default)]
    pub mental_models: Vec<String>,
    /// Observable work habits and routines.
    #[serde(default)]
    pub work_habits: Vec<String>,
    /// Principles the user applies when deciding.
    #[serde(default)]
    pub decision_principles: Vec<String>,
    /// Topics and activities the user cares about.
    #[serde(default)]
    pub interests: Vec<String>,
}

impl ProfileDraft {
    /// Schema handed to the gateway for the merge call.
    pub fn output_schema() -> ResponseSchema {
        ResponseSchema {
            name: "profile_update".to_string(),
            schema: schemars::schema_for!(ProfileDraft).to_value(),
        }
    }

    /// Convert into a sanitized [`Profile`] with no timestamp; the caller
    /// stamps `updated_at` when persisting.
    pub fn into_profile(self) -> Profile {
        Profile {
            values: self.values,
            personality_traits: self.personality_traits,
            mental_models: self.mental_models,
            work_habits: self.work_habits,
            decision_principles: self.decision_principles,
            interests: self.interests,
            updated_at: None,
        }
        .sanitize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messy_profile() -> Profile {
        Profile {
            values: vec![
                "  directness ".to_string(),
                "".to_string(),
                "directness".to_string(),
                "curiosity".to_string(),
            ],
            personality_traits: vec!["   ".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_trims_dedups_and_drops_empties() {
        let profile = messy_profile().sanitize();
        assert_eq!(profile.values, vec!["directness", "curiosity"]);
        assert!(profile.personality_traits.is_empty());
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = messy_profile().sanitize();
        let twice = once.clone().sanitize();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_lenient_load_normalizes_malformed_categories() {
        let json = r#"{
            "values": ["honesty", 42, null, "focus"],
            "personality_traits": null,
            "mental_models": "not a list",
            "work_habits": {"oops": true},
            "updated_at": "not a timestamp"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.values, vec!["honesty", "focus"]);
        assert!(profile.personality_traits.is_empty());
        assert!(profile.mental_models.is_empty());
        assert!(profile.work_habits.is_empty());
        assert!(profile.decision_principles.is_empty());
        assert!(profile.interests.is_empty());
        assert!(profile.updated_at.is_none());
    }

    #[test]
    fn test_lenient_load_keeps_valid_timestamp() {
        let json = r#"{"updated_at": "2025-06-01T10:00:00Z"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert!(profile.updated_at.is_some());
    }

    #[test]
    fn test_empty_profile_has_no_context_block() {
        assert!(Profile::default().context_block().is_none());
    }

    #[test]
    fn test_context_block_lists_only_nonempty_categories() {
        let profile = Profile {
            values: vec!["directness".to_string()],
            interests: vec!["sailing".to_string(), "rust".to_string()],
            ..Default::default()
        };
        let block = profile.context_block().unwrap();
        assert!(block.contains("Values: directness"));
        assert!(block.contains("Interests: sailing, rust"));
        assert!(!block.contains("Work habits"));
        // The block renders once, not per category occurrence.
        assert_eq!(block.matches("digital twin").count(), 1);
    }

    #[test]
    fn test_category_roundtrip_and_aliases() {
        for category in ProfileCategory::ALL {
            let parsed: ProfileCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert_eq!(
            "traits".parse::<ProfileCategory>().unwrap(),
            ProfileCategory::PersonalityTraits
        );
        assert_eq!(
            "decision-principles".parse::<ProfileCategory>().unwrap(),
            ProfileCategory::DecisionPrinciples
        );
        assert!("vibes".parse::<ProfileCategory>().is_err());
    }

    #[test]
    fn test_draft_missing_fields_default_to_empty() {
        let draft: ProfileDraft = serde_json::from_str(r#"{"values": ["candor"]}"#).unwrap();
        assert_eq!(draft.values, vec!["candor"]);
        assert!(draft.interests.is_empty());

        let profile = draft.into_profile();
        assert_eq!(profile.values, vec!["candor"]);
        assert!(profile.updated_at.is_none());
    }

    #[test]
    fn test_draft_schema_names_all_categories() {
        let schema = ProfileDraft::output_schema();
        assert_eq!(schema.name, "profile_update");
        let props = &schema.schema["properties"];
        for category in ProfileCategory::ALL {
            assert!(
                props.get(category.to_string()).is_some(),
                "schema missing {category}"
            );
        }
    }
}
