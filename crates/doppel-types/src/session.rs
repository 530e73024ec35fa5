//! Conversational sessions and messages.
//!
//! A [`Session`] is a named, timestamped, ordered message log. Chat sessions
//! and prompt-lab sessions share the same shape and the same trash (soft
//! delete) lifecycle, modeled as the tagged [`SessionState`] rather than a
//! boolean flag.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::Citation;

/// Maximum characters of the first user message used for a session title.
pub const TITLE_MAX_CHARS: usize = 40;

/// Role of a message author within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "model" => Ok(MessageRole::Model),
            "system" => Ok(MessageRole::System),
            _ => Err(format!("unknown message role: {s}")),
        }
    }
}

/// What kind of payload an attachment carries.
///
/// The single unified representation covers both inline image previews and
/// generic file uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::File => write!(f, "file"),
        }
    }
}

/// A single inline file carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    /// IANA media type, e.g. `image/png` or `application/pdf`.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
    /// Display name, usually the original filename.
    pub name: String,
}

impl Attachment {
    pub fn image(mime_type: impl Into<String>, data: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            mime_type: mime_type.into(),
            data: data.into(),
            name: name.into(),
        }
    }

    pub fn file(mime_type: impl Into<String>, data: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::File,
            mime_type: mime_type.into(),
            data: data.into(),
            name: name.into(),
        }
    }
}

/// One message in a session's ordered log.
///
/// Insertion order within [`Session::messages`] is the literal conversation
/// order sent back to the gateway as context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Whether extended reasoning was used to produce this message.
    #[serde(default)]
    pub deep_reasoning: bool,
    /// Web-grounding citations supporting this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            text: text.into(),
            attachment: None,
            deep_reasoning: false,
            citations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_deep_reasoning(mut self, used: bool) -> Self {
        self.deep_reasoning = used;
        self
    }
}

/// Which surface a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Chat,
    PromptLab,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Chat => write!(f, "chat"),
            SessionKind::PromptLab => write!(f, "prompt_lab"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(SessionKind::Chat),
            "prompt_lab" | "prompt-lab" => Ok(SessionKind::PromptLab),
            _ => Err(format!("unknown session kind: {s}")),
        }
    }
}

/// Soft-delete lifecycle state of a session.
///
/// A deleted session keeps its full message log; only the active/trash
/// partition changes. Purge (permanent removal) happens at the store level,
/// not as a third state here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Deleted { deleted_at: DateTime<Utc> },
}

impl SessionState {
    pub fn is_deleted(&self) -> bool {
        matches!(self, SessionState::Deleted { .. })
    }
}

/// A named, timestamped, ordered conversational log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub kind: SessionKind,
    pub title: String,
    #[serde(default = "default_session_state")]
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

fn default_session_state() -> SessionState {
    SessionState::Active
}

impl Session {
    pub fn new(kind: SessionKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            kind,
            title: "New conversation".to_string(),
            state: SessionState::Active,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Append a message and refresh `updated_at`. Derives the title from
    /// the first user message.
    pub fn push(&mut self, message: ChatMessage) {
        let derive = message.role == MessageRole::User
            && !self.messages.iter().any(|m| m.role == MessageRole::User);
        if derive {
            self.title = title_from(&message.text);
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// The most recent message, if any.
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Derive a display title from the first user message, truncated on a char
/// boundary with an ellipsis.
pub fn title_from(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "New conversation".to_string();
    }
    let mut title: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        title.push('…');
    }
    title
}
