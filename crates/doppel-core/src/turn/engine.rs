//! Drives one conversational turn end to end.
//!
//! A turn loads the session, assembles bounded context, calls the
//! gateway, and appends the reply to the log. Gateway failures become a
//! model-authored apology message instead of an error, so the session
//! stays usable. At most one turn runs per session at a time; a second
//! send while one is in flight reports [`TurnOutcome::Busy`] without
//! touching the log.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use doppel_types::error::TurnError;
use doppel_types::gateway::{GenerateRequest, ModelTier};
use doppel_types::profile::Profile;
use doppel_types::session::{Attachment, ChatMessage, MessageRole, Session, SessionKind};
use doppel_types::twin::POINTS_ANALYSIS;

use crate::gateway::{AiGateway, TextProvider};
use crate::profile::ProfileSynthesizer;
use crate::session::SessionStore;
use crate::state::StateOwner;
use crate::storage::KvStore;
use crate::turn::context::{self, to_turn};

/// Reasoning-token budget applied when a turn asks for deep reasoning.
pub const REASONING_BUDGET: u32 = 4096;

const TWIN_SYSTEM_PROMPT: &str = "\
You are the user's digital twin: you speak as them, in first person, \
matching their tone and values. When a personality profile is provided, \
stay consistent with it. Be direct and concrete; do not mention being an \
AI or having a profile.";

/// Per-turn options from the caller.
#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    /// Spend extended reasoning tokens on this turn.
    pub reasoning: bool,
    /// Ground the reply with web search.
    pub grounding: bool,
    pub attachment: Option<Attachment>,
}

/// What a send produced.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The reply appended to the log (which may be an error notice).
    Completed(ChatMessage),
    /// Another turn for this session is still in flight; nothing was done.
    Busy,
}

pub struct TurnEngine<K, P> {
    gateway: Arc<AiGateway<P>>,
    sessions: Arc<SessionStore<K>>,
    state: Arc<StateOwner<K>>,
    synthesizer: ProfileSynthesizer<P>,
    in_flight: DashMap<Uuid, ()>,
}

impl<K: KvStore, P: TextProvider> TurnEngine<K, P> {
    pub fn new(
        gateway: Arc<AiGateway<P>>,
        sessions: Arc<SessionStore<K>>,
        state: Arc<StateOwner<K>>,
    ) -> Self {
        let synthesizer = ProfileSynthesizer::new(Arc::clone(&gateway));
        Self {
            gateway,
            sessions,
            state,
            synthesizer,
            in_flight: DashMap::new(),
        }
    }

    /// Create and persist a fresh session.
    pub async fn start_session(&self, kind: SessionKind) -> Result<Session, TurnError> {
        let session = Session::new(kind);
        self.sessions.save(&session).await.map_err(TurnError::from)?;
        Ok(session)
    }

    /// Run one turn: append the user message, generate, append the reply.
    #[tracing::instrument(skip(self, text, options), fields(%session_id))]
    pub async fn send(
        &self,
        session_id: Uuid,
        text: String,
        options: TurnOptions,
    ) -> Result<TurnOutcome, TurnError> {
        let Some(_guard) = self.try_begin(session_id) else {
            return Ok(TurnOutcome::Busy);
        };
        let session = self.require(session_id).await?;

        let mut outgoing = ChatMessage::user(text);
        if let Some(attachment) = options.attachment.clone() {
            outgoing = outgoing.with_attachment(attachment);
        }
        self.run_turn(session, outgoing, false, &options).await
    }

    /// Redo the latest exchange.
    ///
    /// A trailing model reply is dropped and its user message resent; a
    /// trailing user message (a previously failed turn) is resent as is.
    #[tracing::instrument(skip(self), fields(%session_id))]
    pub async fn regenerate(&self, session_id: Uuid) -> Result<TurnOutcome, TurnError> {
        let Some(_guard) = self.try_begin(session_id) else {
            return Ok(TurnOutcome::Busy);
        };
        let mut session = self.require(session_id).await?;

        let mut options = TurnOptions::default();
        match session.last_message().map(|m| m.role) {
            Some(MessageRole::Model) => {
                if let Some(dropped) = session.messages.pop() {
                    options.reasoning = dropped.deep_reasoning;
                    options.grounding = !dropped.citations.is_empty();
                }
            }
            Some(MessageRole::User) => {}
            _ => return Err(TurnError::NothingToRegenerate),
        }
        let outgoing = match session.last_message() {
            Some(last) if last.role == MessageRole::User => last.clone(),
            _ => return Err(TurnError::NothingToRegenerate),
        };

        self.run_turn(session, outgoing, true, &options).await
    }

    /// Distill this session into the profile and note it in the log.
    #[tracing::instrument(skip(self), fields(%session_id))]
    pub async fn analyze_session(&self, session_id: Uuid) -> Result<Profile, TurnError> {
        let mut session = self.require(session_id).await?;
        let current = self.state.profile().await?;

        let merged = self.synthesizer.analyze(&session.messages, &current).await?;
        let stored = self.state.replace_profile(merged).await?;
        self.state.award_points("profile analysis", POINTS_ANALYSIS).await?;

        session.push(ChatMessage::system(
            "Analyzed this conversation and updated your profile.",
        ));
        self.sessions.save(&session).await?;
        Ok(stored)
    }

    /// The turn body shared by send and regenerate.
    ///
    /// `already_logged` marks the outgoing message as the session log's
    /// trailing entry (regenerate path); otherwise it is appended and
    /// persisted before the model call.
    async fn run_turn(
        &self,
        mut session: Session,
        outgoing: ChatMessage,
        already_logged: bool,
        options: &TurnOptions,
    ) -> Result<TurnOutcome, TurnError> {
        let profile = self.state.profile().await?;
        let profile_ref = (!profile.is_empty()).then_some(&profile);

        let log_end = if already_logged {
            session.messages.len().saturating_sub(1)
        } else {
            session.messages.len()
        };
        let ctx = context::assemble(&session.messages[..log_end], to_turn(&outgoing), profile_ref);

        if !already_logged {
            session.push(outgoing);
            self.sessions.save(&session).await?;
        }

        let mut request = GenerateRequest::chat(ctx.history, ctx.message)
            .with_system(TWIN_SYSTEM_PROMPT)
            .with_fallback_tier(ModelTier::Fast)
            .with_grounding(options.grounding);
        if options.reasoning {
            request = request.with_reasoning_budget(REASONING_BUDGET);
        }

        let reply = match self.gateway.generate(&request).await {
            Ok(response) => ChatMessage::model(response.text)
                .with_citations(response.citations)
                .with_deep_reasoning(options.reasoning),
            Err(err) => {
                tracing::warn!(error = %err, "Turn failed, logging the error as a reply");
                ChatMessage::model(format!(
                    "Sorry, I ran into a problem answering that: {err}. \
                     You can regenerate to try again."
                ))
            }
        };

        session.push(reply.clone());
        self.sessions.save(&session).await?;
        Ok(TurnOutcome::Completed(reply))
    }

    async fn require(&self, session_id: Uuid) -> Result<Session, TurnError> {
        self.sessions
            .get(session_id)
            .await
            .map_err(TurnError::from)?
            .ok_or_else(|| doppel_types::error::SessionError::NotFound(session_id).into())
    }

    /// Claim the per-session turn slot; `None` while a turn is in flight.
    fn try_begin(&self, session_id: Uuid) -> Option<FlightGuard<'_>> {
        if self.in_flight.insert(session_id, ()).is_some() {
            return None;
        }
        Some(FlightGuard {
            map: &self.in_flight,
            session_id,
        })
    }
}

/// Releases the in-flight slot when the turn ends, on every exit path.
struct FlightGuard<'a> {
    map: &'a DashMap<Uuid, ()>,
    session_id: Uuid,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionFilter;
    use crate::storage::MemoryKvStore;
    use crate::testing::{fast_policy, MockProvider};
    use doppel_types::config::ModelCatalog;
    use doppel_types::error::GatewayError;
    use doppel_types::gateway::{Citation, GenerateResponse};

    struct Fixture {
        engine: TurnEngine<MemoryKvStore, MockProvider>,
        sessions: Arc<SessionStore<MemoryKvStore>>,
        state: Arc<StateOwner<MemoryKvStore>>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryKvStore::new());
        let gateway = Arc::new(AiGateway::new(
            MockProvider::new(),
            ModelCatalog::default(),
            fast_policy(),
        ));
        let sessions = Arc::new(SessionStore::new(Arc::clone(&store)));
        let state = Arc::new(StateOwner::new(store));
        let engine = TurnEngine::new(gateway, Arc::clone(&sessions), Arc::clone(&state));
        Fixture {
            engine,
            sessions,
            state,
        }
    }

    fn provider(fixture: &Fixture) -> &MockProvider {
        fixture.engine.gateway.provider()
    }

    #[tokio::test]
    async fn test_send_appends_user_and_model_messages() {
        let f = fixture();
        provider(&f).push_text("glad you asked").await;
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();

        let outcome = f
            .engine
            .send(session.id, "what do I value?".into(), TurnOptions::default())
            .await
            .unwrap();
        let TurnOutcome::Completed(reply) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(reply.text, "glad you asked");

        let stored = f.sessions.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[0].role, MessageRole::User);
        assert_eq!(stored.messages[1].role, MessageRole::Model);
        assert_eq!(stored.title, "what do I value?");
    }

    #[tokio::test]
    async fn test_send_to_unknown_session_fails() {
        let f = fixture();
        let err = f
            .engine
            .send(Uuid::now_v7(), "hi".into(), TurnOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Session(_)));
    }

    #[tokio::test]
    async fn test_second_send_while_in_flight_is_busy() {
        let f = fixture();
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();

        // Hold the slot the way a running turn would.
        f.engine.in_flight.insert(session.id, ());
        let outcome = f
            .engine
            .send(session.id, "hello?".into(), TurnOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Busy));

        // The log was never touched.
        let stored = f.sessions.get(session.id).await.unwrap().unwrap();
        assert!(stored.messages.is_empty());

        // Releasing the slot lets the next send run.
        f.engine.in_flight.remove(&session.id);
        provider(&f).push_text("now I can").await;
        let outcome = f
            .engine
            .send(session.id, "hello?".into(), TurnOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_gateway_failure_becomes_model_message() {
        let f = fixture();
        provider(&f)
            .push_err(GatewayError::Provider {
                message: "boom".into(),
            })
            .await;
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();

        let outcome = f
            .engine
            .send(session.id, "hi".into(), TurnOptions::default())
            .await
            .unwrap();
        let TurnOutcome::Completed(reply) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(reply.role, MessageRole::Model);
        assert!(reply.text.contains("ran into a problem"));

        let stored = f.sessions.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_profile_flags_flow_into_request() {
        let f = fixture();
        provider(&f).push_text("deep answer").await;
        f.state
            .add_profile_entry(doppel_types::profile::ProfileCategory::Values, "candor")
            .await
            .unwrap();
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();

        f.engine
            .send(
                session.id,
                "think about this".into(),
                TurnOptions {
                    reasoning: true,
                    grounding: false,
                    attachment: None,
                },
            )
            .await
            .unwrap();

        let requests = provider(&f).requests().await;
        assert_eq!(requests[0].reasoning_budget, Some(REASONING_BUDGET));
        assert_eq!(requests[0].system.as_deref(), Some(TWIN_SYSTEM_PROMPT));
        // Empty log, so the profile block rides on the outgoing message.
        let last_turn = requests[0].turns.last().unwrap();
        assert!(last_turn.text.contains("candor"));
        assert!(last_turn.text.ends_with("think about this"));
    }

    #[tokio::test]
    async fn test_grounded_reply_keeps_citations() {
        let f = fixture();
        provider(&f)
            .push_response(GenerateResponse {
                text: "It shipped yesterday.".into(),
                citations: vec![Citation {
                    title: "Release notes".into(),
                    uri: "https://example.com/release".into(),
                }],
            })
            .await;
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();

        let outcome = f
            .engine
            .send(
                session.id,
                "did it ship?".into(),
                TurnOptions {
                    grounding: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let TurnOutcome::Completed(reply) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(reply.citations.len(), 1);
        assert_eq!(reply.citations[0].title, "Release notes");
        assert!(provider(&f).requests().await[0].grounding);

        // Regenerate infers grounding from the dropped reply's citations.
        provider(&f).push_text("Still out.").await;
        f.engine.regenerate(session.id).await.unwrap();
        assert!(provider(&f).requests().await[1].grounding);
    }

    #[tokio::test]
    async fn test_regenerate_replaces_last_model_reply() {
        let f = fixture();
        provider(&f).push_text("first answer").await;
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();
        f.engine
            .send(session.id, "question".into(), TurnOptions::default())
            .await
            .unwrap();

        provider(&f).push_text("second answer").await;
        let outcome = f.engine.regenerate(session.id).await.unwrap();
        let TurnOutcome::Completed(reply) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(reply.text, "second answer");

        let stored = f.sessions.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[0].text, "question");
        assert_eq!(stored.messages[1].text, "second answer");

        // The resent user message is not duplicated in gateway context.
        let requests = provider(&f).requests().await;
        let texts: Vec<&str> = requests[1].turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["question"]);
    }

    #[tokio::test]
    async fn test_regenerate_after_failed_turn_resends_user_message() {
        let f = fixture();
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();

        // Log ends on a user message, as after an aborted turn.
        let mut stored = f.sessions.get(session.id).await.unwrap().unwrap();
        stored.push(ChatMessage::user("lost question"));
        f.sessions.save(&stored).await.unwrap();

        provider(&f).push_text("recovered").await;
        let outcome = f.engine.regenerate(session.id).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed(_)));

        let stored = f.sessions.get(session.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[1].text, "recovered");
    }

    #[tokio::test]
    async fn test_regenerate_empty_session_has_nothing_to_do() {
        let f = fixture();
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();
        let err = f.engine.regenerate(session.id).await.unwrap_err();
        assert!(matches!(err, TurnError::NothingToRegenerate));
    }

    #[tokio::test]
    async fn test_analyze_session_updates_profile_points_and_log() {
        let f = fixture();
        provider(&f).push_text("chat reply").await;
        let session = f.engine.start_session(SessionKind::Chat).await.unwrap();
        f.engine
            .send(session.id, "I love climbing".into(), TurnOptions::default())
            .await
            .unwrap();

        provider(&f)
            .push_text(r#"{"interests": ["climbing"]}"#)
            .await;
        let profile = f.engine.analyze_session(session.id).await.unwrap();
        assert_eq!(profile.interests, vec!["climbing"]);
        assert!(profile.updated_at.is_some());

        assert_eq!(f.state.points().await.unwrap().total, POINTS_ANALYSIS);

        let stored = f.sessions.get(session.id).await.unwrap().unwrap();
        let last = stored.last_message().unwrap();
        assert_eq!(last.role, MessageRole::System);
        assert!(last.text.contains("updated your profile"));
    }

    #[tokio::test]
    async fn test_sessions_list_shows_started_session() {
        let f = fixture();
        f.engine.start_session(SessionKind::Chat).await.unwrap();
        let listed = f.sessions.list(SessionFilter::active()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
