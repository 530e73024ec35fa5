//! Application state wiring the engines to their concrete adapters.
//!
//! `AppState` holds the storage-side services, which never need a
//! credential: the KV store, the state owner, the session store, and the
//! engines that only talk to them. Anything that calls the AI gateway is
//! built on demand through [`AppState::ai`], so storage-only commands
//! (listing sessions, editing todos) work without an API key.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use doppel_core::decision::DecisionSimulator;
use doppel_core::gateway::AiGateway;
use doppel_core::live::LiveTurnEngine;
use doppel_core::media::MediaEngine;
use doppel_core::session::SessionStore;
use doppel_core::state::StateOwner;
use doppel_core::tasks::TaskExtractor;
use doppel_core::turn::TurnEngine;
use doppel_infra::config::load_config;
use doppel_infra::gemini::GeminiProvider;
use doppel_infra::paths::{database_url, resolve_data_dir};
use doppel_infra::secret::resolve_api_key;
use doppel_infra::sqlite::{DatabasePool, SqliteKvStore};
use doppel_types::config::DoppelConfig;

/// Concrete type aliases for the engine generics pinned to infra implementations.
pub type Store = SqliteKvStore;
pub type ConcreteGateway = AiGateway<GeminiProvider>;
pub type ConcreteTurnEngine = TurnEngine<Store, GeminiProvider>;
pub type ConcreteSimulator = DecisionSimulator<Store, GeminiProvider>;
pub type ConcreteExtractor = TaskExtractor<GeminiProvider>;

/// Shared application state holding the storage-side services.
pub struct AppState {
    pub state_owner: Arc<StateOwner<Store>>,
    pub sessions: Arc<SessionStore<Store>>,
    pub media: MediaEngine<Store>,
    pub live: LiveTurnEngine<Store>,
    pub config: DoppelConfig,
    pub data_dir: PathBuf,
}

/// The gateway-backed engines, built once a credential is resolved.
pub struct AiServices {
    pub gateway: Arc<ConcreteGateway>,
    pub turns: ConcreteTurnEngine,
    pub simulator: ConcreteSimulator,
    pub extractor: ConcreteExtractor,
}

impl AppState {
    /// Initialize the application state: connect to the DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;
        let kv = Arc::new(SqliteKvStore::new(db_pool));

        let state_owner = Arc::new(StateOwner::new(Arc::clone(&kv)));
        let sessions = Arc::new(SessionStore::new(kv));

        let media = MediaEngine::new(Arc::clone(&state_owner), config.media.clone());
        let live = LiveTurnEngine::new(Arc::clone(&state_owner));

        Ok(Self {
            state_owner,
            sessions,
            media,
            live,
            config,
            data_dir,
        })
    }

    /// Build the gateway and the engines that call it.
    ///
    /// Fails fast when no API key is set, before any network traffic.
    pub fn ai(&self) -> anyhow::Result<AiServices> {
        let api_key = resolve_api_key()
            .context("set DOPPEL_GEMINI_API_KEY (or GEMINI_API_KEY) in the environment")?;

        let provider = GeminiProvider::new(api_key, self.config.models.clone());
        let gateway = Arc::new(AiGateway::new(
            provider,
            self.config.models.clone(),
            self.config.retry.policy(),
        ));

        let turns = TurnEngine::new(
            Arc::clone(&gateway),
            Arc::clone(&self.sessions),
            Arc::clone(&self.state_owner),
        );
        let simulator = DecisionSimulator::new(Arc::clone(&gateway), Arc::clone(&self.state_owner));
        let extractor = TaskExtractor::new(Arc::clone(&gateway));

        Ok(AiServices {
            gateway,
            turns,
            simulator,
            extractor,
        })
    }
}
