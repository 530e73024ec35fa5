//! Live audio session loop.
//!
//! One task owns the whole session: it races the provider's event
//! channel, the capture source, and the stop signal in a `select!`
//! loop. Capture frames are forwarded upstream as they arrive; model
//! audio is scheduled gaplessly on the sink; a server interruption
//! (barge-in) discards scheduled playback and resets the clock. When
//! the session ends, the transcript becomes a persisted record (and
//! earns points) only if someone actually said something.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use doppel_types::error::LiveError;
use doppel_types::live::{LiveConfig, LiveEvent, LivePhase, LiveRecord};
use doppel_types::twin::POINTS_LIVE_SESSION;

use crate::gateway::{AiGateway, LiveCommand, LiveProvider};
use crate::live::audio::{AudioSink, AudioSource};
use crate::live::clock::PlaybackClock;
use crate::live::state::LiveState;
use crate::live::transcript::TranscriptAccumulator;
use crate::state::StateOwner;
use crate::storage::KvStore;

/// What a finished live session left behind.
#[derive(Debug)]
pub struct LiveOutcome {
    /// The persisted record, absent when nothing was transcribed.
    pub record: Option<LiveRecord>,
    /// Close reason, when the session did not end by user request.
    pub status: Option<String>,
}

pub struct LiveTurnEngine<K> {
    state: Arc<StateOwner<K>>,
}

impl<K: KvStore> LiveTurnEngine<K> {
    pub fn new(state: Arc<StateOwner<K>>) -> Self {
        Self { state }
    }

    /// Run one live session to completion.
    ///
    /// Returns when the user cancels `stop`, capture is exhausted, the
    /// server closes, or the connection fails.
    #[tracing::instrument(skip_all, fields(model = %config.model))]
    pub async fn run<P, S, O>(
        &self,
        gateway: &AiGateway<P>,
        config: LiveConfig,
        mut mic: S,
        speaker: &O,
        stop: CancellationToken,
    ) -> Result<LiveOutcome, LiveError>
    where
        P: LiveProvider,
        S: AudioSource,
        O: AudioSink,
    {
        let live = LiveState::new();
        live.transition(LivePhase::Connecting)?;
        let started_at = Utc::now();
        let opened = Instant::now();

        let handle = match gateway.open_live(config).await {
            Ok(handle) => handle,
            Err(err) => {
                live.close_with_status(err.to_string());
                return Err(err.into());
            }
        };
        let commands = handle.commands;
        let mut events = handle.events;
        live.transition(LivePhase::Open)?;
        tracing::info!("Live session open");

        let mut clock = PlaybackClock::new();
        let mut transcript = TranscriptAccumulator::new();

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    let _ = commands.send(LiveCommand::Close).await;
                    break;
                }
                event = events.recv() => match event {
                    Some(LiveEvent::Audio(frame)) => {
                        if live.phase() == LivePhase::Interrupted {
                            live.transition(LivePhase::Open)?;
                        }
                        let start = clock.schedule(speaker.now(), frame.duration_secs());
                        speaker.play_at(frame, start);
                    }
                    Some(LiveEvent::TranscriptDelta { speaker: who, text }) => {
                        transcript.push(who, &text);
                    }
                    Some(LiveEvent::TurnComplete) => transcript.complete_turn(),
                    Some(LiveEvent::Interrupted) => {
                        speaker.stop_all();
                        clock.reset();
                        if live.phase() == LivePhase::Open {
                            live.transition(LivePhase::Interrupted)?;
                        }
                    }
                    Some(LiveEvent::Error(message)) => {
                        tracing::warn!(%message, "Live session failed");
                        live.close_with_status(message);
                        break;
                    }
                    Some(LiveEvent::Closed) | None => {
                        live.close_with_status("closed by server");
                        break;
                    }
                },
                frame = mic.next_frame(), if live.is_streaming() => match frame {
                    Some(frame) => {
                        if commands.send(LiveCommand::Audio(frame)).await.is_err() {
                            live.close_with_status("live channel closed");
                            break;
                        }
                    }
                    None => {
                        let _ = commands.send(LiveCommand::Close).await;
                        break;
                    }
                },
            }
        }

        speaker.stop_all();
        if live.phase() != LivePhase::Closed {
            live.transition(LivePhase::Closed)?;
        }

        let duration_secs = opened.elapsed().as_secs_f64();
        let turns = transcript.finish();
        let record = if turns.is_empty() {
            None
        } else {
            let record = LiveRecord::new(started_at, duration_secs, turns);
            self.state.push_live_record(record.clone()).await?;
            self.state
                .award_points("live session", POINTS_LIVE_SESSION)
                .await?;
            Some(record)
        };

        tracing::info!(
            duration_secs,
            recorded = record.is_some(),
            "Live session closed"
        );
        Ok(LiveOutcome {
            record,
            status: live.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::provider::LiveHandle;
    use crate::storage::MemoryKvStore;
    use crate::testing::fast_policy;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use doppel_types::config::ModelCatalog;
    use doppel_types::error::GatewayError;
    use doppel_types::live::{AudioFrame, Speaker, PLAYBACK_SAMPLE_RATE};

    /// Hands out one pre-built handle, then refuses to connect.
    struct ScriptedLive {
        handle: tokio::sync::Mutex<Option<LiveHandle>>,
    }

    impl LiveProvider for ScriptedLive {
        async fn open_live(&self, _config: LiveConfig) -> Result<LiveHandle, GatewayError> {
            self.handle
                .lock()
                .await
                .take()
                .ok_or_else(|| GatewayError::Unavailable("no session scripted".into()))
        }
    }

    /// Capture source that never produces a frame.
    struct SilentSource;

    impl AudioSource for SilentSource {
        async fn next_frame(&mut self) -> Option<AudioFrame> {
            std::future::pending().await
        }
    }

    /// Capture source that yields scripted frames, then pends forever.
    struct ScriptedSource {
        frames: VecDeque<AudioFrame>,
    }

    impl AudioSource for ScriptedSource {
        async fn next_frame(&mut self) -> Option<AudioFrame> {
            match self.frames.pop_front() {
                Some(frame) => Some(frame),
                None => std::future::pending().await,
            }
        }
    }

    /// Capture source that ends after its frames run out.
    struct FiniteSource {
        frames: VecDeque<AudioFrame>,
    }

    impl AudioSource for FiniteSource {
        async fn next_frame(&mut self) -> Option<AudioFrame> {
            self.frames.pop_front()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        now: Mutex<f64>,
        starts: Mutex<Vec<f64>>,
        stops: AtomicU32,
    }

    impl RecordingSink {
        fn set_now(&self, secs: f64) {
            *self.now.lock().unwrap() = secs;
        }

        fn starts(&self) -> Vec<f64> {
            self.starts.lock().unwrap().clone()
        }
    }

    impl AudioSink for RecordingSink {
        fn now(&self) -> f64 {
            *self.now.lock().unwrap()
        }

        fn play_at(&self, _frame: AudioFrame, start_secs: f64) {
            self.starts.lock().unwrap().push(start_secs);
        }

        fn stop_all(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        engine: LiveTurnEngine<MemoryKvStore>,
        state: Arc<StateOwner<MemoryKvStore>>,
    }

    fn fixture() -> Fixture {
        let state = Arc::new(StateOwner::new(Arc::new(MemoryKvStore::new())));
        Fixture {
            engine: LiveTurnEngine::new(Arc::clone(&state)),
            state,
        }
    }

    fn scripted_gateway() -> (
        AiGateway<ScriptedLive>,
        mpsc::Receiver<LiveCommand>,
        mpsc::Sender<LiveEvent>,
    ) {
        let (handle, command_rx, event_tx) = LiveHandle::channel(64);
        let provider = ScriptedLive {
            handle: tokio::sync::Mutex::new(Some(handle)),
        };
        (
            AiGateway::new(provider, ModelCatalog::default(), fast_policy()),
            command_rx,
            event_tx,
        )
    }

    fn config() -> LiveConfig {
        LiveConfig {
            model: "live-test".to_string(),
            system: None,
        }
    }

    /// Half a second of playback audio.
    fn playback_frame() -> AudioFrame {
        AudioFrame::playback(vec![0; PLAYBACK_SAMPLE_RATE as usize / 2])
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_as_error() {
        let f = fixture();
        let gateway = AiGateway::new(
            ScriptedLive {
                handle: tokio::sync::Mutex::new(None),
            },
            ModelCatalog::default(),
            fast_policy(),
        );
        let sink = RecordingSink::default();

        let result = f
            .engine
            .run(
                &gateway,
                config(),
                SilentSource,
                &sink,
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(LiveError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_capture_frames_forwarded_upstream() {
        let f = fixture();
        let (gateway, mut command_rx, event_tx) = scripted_gateway();
        let sink = RecordingSink::default();
        let mic = ScriptedSource {
            frames: VecDeque::from([
                AudioFrame::capture(vec![1; 160]),
                AudioFrame::capture(vec![2; 160]),
            ]),
        };

        let (outcome, forwarded) = tokio::join!(
            f.engine
                .run(&gateway, config(), mic, &sink, CancellationToken::new()),
            async move {
                let mut frames = Vec::new();
                while let Some(command) = command_rx.recv().await {
                    if let LiveCommand::Audio(frame) = command {
                        frames.push(frame);
                        if frames.len() == 2 {
                            event_tx.send(LiveEvent::Closed).await.unwrap();
                        }
                    }
                }
                frames
            }
        );

        let outcome = outcome.unwrap();
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded[0].samples[0], 1);
        assert_eq!(forwarded[1].samples[0], 2);
        assert!(outcome.record.is_none());
    }

    #[tokio::test]
    async fn test_model_audio_schedules_gaplessly() {
        let f = fixture();
        let (gateway, _command_rx, event_tx) = scripted_gateway();
        let sink = RecordingSink::default();

        let (outcome, _) = tokio::join!(
            f.engine
                .run(&gateway, config(), SilentSource, &sink, CancellationToken::new()),
            async {
                event_tx.send(LiveEvent::Audio(playback_frame())).await.unwrap();
                event_tx.send(LiveEvent::Audio(playback_frame())).await.unwrap();
                event_tx.send(LiveEvent::Audio(playback_frame())).await.unwrap();
                event_tx.send(LiveEvent::Closed).await.unwrap();
            }
        );

        outcome.unwrap();
        assert_eq!(sink.starts(), vec![0.0, 0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_interruption_discards_playback_and_resets_clock() {
        let f = fixture();
        let (gateway, _command_rx, event_tx) = scripted_gateway();
        let sink = RecordingSink::default();

        let (outcome, _) = tokio::join!(
            f.engine
                .run(&gateway, config(), SilentSource, &sink, CancellationToken::new()),
            async {
                event_tx.send(LiveEvent::Audio(playback_frame())).await.unwrap();
                event_tx.send(LiveEvent::Audio(playback_frame())).await.unwrap();
                event_tx.send(LiveEvent::Interrupted).await.unwrap();
                // Playback clock has moved on by the time the model resumes.
                sink.set_now(2.0);
                event_tx.send(LiveEvent::Audio(playback_frame())).await.unwrap();
                event_tx.send(LiveEvent::Closed).await.unwrap();
            }
        );

        outcome.unwrap();
        // The post-interruption frame starts at the current clock, not
        // after the discarded horizon.
        assert_eq!(sink.starts(), vec![0.0, 0.5, 2.0]);
        assert!(sink.stops.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_transcript_becomes_persisted_record() {
        let f = fixture();
        let (gateway, _command_rx, event_tx) = scripted_gateway();
        let sink = RecordingSink::default();

        let (outcome, _) = tokio::join!(
            f.engine
                .run(&gateway, config(), SilentSource, &sink, CancellationToken::new()),
            async {
                for (speaker, text) in [
                    (Speaker::User, "what should "),
                    (Speaker::Model, "Focus on the launch."),
                    (Speaker::User, "I do today?"),
                ] {
                    event_tx
                        .send(LiveEvent::TranscriptDelta {
                            speaker,
                            text: text.to_string(),
                        })
                        .await
                        .unwrap();
                }
                event_tx.send(LiveEvent::TurnComplete).await.unwrap();
                event_tx.send(LiveEvent::Closed).await.unwrap();
            }
        );

        let outcome = outcome.unwrap();
        let record = outcome.record.expect("transcribed session gets a record");
        assert_eq!(record.turns.len(), 2);
        assert_eq!(record.turns[0].speaker, Speaker::User);
        assert_eq!(record.turns[0].text, "what should I do today?");
        assert_eq!(record.turns[1].speaker, Speaker::Model);

        let stored = f.state.live_records().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, record.id);
        assert_eq!(f.state.points().await.unwrap().total, POINTS_LIVE_SESSION);
    }

    #[tokio::test]
    async fn test_silent_session_leaves_no_record_or_points() {
        let f = fixture();
        let (gateway, _command_rx, event_tx) = scripted_gateway();
        let sink = RecordingSink::default();

        let (outcome, _) = tokio::join!(
            f.engine
                .run(&gateway, config(), SilentSource, &sink, CancellationToken::new()),
            async {
                event_tx.send(LiveEvent::Closed).await.unwrap();
            }
        );

        let outcome = outcome.unwrap();
        assert!(outcome.record.is_none());
        assert!(f.state.live_records().await.unwrap().is_empty());
        assert_eq!(f.state.points().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_stop_token_closes_the_session() {
        let f = fixture();
        let (gateway, mut command_rx, _event_tx) = scripted_gateway();
        let sink = RecordingSink::default();
        let stop = CancellationToken::new();
        let stopper = stop.clone();

        let (outcome, saw_close) = tokio::join!(
            f.engine.run(&gateway, config(), SilentSource, &sink, stop),
            async move {
                stopper.cancel();
                matches!(command_rx.recv().await, Some(LiveCommand::Close))
            }
        );

        assert!(outcome.unwrap().record.is_none());
        assert!(saw_close);
    }

    #[tokio::test]
    async fn test_exhausted_capture_ends_the_session() {
        let f = fixture();
        let (gateway, mut command_rx, _event_tx) = scripted_gateway();
        let sink = RecordingSink::default();
        let mic = FiniteSource {
            frames: VecDeque::from([AudioFrame::capture(vec![7; 160])]),
        };

        let (outcome, commands) = tokio::join!(
            f.engine
                .run(&gateway, config(), mic, &sink, CancellationToken::new()),
            async move {
                let mut got = Vec::new();
                while let Some(command) = command_rx.recv().await {
                    got.push(command);
                }
                got
            }
        );

        outcome.unwrap();
        assert!(matches!(commands[0], LiveCommand::Audio(_)));
        assert!(matches!(commands.last(), Some(LiveCommand::Close)));
    }
}
