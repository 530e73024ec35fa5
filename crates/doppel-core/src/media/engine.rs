//! Start-and-poll loop for media generation.
//!
//! Image jobs complete on the first poll; video jobs can take minutes.
//! The loop polls immediately, then at the configured interval until
//! the job reports done or the wall-clock deadline passes. A finished
//! job lands in the gallery.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use doppel_types::config::MediaConfig;
use doppel_types::error::MediaError;
use doppel_types::gateway::MediaJobParams;
use doppel_types::twin::GalleryItem;

use crate::gateway::{AiGateway, MediaProvider};
use crate::state::StateOwner;
use crate::storage::KvStore;

pub struct MediaEngine<K> {
    state: Arc<StateOwner<K>>,
    config: MediaConfig,
}

impl<K: KvStore> MediaEngine<K> {
    pub fn new(state: Arc<StateOwner<K>>, config: MediaConfig) -> Self {
        Self { state, config }
    }

    /// Generate one artifact and add it to the gallery.
    #[tracing::instrument(name = "generate_media", skip_all, fields(kind = %params.kind))]
    pub async fn generate<P: MediaProvider>(
        &self,
        gateway: &AiGateway<P>,
        params: MediaJobParams,
    ) -> Result<GalleryItem, MediaError> {
        let handle = gateway.start_media_job(&params).await?;
        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);

        loop {
            let status = gateway.poll_media_job(&handle).await?;
            if status.done {
                let uri = status.result_uri.ok_or_else(|| {
                    MediaError::Failed("job finished without an artifact".to_string())
                })?;
                let item = GalleryItem::new(params.kind, params.prompt, uri);
                self.state.push_gallery_item(item.clone()).await?;
                tracing::info!(item_id = %item.id, "Media job finished");
                return Ok(item);
            }
            if Instant::now() >= deadline {
                return Err(MediaError::Timeout(self.config.timeout_secs));
            }
            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }
    }
}
