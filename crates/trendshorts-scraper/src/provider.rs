use async_trait::async_trait;
use trendshorts_core::VideoMetadata;

use crate::error::ProviderError;

/// Per-video metadata lookup.
///
/// Implementations must bound every call with a timeout; the enricher relies
/// on that to keep a stuck lookup from stalling a batch.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_metadata(&self, video_id: &str) -> Result<VideoMetadata, ProviderError>;
}
