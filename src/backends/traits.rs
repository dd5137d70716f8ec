use async_trait::async_trait;

use crate::models::{
    PlaybackInfo, PlaybackRequest, ProfileId, ProgressCheckpoint, StoredProgress, StreamVariant,
    TitleId, TitleMetadata,
};
use crate::utils::errors::AppResult;

/// Read access to the title catalog.
#[async_trait]
pub trait CatalogService: Send + Sync + std::fmt::Debug {
    async fn get_title_metadata(&self, title_id: &TitleId) -> AppResult<TitleMetadata>;
}

/// Turns a title into something the media element can play.
#[async_trait]
pub trait MediaSourceResolver: Send + Sync + std::fmt::Debug {
    /// Resolve the stream for `title_id` on behalf of `profile_id`.
    /// Fails when the title is unknown or the account is not entitled to it.
    async fn resolve_playback(
        &self,
        title_id: &TitleId,
        profile_id: &ProfileId,
        request: &PlaybackRequest,
    ) -> AppResult<PlaybackInfo>;

    /// All encoded variants of a title.
    async fn list_streams(&self, _title_id: &TitleId) -> AppResult<Vec<StreamVariant>> {
        // Resolvers without a listing endpoint only expose the resolved stream
        Ok(Vec::new())
    }
}

/// Remote store of per-profile watch progress.
#[async_trait]
pub trait ProgressStore: Send + Sync + std::fmt::Debug {
    /// Stored position for the title, zero when nothing was saved yet.
    async fn get_progress(
        &self,
        profile_id: &ProfileId,
        title_id: &TitleId,
    ) -> AppResult<StoredProgress>;

    async fn save_progress(&self, checkpoint: &ProgressCheckpoint) -> AppResult<()>;
}
