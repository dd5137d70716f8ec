use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backends::{CatalogService, MediaSourceResolver, ProgressStore, StreamingApi};
use crate::models::{PlaybackInfo, PlaybackRequest, SessionContext, TitleId, TitleMetadata};
use crate::player::{
    MediaElement, OrientationLock, ProgressTracker, TrackerController, TrackerHandle,
    TrackerServices, TrackerSettings,
};
use crate::services::CheckpointQueue;
use crate::utils::errors::{AppError, AppResult};

/// Everything a playback session talks to.
#[derive(Debug, Clone)]
pub struct PlaybackServices {
    pub catalog: Arc<dyn CatalogService>,
    pub resolver: Arc<dyn MediaSourceResolver>,
    pub store: Arc<dyn ProgressStore>,
    pub queue: CheckpointQueue,
}

impl PlaybackServices {
    /// Back every service with one REST client and start its checkpoint
    /// queue. The returned handle finishes once the queue has drained.
    pub fn from_api(api: StreamingApi) -> (Self, JoinHandle<()>) {
        let api = Arc::new(api);
        let (queue, worker) = CheckpointQueue::spawn(api.clone());
        let services = Self {
            catalog: api.clone(),
            resolver: api.clone(),
            store: api,
            queue,
        };
        (services, worker)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    pub title: TitleMetadata,
    pub playback: PlaybackInfo,
}

#[derive(Debug)]
pub enum SessionPhase {
    Loading,
    Ready(ResolvedMedia),
    Failed(AppError),
}

/// One viewing session of a title by the active profile.
#[derive(Debug)]
pub struct PlaybackSession {
    id: Uuid,
    title_id: TitleId,
    context: SessionContext,
    request: PlaybackRequest,
    phase: SessionPhase,
}

impl PlaybackSession {
    pub fn new(context: SessionContext, title_id: TitleId, request: PlaybackRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            title_id,
            context,
            request,
            phase: SessionPhase::Loading,
        }
    }

    /// Create a session and load its metadata and stream. Failures end up
    /// in [`SessionPhase::Failed`], never as a panic or an `Err`.
    pub async fn initialize(
        context: SessionContext,
        title_id: TitleId,
        services: &PlaybackServices,
        request: PlaybackRequest,
    ) -> Self {
        let mut session = Self::new(context, title_id, request);
        session.load(services).await;
        session
    }

    /// Run initialization again, e.g. after the user picked a profile.
    pub async fn reinitialize(&mut self, services: &PlaybackServices) {
        self.load(services).await;
    }

    async fn load(&mut self, services: &PlaybackServices) {
        self.phase = SessionPhase::Loading;

        self.phase = match self.resolve(services).await {
            Ok(media) => {
                info!(
                    "Session {} ready: {} ({})",
                    self.id, media.title.title, media.playback.quality
                );
                SessionPhase::Ready(media)
            }
            Err(e) => {
                warn!("Failed to start playback of {}: {}", self.title_id, e);
                SessionPhase::Failed(e)
            }
        };
    }

    async fn resolve(&self, services: &PlaybackServices) -> AppResult<ResolvedMedia> {
        // No request may go out without a profile
        let profile_id = self.context.require_profile()?;
        debug!(
            "Loading {} for profile {} (quality: {:?})",
            self.title_id, profile_id, self.request.quality
        );

        let (title, playback) = futures::try_join!(
            services.catalog.get_title_metadata(&self.title_id),
            services
                .resolver
                .resolve_playback(&self.title_id, profile_id, &self.request),
        )?;

        Ok(ResolvedMedia { title, playback })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title_id(&self) -> &TitleId {
        &self.title_id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready(_))
    }

    pub fn media(&self) -> Option<&ResolvedMedia> {
        match &self.phase {
            SessionPhase::Ready(media) => Some(media),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match &self.phase {
            SessionPhase::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Message to show in place of the player.
    pub fn error_message(&self) -> Option<String> {
        self.error().map(AppError::user_message)
    }

    /// Start progress tracking for the element now playing this session's
    /// stream.
    pub fn attach(
        &self,
        element: Arc<dyn MediaElement>,
        orientation: Arc<dyn OrientationLock>,
        services: &PlaybackServices,
        settings: TrackerSettings,
    ) -> AppResult<(TrackerHandle, JoinHandle<()>)> {
        if !self.is_ready() {
            return Err(AppError::SessionNotReady);
        }
        let profile_id = self.context.require_profile()?.clone();

        let tracker = ProgressTracker::new(
            self.id,
            self.title_id.clone(),
            profile_id,
            element,
            TrackerServices {
                store: services.store.clone(),
                queue: services.queue.clone(),
                orientation,
            },
            settings,
        );

        Ok(TrackerController::spawn(tracker))
    }
}
