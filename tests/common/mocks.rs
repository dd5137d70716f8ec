use async_trait::async_trait;
use cinetrack::{
    backends::{CatalogService, MediaSourceResolver, ProgressStore},
    models::*,
    player::{MediaElement, OrientationLock},
    utils::{AppError, AppResult},
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct MockProgressStore {
    stored: Mutex<StoredProgress>,
    saved: Mutex<Vec<ProgressCheckpoint>>,
    lookups: AtomicUsize,
    lookup_delay: Mutex<Option<Duration>>,
    save_delay: Mutex<Option<Duration>>,
    fail_lookups: AtomicBool,
    fail_saves: AtomicBool,
}

impl MockProgressStore {
    pub fn with_stored_seconds(seconds: u64) -> Self {
        let store = Self::default();
        store.set_stored_seconds(seconds);
        store
    }

    pub fn set_stored_seconds(&self, seconds: u64) {
        *self.stored.lock().unwrap() = StoredProgress::at_seconds(seconds);
    }

    pub fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_save_delay(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<ProgressCheckpoint> {
        self.saved.lock().unwrap().clone()
    }

    pub fn saved_with(&self, reason: CheckpointReason) -> Vec<ProgressCheckpoint> {
        self.saved()
            .into_iter()
            .filter(|c| c.reason == reason)
            .collect()
    }
}

#[async_trait]
impl ProgressStore for MockProgressStore {
    async fn get_progress(
        &self,
        _profile_id: &ProfileId,
        _title_id: &TitleId,
    ) -> AppResult<StoredProgress> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Http {
                status: 503,
                detail: "Service unavailable".to_string(),
            });
        }
        Ok(*self.stored.lock().unwrap())
    }

    async fn save_progress(&self, checkpoint: &ProgressCheckpoint) -> AppResult<()> {
        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Http {
                status: 500,
                detail: "Internal server error".to_string(),
            });
        }
        self.saved.lock().unwrap().push(checkpoint.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockCatalog {
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    not_found: AtomicBool,
}

impl MockCatalog {
    pub fn with_delay(delay: Duration) -> Self {
        let catalog = Self::default();
        *catalog.delay.lock().unwrap() = Some(delay);
        catalog
    }

    pub fn set_not_found(&self, not_found: bool) {
        self.not_found.store(not_found, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogService for MockCatalog {
    async fn get_title_metadata(&self, title_id: &TitleId) -> AppResult<TitleMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.not_found.load(Ordering::SeqCst) {
            return Err(AppError::TitleNotFound(String::new()));
        }
        Ok(TitleMetadata {
            id: title_id.clone(),
            title: "The Long Night".to_string(),
            synopsis: Some("A test movie".to_string()),
            release_date: None,
            duration_minutes: Some(90),
            rating: Some("PG-13".to_string()),
            genres: vec!["Drama".to_string()],
        })
    }
}

#[derive(Debug, Default)]
pub struct MockResolver {
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    refusal: Mutex<Option<String>>,
    last_profile: Mutex<Option<ProfileId>>,
}

impl MockResolver {
    pub fn with_delay(delay: Duration) -> Self {
        let resolver = Self::default();
        *resolver.delay.lock().unwrap() = Some(delay);
        resolver
    }

    /// Make every resolution fail with the given backend detail.
    pub fn refuse_with(&self, detail: Option<&str>) {
        *self.refusal.lock().unwrap() = detail.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_profile(&self) -> Option<ProfileId> {
        self.last_profile.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSourceResolver for MockResolver {
    async fn resolve_playback(
        &self,
        title_id: &TitleId,
        profile_id: &ProfileId,
        request: &PlaybackRequest,
    ) -> AppResult<PlaybackInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_profile.lock().unwrap() = Some(profile_id.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let refusal = self.refusal.lock().unwrap().clone();
        if let Some(detail) = refusal {
            return Err(AppError::PlaybackUnavailable(detail));
        }
        Ok(PlaybackInfo {
            url: format!("https://cdn.example/stream/{}?perfil={}", title_id, profile_id),
            quality: request.quality.clone().unwrap_or_else(|| "auto".to_string()),
            asset_id: Some(9),
            history_id: None,
            mime_type: Some("video/mp4".to_string()),
            is_trailer: false,
            expires_at: None,
        })
    }
}

#[derive(Debug, Default)]
struct ElementClock {
    base: Duration,
    running_since: Option<Instant>,
}

impl ElementClock {
    fn now(&self) -> Duration {
        self.base + self.running_since.map(|s| s.elapsed()).unwrap_or_default()
    }
}

/// A media element whose position advances with tokio time while running.
#[derive(Debug, Default)]
pub struct MockMediaElement {
    clock: Mutex<ElementClock>,
    seeks: Mutex<Vec<Duration>>,
    fullscreen_requests: AtomicUsize,
    detached: AtomicBool,
    position_delay: Mutex<Duration>,
}

impl MockMediaElement {
    pub fn at_seconds(seconds: u64) -> Self {
        let element = Self::default();
        element.set_position(Duration::from_secs(seconds));
        element
    }

    pub fn start(&self) {
        let mut clock = self.clock.lock().unwrap();
        if clock.running_since.is_none() {
            clock.running_since = Some(Instant::now());
        }
    }

    pub fn stop(&self) {
        let mut clock = self.clock.lock().unwrap();
        clock.base = clock.now();
        clock.running_since = None;
    }

    pub fn set_position(&self, position: Duration) {
        let mut clock = self.clock.lock().unwrap();
        clock.base = position;
        if clock.running_since.is_some() {
            clock.running_since = Some(Instant::now());
        }
    }

    pub fn position_now(&self) -> Duration {
        self.clock.lock().unwrap().now()
    }

    /// Make every position read return this long after it was taken.
    pub fn set_position_delay(&self, delay: Duration) {
        *self.position_delay.lock().unwrap() = delay;
    }

    /// Simulate the element being unmounted.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn fullscreen_requests(&self) -> usize {
        self.fullscreen_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaElement for MockMediaElement {
    async fn position(&self) -> Option<Duration> {
        if self.detached.load(Ordering::SeqCst) {
            return None;
        }
        let position = self.position_now();

        let delay = *self.position_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Some(position)
    }

    async fn seek(&self, position: Duration) -> AppResult<()> {
        self.seeks.lock().unwrap().push(position);
        self.set_position(position);
        Ok(())
    }

    async fn request_fullscreen(&self) -> AppResult<()> {
        self.fullscreen_requests.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Media("fullscreen needs a user gesture".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MockOrientation {
    locks: AtomicUsize,
    unlocks: AtomicUsize,
    refuse: AtomicBool,
}

impl MockOrientation {
    pub fn refusing() -> Self {
        let orientation = Self::default();
        orientation.refuse.store(true, Ordering::SeqCst);
        orientation
    }

    pub fn locks(&self) -> usize {
        self.locks.load(Ordering::SeqCst)
    }

    pub fn unlocks(&self) -> usize {
        self.unlocks.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> AppResult<()> {
        if self.refuse.load(Ordering::SeqCst) {
            Err(AppError::Unsupported("orientation lock"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrientationLock for MockOrientation {
    async fn lock_landscape(&self) -> AppResult<()> {
        self.locks.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn unlock(&self) -> AppResult<()> {
        self.unlocks.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }
}
