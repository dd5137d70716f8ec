use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::traits::{MediaElement, OrientationLock};
use crate::backends::ProgressStore;
use crate::config::PlaybackConfig;
use crate::models::{CheckpointReason, ProfileId, ProgressCheckpoint, TitleId};
use crate::services::CheckpointQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    /// No play event seen yet.
    Pending,
    /// The saved position is being looked up.
    Loading,
    /// The saved position was looked up. `applied` is where the element was
    /// seeked to, if anywhere.
    Loaded { applied: Option<Duration> },
}

/// Tracking knobs, usually taken from [`PlaybackConfig`].
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub checkpoint_interval: Duration,
    /// Saved positions at or below this are ignored.
    pub resume_threshold: Duration,
    pub resume_lookup_timeout: Duration,
    pub auto_fullscreen: bool,
    pub lock_orientation: bool,
}

impl From<&PlaybackConfig> for TrackerSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            checkpoint_interval: config.checkpoint_interval(),
            resume_threshold: Duration::from_secs(config.resume_threshold_secs),
            resume_lookup_timeout: config.resume_lookup_timeout(),
            auto_fullscreen: config.auto_fullscreen,
            lock_orientation: config.lock_orientation_in_fullscreen,
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

/// Point-in-time view of a tracker, for the UI and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub session_id: Uuid,
    pub state: PlaybackState,
    pub resume: ResumeState,
    pub progress_loaded: bool,
    pub resume_applied: Option<Duration>,
    pub finished: bool,
    pub fullscreen: bool,
    pub timer_active: bool,
    pub last_known_position: Duration,
    pub checkpoints_issued: u64,
}

/// Collaborators a tracker needs besides the media element.
#[derive(Debug, Clone)]
pub struct TrackerServices {
    pub store: Arc<dyn ProgressStore>,
    pub queue: CheckpointQueue,
    pub orientation: Arc<dyn OrientationLock>,
}

/// Shared between the tracker and its checkpoint timer task.
#[derive(Debug)]
struct CheckpointSource {
    title_id: TitleId,
    profile_id: ProfileId,
    element: Arc<dyn MediaElement>,
    queue: CheckpointQueue,
    sequence: AtomicU64,
    last_position_ms: AtomicU64,
}

impl CheckpointSource {
    /// Read the element's position and remember it.
    async fn sample(&self) -> Option<Duration> {
        let position = self.element.position().await?;
        self.remember(position);
        Some(position)
    }

    fn remember(&self, position: Duration) {
        self.last_position_ms
            .store(position.as_millis() as u64, Ordering::Relaxed);
    }

    fn last_known(&self) -> Duration {
        Duration::from_millis(self.last_position_ms.load(Ordering::Relaxed))
    }

    fn issued(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    fn submit(&self, position: Duration, finished: bool, reason: CheckpointReason) {
        let checkpoint = ProgressCheckpoint {
            title_id: self.title_id.clone(),
            profile_id: self.profile_id.clone(),
            position_seconds: position.as_secs(),
            finished,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            read_at: Utc::now(),
            reason,
        };
        self.queue.submit(checkpoint);
    }
}

struct CheckpointTimer {
    cancel: CancellationToken,
    /// Held while a tick submits, so `stop` never returns mid-submission.
    gate: Arc<Mutex<()>>,
    handle: JoinHandle<()>,
}

impl CheckpointTimer {
    fn start(source: Arc<CheckpointSource>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let gate = Arc::new(Mutex::new(()));
        let handle = tokio::spawn(run_checkpoint_timer(
            source,
            period,
            cancel.clone(),
            gate.clone(),
        ));
        Self {
            cancel,
            gate,
            handle,
        }
    }

    fn stop(self) {
        {
            let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
            self.cancel.cancel();
        }
        self.handle.abort();
    }
}

async fn run_checkpoint_timer(
    source: Arc<CheckpointSource>,
    period: Duration,
    cancel: CancellationToken,
    gate: Arc<Mutex<()>>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(position) = source.sample().await else {
            debug!("Media element gone, skipping checkpoint");
            continue;
        };

        let _gate = gate.lock().unwrap_or_else(PoisonError::into_inner);
        // Stopped while the position was being read
        if cancel.is_cancelled() {
            break;
        }
        source.submit(position, false, CheckpointReason::Periodic);
    }
}

/// One-shot lookup of the saved position, run off the event path so the
/// tracker keeps handling events while the store answers.
struct ResumeLookup {
    store: Arc<dyn ProgressStore>,
    source: Arc<CheckpointSource>,
    state: Arc<Mutex<ResumeState>>,
    threshold: Duration,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ResumeLookup {
    async fn run(self) {
        let stored = self.fetch().await;

        let applied = if self.cancel.is_cancelled() {
            debug!("Tracker gone, saved position discarded");
            None
        } else {
            self.seek_to(stored).await
        };

        *lock_resume(&self.state) = ResumeState::Loaded { applied };
    }

    async fn fetch(&self) -> Duration {
        let lookup = self
            .store
            .get_progress(&self.source.profile_id, &self.source.title_id);

        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(progress)) => progress.position,
            Ok(Err(e)) => {
                warn!(
                    "Failed to load saved progress for {}: {}",
                    self.source.title_id, e
                );
                Duration::ZERO
            }
            Err(_) => {
                warn!("Timed out loading saved progress for {}", self.source.title_id);
                Duration::ZERO
            }
        }
    }

    async fn seek_to(&self, stored: Duration) -> Option<Duration> {
        if stored <= self.threshold {
            debug!("No saved position for {}", self.source.title_id);
            return None;
        }

        // Too late: playback already moved past the saved point
        if let Some(current) = self.source.element.position().await
            && current >= stored
        {
            debug!(
                "Skipping resume to {}s, already at {}s",
                stored.as_secs(),
                current.as_secs()
            );
            return None;
        }

        match self.source.element.seek(stored).await {
            Ok(()) => {
                info!(
                    "Resuming {} at {}s",
                    self.source.title_id,
                    stored.as_secs()
                );
                self.source.remember(stored);
                Some(stored)
            }
            Err(e) => {
                warn!("Failed to seek to saved position: {}", e);
                None
            }
        }
    }
}

fn lock_resume(state: &Mutex<ResumeState>) -> MutexGuard<'_, ResumeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks watch progress of one title for one profile during one viewing
/// session.
///
/// The tracker resumes playback at the saved position after the first play
/// event, checkpoints the position on a fixed interval while playing, and
/// writes once more on pause, end of stream and teardown. A checkpoint timer
/// exists exactly while the state is [`PlaybackState::Playing`], including
/// while the saved position is still being looked up. Writes go through the
/// [`CheckpointQueue`] and are never awaited, so a slow or failing progress
/// store cannot stall playback.
pub struct ProgressTracker {
    session_id: Uuid,
    source: Arc<CheckpointSource>,
    store: Arc<dyn ProgressStore>,
    orientation: Arc<dyn OrientationLock>,
    settings: TrackerSettings,
    state: PlaybackState,
    resume: Arc<Mutex<ResumeState>>,
    resume_task: Option<JoinHandle<()>>,
    resume_cancel: CancellationToken,
    timer: Option<CheckpointTimer>,
    finished: bool,
    fullscreen: bool,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("session_id", &self.session_id)
            .field("title_id", &self.source.title_id)
            .field("state", &self.state)
            .field("resume", &self.resume_state())
            .field("timer_active", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    pub fn new(
        session_id: Uuid,
        title_id: TitleId,
        profile_id: ProfileId,
        element: Arc<dyn MediaElement>,
        services: TrackerServices,
        settings: TrackerSettings,
    ) -> Self {
        let source = CheckpointSource {
            title_id,
            profile_id,
            element,
            queue: services.queue,
            sequence: AtomicU64::new(0),
            last_position_ms: AtomicU64::new(0),
        };

        Self {
            session_id,
            source: Arc::new(source),
            store: services.store,
            orientation: services.orientation,
            settings,
            state: PlaybackState::Idle,
            resume: Arc::new(Mutex::new(ResumeState::Pending)),
            resume_task: None,
            resume_cancel: CancellationToken::new(),
            timer: None,
            finished: false,
            fullscreen: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn resume_state(&self) -> ResumeState {
        *lock_resume(&self.resume)
    }

    pub fn progress_loaded(&self) -> bool {
        matches!(self.resume_state(), ResumeState::Loaded { .. })
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let resume = self.resume_state();
        TrackerSnapshot {
            session_id: self.session_id,
            state: self.state,
            resume,
            progress_loaded: matches!(resume, ResumeState::Loaded { .. }),
            resume_applied: match resume {
                ResumeState::Loaded { applied } => applied,
                ResumeState::Pending | ResumeState::Loading => None,
            },
            finished: self.finished,
            fullscreen: self.fullscreen,
            timer_active: self.timer.is_some(),
            last_known_position: self.source.last_known(),
            checkpoints_issued: self.source.issued(),
        }
    }

    /// The element started or resumed playback.
    pub async fn on_play(&mut self) {
        if self.state == PlaybackState::Playing {
            debug!("Play event while already playing");
            self.start_tracking();
            return;
        }

        debug!("Session {}: {:?} -> Playing", self.session_id, self.state);
        if self.state == PlaybackState::Ended {
            // Replay
            self.finished = false;
        }
        self.state = PlaybackState::Playing;
        self.start_tracking();

        if self.resume_state() == ResumeState::Pending {
            self.begin_resume_lookup();
        }

        if self.settings.auto_fullscreen
            && let Err(e) = self.source.element.request_fullscreen().await
        {
            debug!("Fullscreen request refused: {}", e);
        }
    }

    fn begin_resume_lookup(&mut self) {
        *lock_resume(&self.resume) = ResumeState::Loading;

        let lookup = ResumeLookup {
            store: self.store.clone(),
            source: self.source.clone(),
            state: self.resume.clone(),
            threshold: self.settings.resume_threshold,
            timeout: self.settings.resume_lookup_timeout,
            cancel: self.resume_cancel.clone(),
        };
        self.resume_task = Some(tokio::spawn(lookup.run()));
    }

    /// Wait for the saved-position lookup started by the first play event,
    /// if one is in flight.
    pub async fn resume_settled(&mut self) {
        if let Some(task) = self.resume_task.take()
            && let Err(e) = task.await
        {
            warn!("Saved position lookup did not finish: {}", e);
        }
    }

    /// Start the periodic checkpoint timer. A no-op unless playing, and when
    /// a timer is already running.
    pub fn start_tracking(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!("Not playing, checkpoint timer not started");
            return;
        }
        if self.timer.is_some() {
            debug!("Checkpoint timer already running");
            return;
        }

        self.timer = Some(CheckpointTimer::start(
            self.source.clone(),
            self.settings.checkpoint_interval,
        ));
    }

    fn stop_tracking(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop();
        }
    }

    pub async fn on_pause(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!("Pause event ignored in state {:?}", self.state);
            return;
        }

        self.stop_tracking();
        self.state = PlaybackState::Paused;
        debug!("Session {}: Playing -> Paused", self.session_id);

        let position = self.current_position().await;
        self.source
            .submit(position, false, CheckpointReason::Paused);
    }

    /// End of stream reported by the element.
    pub async fn on_ended(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            debug!("End of stream ignored in state {:?}", self.state);
            return;
        }

        self.stop_tracking();
        self.state = PlaybackState::Ended;
        self.finished = true;

        let position = self.current_position().await;
        info!(
            "Session {}: finished {} at {}s",
            self.session_id,
            self.source.title_id,
            position.as_secs()
        );
        self.source.submit(position, true, CheckpointReason::Ended);
    }

    /// Fullscreen changes only drive the orientation lock; failures are
    /// swallowed.
    pub async fn on_fullscreen_change(&mut self, entered: bool) {
        self.fullscreen = entered;
        if !self.settings.lock_orientation {
            return;
        }

        let result = if entered {
            self.orientation.lock_landscape().await
        } else {
            self.orientation.unlock().await
        };

        if let Err(e) = result {
            debug!(
                "Orientation {} refused: {}",
                if entered { "lock" } else { "unlock" },
                e
            );
        }
    }

    /// Stop tracking and hand a final checkpoint to the queue. The write is
    /// not awaited; it completes after this tracker is gone. A lookup still
    /// in flight finishes but no longer seeks.
    pub async fn teardown(mut self) {
        self.resume_cancel.cancel();
        self.stop_tracking();

        let position = self.current_position().await;
        if position.as_secs() > 0 {
            info!(
                "Session {}: leaving {} at {}s",
                self.session_id,
                self.source.title_id,
                position.as_secs()
            );
            self.source
                .submit(position, false, CheckpointReason::Teardown);
        } else {
            debug!("Session {}: nothing watched, no final checkpoint", self.session_id);
        }

        if self.settings.lock_orientation
            && let Err(e) = self.orientation.unlock().await
        {
            debug!("Orientation unlock refused: {}", e);
        }
    }

    /// The element's position, or the last one read if it is unavailable.
    async fn current_position(&self) -> Duration {
        match self.source.sample().await {
            Some(position) => position,
            None => self.source.last_known(),
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.resume_cancel.cancel();
        self.stop_tracking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let config = PlaybackConfig {
            checkpoint_interval_secs: 15,
            resume_threshold_secs: 5,
            auto_fullscreen: false,
            ..Default::default()
        };

        let settings = TrackerSettings::from(&config);
        assert_eq!(settings.checkpoint_interval, Duration::from_secs(15));
        assert_eq!(settings.resume_threshold, Duration::from_secs(5));
        assert!(!settings.auto_fullscreen);
        assert!(settings.lock_orientation);
    }

    #[test]
    fn test_default_settings() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.checkpoint_interval, Duration::from_secs(10));
        assert_eq!(settings.resume_threshold, Duration::ZERO);
    }
}
