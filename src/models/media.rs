use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ProfileId, TitleId};

/// Display fields of a title, as shown under the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMetadata {
    pub id: TitleId,
    pub title: String,
    pub synopsis: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<u32>,
    pub rating: Option<String>,
    pub genres: Vec<String>,
}

/// Optional selectors passed to the playback resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackRequest {
    /// Preferred quality label such as `1080p`; the resolver picks the best
    /// available one when unset.
    pub quality: Option<String>,
    pub trailer: Option<bool>,
}

impl PlaybackRequest {
    pub fn with_quality(quality: impl Into<String>) -> Self {
        Self {
            quality: Some(quality.into()),
            trailer: None,
        }
    }
}

/// Where and how to stream a title. Resolved once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    pub url: String,
    pub quality: String,
    pub asset_id: Option<i64>,
    pub history_id: Option<i64>,
    pub mime_type: Option<String>,
    pub is_trailer: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamOrigin {
    Remote,
    Local,
}

/// One encoded variant of a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub asset_id: i64,
    pub origin: StreamOrigin,
    pub location: String,
    pub quality: String,
    pub mime_type: Option<String>,
    pub is_trailer: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Position remembered by the progress store for one profile and title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredProgress {
    pub position: Duration,
    pub finished: bool,
}

impl StoredProgress {
    pub fn at_seconds(seconds: u64) -> Self {
        Self {
            position: Duration::from_secs(seconds),
            finished: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointReason {
    Periodic,
    Paused,
    Ended,
    Teardown,
}

/// A single write of the playback position to the progress store.
///
/// `sequence` grows by one for every checkpoint a session produces and
/// `read_at` is the instant the position was sampled from the media element.
/// Both stay on the client: the progress endpoint only takes the position
/// and the finished flag, so ordering is enforced by the checkpoint queue
/// delivering one write at a time. They show up in logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCheckpoint {
    pub title_id: TitleId,
    pub profile_id: ProfileId,
    pub position_seconds: u64,
    pub finished: bool,
    pub sequence: u64,
    pub read_at: DateTime<Utc>,
    pub reason: CheckpointReason,
}

