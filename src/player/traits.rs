use async_trait::async_trait;
use std::time::Duration;

use crate::utils::errors::{AppError, AppResult};

/// The playing media element as seen by the tracker. The element is driven
/// by the UI; the tracker only reads its position and asks it to seek.
#[async_trait]
pub trait MediaElement: Send + Sync + std::fmt::Debug {
    /// Current playback position, `None` once the element is gone.
    async fn position(&self) -> Option<Duration>;
    async fn seek(&self, position: Duration) -> AppResult<()>;
    async fn request_fullscreen(&self) -> AppResult<()>;
}

/// Screen orientation control. Every call is advisory.
#[async_trait]
pub trait OrientationLock: Send + Sync + std::fmt::Debug {
    async fn lock_landscape(&self) -> AppResult<()>;
    async fn unlock(&self) -> AppResult<()>;
}

/// For platforms without orientation control.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrientationLock;

#[async_trait]
impl OrientationLock for NoOrientationLock {
    async fn lock_landscape(&self) -> AppResult<()> {
        Err(AppError::Unsupported("orientation lock"))
    }

    async fn unlock(&self) -> AppResult<()> {
        Err(AppError::Unsupported("orientation lock"))
    }
}
