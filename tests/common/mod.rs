#![allow(dead_code)]

pub mod mocks;

use cinetrack::{
    models::{ProfileId, TitleId},
    player::{ProgressTracker, TrackerServices, TrackerSettings},
    services::CheckpointQueue,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub use mocks::{MockCatalog, MockMediaElement, MockOrientation, MockProgressStore, MockResolver};

/// One tracked title ("t42" for profile "p1") with mock collaborators.
pub struct TrackerHarness {
    pub store: Arc<MockProgressStore>,
    pub element: Arc<MockMediaElement>,
    pub orientation: Arc<MockOrientation>,
    pub queue: CheckpointQueue,
    pub worker: JoinHandle<()>,
}

impl TrackerHarness {
    pub fn new(store: MockProgressStore) -> Self {
        Self::with_parts(store, MockMediaElement::default(), MockOrientation::default())
    }

    pub fn with_parts(
        store: MockProgressStore,
        element: MockMediaElement,
        orientation: MockOrientation,
    ) -> Self {
        let store = Arc::new(store);
        let (queue, worker) = CheckpointQueue::spawn(store.clone());
        Self {
            store,
            element: Arc::new(element),
            orientation: Arc::new(orientation),
            queue,
            worker,
        }
    }

    pub fn tracker(&self) -> ProgressTracker {
        self.tracker_with(TrackerSettings::default())
    }

    pub fn tracker_with(&self, settings: TrackerSettings) -> ProgressTracker {
        ProgressTracker::new(
            Uuid::new_v4(),
            TitleId::new("t42"),
            ProfileId::new("p1"),
            self.element.clone(),
            TrackerServices {
                store: self.store.clone(),
                queue: self.queue.clone(),
                orientation: self.orientation.clone(),
            },
            settings,
        )
    }

    /// Wait until every checkpoint queued so far reached the store.
    pub async fn settle(&self) {
        self.queue.flush().await;
    }
}

pub fn secs(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}
