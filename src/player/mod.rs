pub mod controller;
pub mod progress_tracker;
pub mod traits;

pub use controller::{TrackerCommand, TrackerController, TrackerHandle};
pub use progress_tracker::{
    PlaybackState, ProgressTracker, ResumeState, TrackerServices, TrackerSettings,
    TrackerSnapshot,
};
pub use traits::{MediaElement, NoOrientationLock, OrientationLock};
