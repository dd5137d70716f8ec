pub mod checkpoint_queue;
pub mod playback_session;

pub use checkpoint_queue::CheckpointQueue;
pub use playback_session::{PlaybackServices, PlaybackSession, ResolvedMedia, SessionPhase};
