mod identifiers;
mod media;
mod session;

pub use identifiers::{ProfileId, TitleId};
pub use media::{
    CheckpointReason, PlaybackInfo, PlaybackRequest, ProgressCheckpoint, StoredProgress,
    StreamOrigin, StreamVariant, TitleMetadata,
};
pub use session::{AuthTokens, SessionContext};
