// Playback tracking defaults. Config values fall back to these.

/// Seconds between periodic progress checkpoints while playing.
pub const DEFAULT_CHECKPOINT_INTERVAL_SECS: u64 = 10;

/// A stored position is applied only when strictly greater than this.
pub const DEFAULT_RESUME_THRESHOLD_SECS: u64 = 0;

/// Upper bound on the resume-position lookup before playback proceeds
/// from the start.
pub const DEFAULT_RESUME_LOOKUP_TIMEOUT_SECS: u64 = 5;

// === Network ===
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
