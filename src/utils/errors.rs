use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No active profile selected")]
    NoActiveProfile,

    #[error("Title not found: {0}")]
    TitleNotFound(String),

    #[error("Playback not available: {0}")]
    PlaybackUnavailable(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response ({status}): {detail}")]
    Http { status: u16, detail: String },

    #[error("Media element error: {0}")]
    Media(String),

    #[error("Not supported on this platform: {0}")]
    Unsupported(&'static str),

    #[error("Session is not ready for playback")]
    SessionNotReady,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

const GENERIC_LOAD_FAILURE: &str = "Failed to load the video";

impl AppError {
    /// Message suitable for the player's error screen.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NoActiveProfile => {
                "No active profile. Please select a profile first.".to_string()
            }
            AppError::TitleNotFound(detail)
            | AppError::PlaybackUnavailable(detail)
            | AppError::Http { detail, .. }
                if !detail.is_empty() =>
            {
                detail.clone()
            }
            AppError::Authentication(_) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            _ => GENERIC_LOAD_FAILURE.to_string(),
        }
    }
}
