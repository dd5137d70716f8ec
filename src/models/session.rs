use serde::{Deserialize, Serialize};

use super::ProfileId;
use crate::utils::errors::{AppError, AppResult};

/// Bearer credentials issued by the authentication service.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl AuthTokens {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: access.into(),
            refresh,
        }
    }
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access", &"<redacted>")
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Who is watching. Built by the caller and handed to the session; the
/// tracker never looks the active profile up on its own.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub profile_id: Option<ProfileId>,
    pub tokens: Option<AuthTokens>,
}

impl SessionContext {
    pub fn new(profile_id: Option<ProfileId>, tokens: Option<AuthTokens>) -> Self {
        Self { profile_id, tokens }
    }

    pub fn with_profile(profile_id: impl Into<ProfileId>) -> Self {
        Self {
            profile_id: Some(profile_id.into()),
            tokens: None,
        }
    }

    pub fn require_profile(&self) -> AppResult<&ProfileId> {
        self.profile_id.as_ref().ok_or(AppError::NoActiveProfile)
    }
}
