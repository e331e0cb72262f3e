use super::{Role, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

impl RefreshToken {
    /// Mints a fresh, unguessable refresh id (122 random bits).
    pub fn generate() -> Self {
        RefreshToken(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The claims a token is issued for, without its time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub subject_id: SubjectId,
    pub role: Role,
}

/// Claims carried by a signed access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenPayload {
    pub subject_id: SubjectId,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessTokenPayload {
    /// Drops `issued_at`/`expires_at` so the claims can be signed again.
    pub fn into_grant(self) -> AccessGrant {
        AccessGrant {
            subject_id: self.subject_id,
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}
