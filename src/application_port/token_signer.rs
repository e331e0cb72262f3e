use crate::domain_model::{AccessGrant, AccessToken, AccessTokenPayload};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    BadSignature,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

pub trait TokenSigner: Send + Sync {
    /// Signs `grant` with issued-at pinned to `issued_at`.
    fn issue_at(
        &self,
        grant: &AccessGrant,
        issued_at: DateTime<Utc>,
    ) -> Result<(AccessToken, AccessTokenPayload), TokenError>;

    fn issue(&self, grant: &AccessGrant) -> Result<(AccessToken, AccessTokenPayload), TokenError> {
        self.issue_at(grant, Utc::now())
    }

    /// Checks signature and expiry.
    fn verify(&self, token: &AccessToken) -> Result<AccessTokenPayload, TokenError>;

    /// Reads the claims WITHOUT checking signature or expiry.
    ///
    /// The result is not authenticated. Only call this once trust in the token
    /// has been established some other way (e.g. a fingerprint match).
    fn decode(&self, token: &AccessToken) -> Result<AccessTokenPayload, TokenError>;
}
