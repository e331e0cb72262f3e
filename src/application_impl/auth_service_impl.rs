use crate::application_impl::Fingerprinter;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{RefreshStore, UserDirectory};
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// How far ahead of the clock a rotated token's issued-at may be pinned.
const MAX_ISSUE_SKEW: chrono::Duration = chrono::Duration::seconds(1);

/// Issued-at for a token replacing one issued at `previous`: strictly after
/// it, but never more than [`MAX_ISSUE_SKEW`] past `now`.
fn rotated_issued_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    (previous + chrono::Duration::milliseconds(1)).clamp(now, now + MAX_ISSUE_SKEW)
}

/// Issues access/refresh pairs and rotates them.
///
/// Holds no state of its own: the refresh store is the only record of an
/// outstanding refresh token, so concurrency safety comes from the store's
/// per-key atomicity.
pub struct TokenLifecycleManager {
    directory: Arc<dyn UserDirectory>,
    signer: Arc<dyn TokenSigner>,
    store: Arc<dyn RefreshStore>,
    fingerprinter: Fingerprinter,
    refresh_ttl: Duration,
}

impl TokenLifecycleManager {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        signer: Arc<dyn TokenSigner>,
        store: Arc<dyn RefreshStore>,
        fingerprinter: Fingerprinter,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            directory,
            signer,
            store,
            fingerprinter,
            refresh_ttl,
        }
    }

    fn ttl_secs(&self) -> u64 {
        self.refresh_ttl.as_secs().max(1)
    }

    /// Signs `grant`, mints a refresh id and records the binding between them.
    async fn issue_pair(
        &self,
        grant: &AccessGrant,
        issued_at: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.signer.issue_at(grant, issued_at)?;
        let refresh_token = RefreshToken::generate();
        let fingerprint = self.fingerprinter.fingerprint(&access_token);

        self.store
            .set(refresh_token.as_str(), &fingerprint, self.ttl_secs())
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Removes a record this call just created after losing a rotation race.
    async fn discard(&self, refresh_token: &RefreshToken) {
        if let Err(e) = self.store.delete(refresh_token.as_str()).await {
            warn!("failed to discard orphaned refresh token: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl AuthService for TokenLifecycleManager {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, credential } = request;

        if !self.directory.email_exists(&email).await? {
            return Err(AuthError::UserNotFound);
        }
        let user = self
            .directory
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .directory
            .verify_credential(&user.id, &credential)
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let grant = AccessGrant {
            subject_id: user.id.clone(),
            role: user.role,
        };
        let tokens = self.issue_pair(&grant, Utc::now()).await?;
        info!(subject = %user.id, role = %user.role, "login");

        Ok(LoginResult { user, tokens })
    }

    async fn login_subject(&self, subject_id: &SubjectId) -> Result<TokenPair, AuthError> {
        let user = self
            .directory
            .find_by_subject_id(subject_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let grant = AccessGrant {
            subject_id: user.id.clone(),
            role: user.role,
        };
        let tokens = self.issue_pair(&grant, Utc::now()).await?;
        info!(subject = %user.id, role = %user.role, "login");

        Ok(tokens)
    }

    async fn refresh(&self, request: RefreshInput) -> Result<TokenPair, AuthError> {
        let RefreshInput {
            access_token,
            refresh_token,
        } = request;

        let Some(stored) = self.store.get(refresh_token.as_str()).await? else {
            debug!("refresh rejected: id absent or expired");
            return Err(AuthError::RefreshTokenExpiredOrUnknown);
        };

        if !self.fingerprinter.matches(&access_token, &stored) {
            debug!("refresh rejected: fingerprint mismatch");
            return Err(AuthError::RefreshTokenExpiredOrUnknown);
        }

        // The fingerprint match proves we signed this token, so an unverified
        // decode is enough here. An expired access token is fine to rotate.
        let old = self
            .signer
            .decode(&access_token)
            .map_err(|e| AuthError::InternalError(format!("decode after match: {}", e)))?;

        let issued_at = rotated_issued_at(old.issued_at, Utc::now());
        let subject_id = old.subject_id.clone();
        let grant = old.into_grant();

        // Create before delete: the new record must exist before the old one goes.
        let pair = self.issue_pair(&grant, issued_at).await?;

        match self.store.delete(refresh_token.as_str()).await {
            Ok(true) => {
                info!(subject = %subject_id, "refresh token rotated");
                Ok(pair)
            }
            Ok(false) => {
                debug!(subject = %subject_id, "refresh rejected: lost rotation race");
                self.discard(&pair.refresh_token).await;
                Err(AuthError::RefreshTokenExpiredOrUnknown)
            }
            Err(e) => {
                warn!(subject = %subject_id, "failed to invalidate rotated refresh token: {}", e);
                Ok(pair)
            }
        }
    }

    async fn verify_access(&self, token: &AccessToken) -> Result<AccessTokenPayload, AuthError> {
        Ok(self.signer.verify(token)?)
    }

    async fn current_user(&self, subject_id: &SubjectId) -> Result<UserRecord, AuthError> {
        self.directory
            .find_by_subject_id(subject_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
