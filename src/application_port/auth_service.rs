use crate::application_port::{DenyReason, TokenError};
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,
    #[error("email already taken")]
    EmailAlreadyTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("refresh token expired or unknown")]
    RefreshTokenExpiredOrUnknown,
    #[error("token malformed")]
    TokenMalformed,
    #[error("token signature invalid")]
    TokenSignatureInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("forbidden")]
    Forbidden,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed => AuthError::TokenMalformed,
            TokenError::BadSignature => AuthError::TokenSignatureInvalid,
            TokenError::Encoding(e) => AuthError::InternalError(e),
        }
    }
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Expired => AuthError::TokenExpired,
            DenyReason::Invalid(e) => AuthError::from(e),
            DenyReason::Forbidden => AuthError::Forbidden,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub credential: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserRecord,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone)]
pub struct RefreshInput {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Resolves the user by email, checks the credential and issues a pair.
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Issues a pair for an already authenticated subject.
    async fn login_subject(&self, subject_id: &SubjectId) -> Result<TokenPair, AuthError>;
    /// Rotates a pair. The presented refresh token is single-use.
    async fn refresh(&self, request: RefreshInput) -> Result<TokenPair, AuthError>;
    async fn verify_access(&self, token: &AccessToken) -> Result<AccessTokenPayload, AuthError>;
    async fn current_user(&self, subject_id: &SubjectId) -> Result<UserRecord, AuthError>;
}
