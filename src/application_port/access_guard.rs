use crate::application_port::TokenError;
use crate::domain_model::{AccessToken, AccessTokenPayload, Role};

pub const ONLY_ADMIN: &[Role] = &[Role::Admin];
pub const ONLY_SUPER_ADMIN: &[Role] = &[Role::SuperAdmin];
pub const ADMIN_AND_SUPER_ADMIN: &[Role] = &[Role::Admin, Role::SuperAdmin];
pub const ANY_ROLE: &[Role] = &[Role::User, Role::Admin, Role::SuperAdmin];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    #[error("token expired")]
    Expired,
    /// Failed verification for any reason other than expiry.
    #[error("token invalid: {0}")]
    Invalid(TokenError),
    #[error("forbidden")]
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allow(AccessTokenPayload),
    Deny(DenyReason),
}

pub trait AccessGuard: Send + Sync {
    fn authorize(&self, token: &AccessToken, required_roles: &[Role]) -> Authorization;
}
