use crate::application_port::AuthError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_subject_id(&self, id: &SubjectId) -> Result<Option<UserRecord>, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;
    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;
    /// Whether `credential` authenticates `id`. Unknown subjects never match.
    async fn verify_credential(&self, id: &SubjectId, credential: &str)
    -> Result<bool, AuthError>;
}
