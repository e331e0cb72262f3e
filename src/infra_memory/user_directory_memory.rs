use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::UserDirectory;
use constant_time_eq::constant_time_eq;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sha2::{Digest, Sha256};

struct DirectoryEntry {
    user: UserRecord,
    credential_digest: Vec<u8>,
}

fn digest(credential: &str) -> Vec<u8> {
    Sha256::digest(credential.as_bytes()).to_vec()
}

/// User directory held in memory, seeded at startup.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    by_id: DashMap<SubjectId, DirectoryEntry>,
    id_by_email: DashMap<String, SubjectId>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `user`. Emails are unique across the directory.
    pub fn insert(&self, user: UserRecord, credential: &str) -> Result<(), AuthError> {
        match self.id_by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(AuthError::EmailAlreadyTaken),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }
        let entry = DirectoryEntry {
            credential_digest: digest(credential),
            user,
        };
        self.by_id.insert(entry.user.id.clone(), entry);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_subject_id(&self, id: &SubjectId) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.by_id.get(id).map(|entry| entry.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let Some(id) = self.id_by_email.get(email).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find_by_subject_id(&id).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.id_by_email.contains_key(email))
    }

    async fn verify_credential(
        &self,
        id: &SubjectId,
        credential: &str,
    ) -> Result<bool, AuthError> {
        Ok(self
            .by_id
            .get(id)
            .map(|entry| constant_time_eq(&entry.credential_digest, &digest(credential)))
            .unwrap_or(false))
    }
}
