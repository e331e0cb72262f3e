use crate::application_port::AuthError;

/// TTL-keyed map holding `refresh id -> access token fingerprint`.
///
/// Every operation is atomic per key. Entries vanish on their own once the
/// TTL elapses; `get` after that reports `None`.
#[async_trait::async_trait]
pub trait RefreshStore: Send + Sync {
    /// Last `set` wins.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AuthError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    /// Returns true iff a live entry was removed by this call.
    async fn delete(&self, key: &str) -> Result<bool, AuthError>;
}
