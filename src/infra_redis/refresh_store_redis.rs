use crate::application_port::AuthError;
use crate::domain_port::RefreshStore;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

fn refresh_key(prefix: &str, refresh_id: &str) -> String {
    format!("{}:{}", prefix, refresh_id)
}

pub struct RedisRefreshStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRefreshStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRefreshStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, refresh_id: &str) -> String {
        refresh_key(&self.prefix, refresh_id)
    }
}

#[async_trait::async_trait]
impl RefreshStore for RedisRefreshStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        // SET EX rejects a zero expiry
        let _: () = conn
            .set_ex(&key, value, ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }

    async fn delete(&self, key: &str) -> Result<bool, AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(removed > 0)
    }
}
