use crate::domain_model::AccessToken;
use anyhow::anyhow;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Binds a refresh id to the access token it was issued alongside.
///
/// The fingerprint is a keyed MAC of the token, so a leaked store entry
/// cannot be matched against a guessed token without the key.
#[derive(Clone)]
pub struct Fingerprinter {
    mac: HmacSha256,
}

impl Fingerprinter {
    pub fn new(key: &[u8]) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(key).map_err(|e| anyhow!(e))?;
        Ok(Self { mac })
    }

    pub fn fingerprint(&self, token: &AccessToken) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.0.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time comparison against a stored fingerprint.
    pub fn matches(&self, token: &AccessToken, stored_hex: &str) -> bool {
        let Ok(expected) = hex::decode(stored_hex) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(token.0.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}
