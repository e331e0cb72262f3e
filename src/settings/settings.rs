use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::domain_model::Role;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub directory: Directory,
    pub http: Http,
    pub log: Log,
    pub store: Store,
}

#[derive(Deserialize)]
pub struct Auth {
    pub signing_secret: String,
    pub fingerprint_key: Option<String>, // falls back to signing_secret
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

// secrets stay out of the startup log
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl Auth {
    pub fn fingerprint_key(&self) -> &str {
        self.fingerprint_key
            .as_deref()
            .unwrap_or(&self.signing_secret)
    }
}

#[derive(Debug, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
}

#[derive(Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub credential: String,
}

impl std::fmt::Debug for DirectoryUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "redis"
    pub redis_url: Option<String>,
    pub prefix: String,
    pub sweep_interval_secs: u64,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "TOKENGATE";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.auth.signing_secret.is_empty() {
            bail!("auth.signing_secret must not be empty");
        }
        if self.auth.fingerprint_key().is_empty() {
            bail!("auth.fingerprint_key must not be empty");
        }
        if self.auth.access_ttl_secs == 0 {
            bail!("auth.access_ttl_secs must be positive");
        }
        if self.auth.refresh_ttl_secs == 0 {
            bail!("auth.refresh_ttl_secs must be positive");
        }
        match self.store.backend.as_str() {
            "memory" => {
                if self.store.sweep_interval_secs == 0 {
                    bail!("store.sweep_interval_secs must be positive");
                }
            }
            "redis" => {
                if self.store.redis_url.is_none() {
                    bail!("store.redis_url is required for the redis backend");
                }
            }
            other => bail!("unknown store backend: {}", other),
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        Ok(())
    }
}
