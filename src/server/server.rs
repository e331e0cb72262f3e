use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub access_guard: Arc<dyn AccessGuard>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let cancel = CancellationToken::new();

        let directory = Arc::new(InMemoryUserDirectory::new());
        for user in &settings.directory.users {
            directory
                .insert(
                    UserRecord {
                        id: SubjectId(user.id.clone()),
                        email: user.email.clone(),
                        role: user.role,
                    },
                    &user.credential,
                )
                .map_err(|e| anyhow!("seeding user {}: {}", user.id, e))?;
        }
        info!(users = directory.len(), "user directory seeded");

        let signer: Arc<dyn TokenSigner> = Arc::new(JwtHs256Signer::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            signing_key: settings.auth.signing_secret.clone().into_bytes(),
        }));
        let fingerprinter = Fingerprinter::new(settings.auth.fingerprint_key().as_bytes())?;

        let mut sweeper_handle = None;
        let refresh_store: Arc<dyn RefreshStore> = match settings.store.backend.as_str() {
            "memory" => {
                let store = Arc::new(InMemoryRefreshStore::new());
                sweeper_handle = Some(store.clone().spawn_sweeper(
                    Duration::from_secs(settings.store.sweep_interval_secs),
                    cancel.clone(),
                ));
                store
            }
            "redis" => {
                let url = settings
                    .store
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.redis_url is not set"))?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisRefreshStore::new(
                    redis_manager,
                    settings.store.prefix.clone(),
                ))
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(TokenLifecycleManager::new(
            directory,
            signer.clone(),
            refresh_store,
            fingerprinter,
            Duration::from_secs(settings.auth.refresh_ttl_secs),
        ));
        let access_guard: Arc<dyn AccessGuard> = Arc::new(JwtAccessGuard::new(signer));

        info!(backend = %settings.store.backend, "server started");

        Ok(Self {
            auth_service,
            access_guard,
            sweeper_handle: Mutex::new(sweeper_handle),
            cancel,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = match self.sweeper_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }
    }
}
