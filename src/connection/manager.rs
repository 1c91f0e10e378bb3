//! ConnectionManager: client lifecycle (connect, disconnect, reconnect) and the shared instance.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OnceCell};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::helpers::uri::{redact_uri_password, validate_mongodb_uri};

static GLOBAL: OnceCell<Arc<ConnectionManager>> = OnceCell::const_new();

/// Owns the driver client for one connection URI.
///
/// Connection attempts are serialized. Callers that arrive while an attempt is in flight
/// wait for it and share its outcome: its client on success, its driver error on failure.
pub struct ConnectionManager {
    config: ConnectionConfig,
    client: RwLock<Option<Installed>>,
    connect_lock: Mutex<()>,
    connecting: AtomicBool,
    attempts: AtomicU64,
    last_failure: RwLock<Option<mongodb::error::Error>>,
}

/// A connected client tagged with the attempt that produced it.
#[derive(Clone)]
struct Installed {
    client: Client,
    generation: u64,
}

/// Clears the in-flight flag even if the connecting future is dropped.
struct ConnectingFlag<'a>(&'a AtomicBool);

impl<'a> ConnectingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ConnectionManager {
    /// Create an unconnected manager. Fails only on a malformed URI.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        validate_mongodb_uri(&config.uri)?;
        Ok(Self {
            config,
            client: RwLock::new(None),
            connect_lock: Mutex::new(()),
            connecting: AtomicBool::new(false),
            attempts: AtomicU64::new(0),
            last_failure: RwLock::new(None),
        })
    }

    /// Process-wide instance.
    ///
    /// The first call creates and connects it; later calls return the same instance and
    /// ignore `config`. A failed first connect leaves the slot empty so the next call retries.
    pub async fn global(config: ConnectionConfig) -> Result<Arc<Self>> {
        GLOBAL
            .get_or_try_init(|| async move {
                let manager = Arc::new(Self::new(config)?);
                manager.connect().await?;
                Ok::<_, Error>(manager)
            })
            .await
            .cloned()
    }

    /// The process-wide instance, if `global` has completed.
    pub fn global_instance() -> Option<Arc<Self>> {
        GLOBAL.get().cloned()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.read().is_some()
    }

    /// True while a connection attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// Number of finished connection attempts, successful or not.
    /// Retries inside one attempt count once.
    pub fn connect_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn installed(&self) -> Option<Installed> {
        self.client.read().clone()
    }

    /// The connected client, or `Error::NotConnected`.
    pub fn client(&self) -> Result<Client> {
        self.installed().map(|installed| installed.client).ok_or(Error::NotConnected)
    }

    /// Handle to the configured database.
    pub fn database(&self) -> Result<Database> {
        Ok(self.client()?.database(&self.config.database))
    }

    /// Connect, or return the existing client when already connected.
    ///
    /// Makes up to `max_connect_attempts` tries with a fixed `retry_delay_ms` between
    /// them; the last driver error is returned unchanged.
    pub async fn connect(&self) -> Result<Client> {
        self.establish(None).await
    }

    /// Replace the client installed by attempt `stale` (or connect when `stale` is `None`).
    ///
    /// A client from any other attempt is returned as is, so callers holding an outdated
    /// view never tear down a newer client.
    async fn establish(&self, stale: Option<u64>) -> Result<Client> {
        let observed = self.attempts.load(Ordering::SeqCst);
        if let Some(installed) = self.installed()
            && Some(installed.generation) != stale
        {
            return Ok(installed.client);
        }

        let lock = self.connect_lock.lock().await;

        let retired = {
            let mut slot = self.client.write();
            if let Some(installed) = slot.as_ref()
                && Some(installed.generation) != stale
            {
                return Ok(installed.client.clone());
            }
            slot.take()
        };

        // An attempt finished while we waited and left no client: it failed.
        if retired.is_none()
            && self.attempts.load(Ordering::SeqCst) != observed
            && let Some(err) = self.last_failure.read().clone()
        {
            log::debug!("Sharing the failure of the attempt that was in flight");
            return Err(Error::Mongo(err));
        }

        let result = {
            let _flag = ConnectingFlag::raise(&self.connecting);
            self.connect_with_retry().await
        };

        let generation = self.attempts.load(Ordering::SeqCst) + 1;
        match &result {
            Ok(client) => {
                *self.last_failure.write() = None;
                *self.client.write() = Some(Installed { client: client.clone(), generation });
            }
            Err(err) => *self.last_failure.write() = err.as_mongo().cloned(),
        }
        self.attempts.store(generation, Ordering::SeqCst);
        drop(lock);

        if let Some(old) = retired {
            old.client.shutdown().immediate(true).await;
        }
        result
    }

    async fn connect_with_retry(&self) -> Result<Client> {
        let attempts = self.config.max_connect_attempts.max(1);
        let target = redact_uri_password(&self.config.uri);
        let mut attempt = 1;

        loop {
            match open_client(&self.config).await {
                Ok(client) => {
                    log::info!("Connected to {target} (database: {})", self.config.database);
                    return Ok(client);
                }
                Err(err) if attempt < attempts => {
                    log::warn!(
                        "Connection attempt {attempt}/{attempts} to {target} failed: {err}; \
                         retrying in {:?}",
                        self.config.retry_delay()
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(err) => {
                    log::error!("Failed to connect to {target}: {err}");
                    return Err(err.into());
                }
            }
        }
    }

    /// Shut the client down. A no-op when not connected.
    ///
    /// The driver waits for outstanding cursors and sessions during shutdown; other callers
    /// may connect again in the meantime.
    pub async fn disconnect(&self) {
        let installed = {
            let _lock = self.connect_lock.lock().await;
            self.client.write().take()
        };
        let Some(installed) = installed else {
            log::debug!("Disconnect requested but no client is connected");
            return;
        };

        installed.client.shutdown().await;
        log::info!("Disconnected from {}", redact_uri_password(&self.config.uri));
    }

    /// Drop the current client and connect again.
    ///
    /// Concurrent calls replace the client once; later callers get the new client.
    pub async fn reconnect(&self) -> Result<Client> {
        log::info!("Reconnecting to {}", redact_uri_password(&self.config.uri));
        let stale = self.installed().map(|installed| installed.generation);
        self.establish(stale).await
    }

    /// Ping the current client and reconnect if the ping fails or no client exists.
    ///
    /// Only the client that failed the ping is replaced. If another caller has already
    /// swapped in a new one, that client is returned.
    pub async fn ensure_connected(&self) -> Result<Client> {
        let Some(installed) = self.installed() else {
            return self.connect().await;
        };

        match installed.client.database("admin").run_command(doc! { "ping": 1 }).await {
            Ok(_) => Ok(installed.client),
            Err(err) => {
                log::warn!("Health ping failed ({err}), reconnecting");
                self.establish(Some(installed.generation)).await
            }
        }
    }

    /// List collection names in the configured database
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let db = self.database()?;
        let mut collections = db.list_collection_names().await.map_err(|err| {
            log::error!("list_collections on {} failed: {err}", self.config.database);
            Error::from(err)
        })?;
        collections.sort_unstable_by_key(|name| name.to_lowercase());
        Ok(collections)
    }

    /// One-shot connectivity check bounded by `timeout`; nothing is kept afterwards.
    pub async fn test_connection(config: &ConnectionConfig, timeout: Duration) -> Result<()> {
        validate_mongodb_uri(&config.uri)?;

        let fut = async {
            let client = open_client(config).await?;
            client.shutdown().await;
            Ok::<(), mongodb::error::Error>(())
        };

        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Timeout("Connection timed out".to_string())),
        }
    }
}

/// Create a client from the config without contacting the server.
async fn build_client(config: &ConnectionConfig) -> mongodb::error::Result<Client> {
    let mut options = ClientOptions::parse(config.uri.as_str()).await?;
    options.connect_timeout = Some(config.connect_timeout());
    options.server_selection_timeout = Some(config.server_selection_timeout());
    if let Some(app_name) = &config.app_name {
        options.app_name = Some(app_name.clone());
    }
    Client::with_options(options)
}

/// Create a client from the config and verify it with a ping.
async fn open_client(config: &ConnectionConfig) -> mongodb::error::Result<Client> {
    let client = build_client(config).await?;
    client.database("admin").run_command(doc! { "ping": 1 }).await?;
    Ok(client)
}
