//! Shared MongoDB container for integration tests, via Testcontainers.
//!
//! One MongoDB 7.0 container serves each test binary (every `tests/*.rs` file is its own
//! binary). Tests stay isolated by suffixing database names with a short UUID.
//!
//! The container lives on a dedicated thread with its own tokio runtime so it survives the
//! per-test `#[tokio::test]` runtimes, and an `atexit` hook removes it when the process ends.

#![allow(dead_code)]

pub mod fixtures;
pub mod forwarder;

use std::sync::{Arc, OnceLock};

use mongo_facade::{ConnectionConfig, ConnectionManager, Model, Store};
use mongodb::Client;
use mongodb::bson::Document;
use mongodb::options::ClientOptions;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;

static CONNECTION_STRING: OnceLock<String> = OnceLock::new();

/// Docker container ID, kept for the `atexit` cleanup hook.
static CONTAINER_ID: OnceLock<String> = OnceLock::new();

unsafe extern "C" {
    fn atexit(f: extern "C" fn()) -> i32;
}

extern "C" fn remove_container() {
    if let Some(id) = CONTAINER_ID.get() {
        let _ = std::process::Command::new("docker")
            .args(["rm", "-f", id])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
    }
}

/// Start the container once per test binary and return its connection string.
fn shared_connection_string() -> &'static str {
    CONNECTION_STRING.get_or_init(|| {
        let (tx, rx) = std::sync::mpsc::sync_channel(1);

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create container runtime");

            rt.block_on(async {
                let container = Mongo::default()
                    .with_tag("7.0")
                    .start()
                    .await
                    .expect("Failed to start MongoDB container");

                let _ = CONTAINER_ID.set(container.id().to_string());
                unsafe {
                    atexit(remove_container);
                }

                let host = container.get_host().await.expect("Failed to get host");
                let port = container.get_host_port_ipv4(27017).await.expect("Failed to get port");
                let connection_string = format!("mongodb://{host}:{port}");

                // Wait until the server answers
                let opts = ClientOptions::parse(&connection_string).await.expect("Failed to parse");
                let ready = Client::with_options(opts).expect("Failed to create readiness client");
                for _ in 0..30 {
                    if ready.list_database_names().await.is_ok() {
                        break;
                    }
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
                drop(ready);

                tx.send(connection_string).expect("Failed to send connection string");

                // Keep the container alive until the process exits.
                std::future::pending::<()>().await;
            });
        });

        rx.recv().expect("Failed to receive connection string")
    })
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Per-test handle on the shared container.
///
/// `config()` points at a database unique to this handle, so stores built from it never
/// see another test's documents.
pub struct MongoTestContainer {
    pub connection_string: String,
    pub database: String,
}

impl MongoTestContainer {
    pub async fn start() -> Self {
        init_logger();
        let connection_string = shared_connection_string().to_string();
        let test_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        Self { connection_string, database: format!("facade_{test_id}") }
    }

    /// "host:port" of the container, for forwarding.
    pub fn address(&self) -> String {
        self.connection_string.trim_start_matches("mongodb://").to_string()
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.connection_string.clone()).with_database(self.database.clone())
    }

    /// A connected manager for this test's database.
    pub async fn manager(&self) -> Arc<ConnectionManager> {
        let manager = Arc::new(ConnectionManager::new(self.config()).expect("valid test config"));
        manager.connect().await.expect("Failed to connect to test container");
        manager
    }

    /// A connected store with `collection` as its default model.
    pub async fn store<T>(&self, collection: &str) -> Store<T> {
        Store::with_model(self.manager().await, Model::new(collection))
    }

    /// Direct driver handle for assertions that bypass the facade.
    pub async fn driver_collection(&self, collection: &str) -> mongodb::Collection<Document> {
        let client = Client::with_uri_str(&self.connection_string).await.expect("driver client");
        client.database(&self.database).collection(collection)
    }
}
