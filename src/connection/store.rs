//! Store: the facade handed to callers.

use std::sync::Arc;

use mongodb::bson::Document;
use mongodb::{Client, Collection};

use crate::config::ConnectionConfig;
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::models::Model;

/// Simplified operations over a shared `ConnectionManager`.
///
/// A store optionally carries a default `Model<T>`; CRUD and aggregation calls act on that
/// model's collection and fail with `Error::NoModel` without one. Raw collection calls work
/// on any store.
pub struct Store<T = Document> {
    manager: Arc<ConnectionManager>,
    model: Option<Model<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { manager: self.manager.clone(), model: self.model.clone() }
    }
}

impl Store<Document> {
    /// Store without a default model
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager, model: None }
    }

    /// Store over the process-wide `ConnectionManager` (connected on first use).
    pub async fn global(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::new(ConnectionManager::global(config).await?))
    }
}

impl<T> Store<T> {
    pub fn with_model(manager: Arc<ConnectionManager>, model: Model<T>) -> Self {
        Self { manager, model: Some(model) }
    }

    /// A store sharing this connection with a different default model.
    pub fn for_model<U>(&self, model: Model<U>) -> Store<U> {
        Store::with_model(self.manager.clone(), model)
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn default_model(&self) -> Option<&Model<T>> {
        self.model.as_ref()
    }

    pub async fn connect(&self) -> Result<Client> {
        self.manager.connect().await
    }

    pub async fn disconnect(&self) {
        self.manager.disconnect().await
    }

    pub async fn reconnect(&self) -> Result<Client> {
        self.manager.reconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// "database.collection" of the default model, used in log lines.
    pub(crate) fn namespace(&self) -> String {
        match &self.model {
            Some(model) => model.namespace(&self.manager.config().database),
            None => format!("{}.<no model>", self.manager.config().database),
        }
    }

    /// Driver collection bound to the default model.
    pub fn collection(&self) -> Result<Collection<T>>
    where
        T: Send + Sync,
    {
        let model = self.model.as_ref().ok_or(Error::NoModel)?;
        let client = self.manager.client()?;
        let database = model.database_name().unwrap_or(&self.manager.config().database);
        Ok(client.database(database).collection::<T>(model.collection_name()))
    }
}
