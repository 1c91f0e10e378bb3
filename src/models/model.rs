// Typed collection bindings

use std::fmt;
use std::marker::PhantomData;

use mongodb::bson::Document;

/// Binds a Rust document type to a collection.
///
/// A `Model<T>` is the default schema a `Store` works against: every CRUD call on the store
/// reads and writes `T` in this collection. `database` overrides the connection's default
/// database when set.
pub struct Model<T = Document> {
    collection: String,
    database: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Model<T> {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), database: None, _marker: PhantomData }
    }

    pub fn in_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// "database.collection", falling back to `default_db` when no override is set.
    pub fn namespace(&self, default_db: &str) -> String {
        format!("{}.{}", self.database.as_deref().unwrap_or(default_db), self.collection)
    }
}

// Manual impls: `T` is only a marker and need not be Clone/Debug.
impl<T> Clone for Model<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            database: self.database.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("collection", &self.collection)
            .field("database", &self.database)
            .finish()
    }
}

impl<T> PartialEq for Model<T> {
    fn eq(&self, other: &Self) -> bool {
        self.collection == other.collection && self.database == other.database
    }
}
