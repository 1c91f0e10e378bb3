//! Facade operations split into focused modules.

pub mod aggregation;
pub mod documents;
pub mod raw;

use mongodb::bson::{Bson, Document, doc};

use crate::error::{Error, Result};

/// Log a failed driver call and hand the error back unchanged.
pub(crate) fn logged<T>(op: &str, namespace: &str, result: mongodb::error::Result<T>) -> Result<T> {
    result.map_err(|err| {
        log::error!("{op} on {namespace} failed: {err}");
        Error::from(err)
    })
}

/// Move plain fields under `$set`, next to any update operators already present.
///
/// Documents without plain fields are returned unchanged, as is a document whose `$set`
/// is not itself a document (the server rejects it either way).
pub(crate) fn into_update(update: Document) -> Document {
    if update.keys().all(|key| key.starts_with('$')) {
        return update;
    }
    if update.get("$set").is_some_and(|set| !matches!(set, Bson::Document(_))) {
        return update;
    }

    let mut operators = Document::new();
    let mut fields = Document::new();
    for (key, value) in update {
        if key.starts_with('$') {
            operators.insert(key, value);
        } else {
            fields.insert(key, value);
        }
    }

    match operators.get_document_mut("$set") {
        Ok(set) => {
            for (key, value) in fields {
                set.insert(key, value);
            }
        }
        Err(_) => {
            operators.insert("$set", fields);
        }
    }
    operators
}

/// Update for an upsert by `_id`. An empty document only makes sure the `_id` exists.
pub(crate) fn upsert_update(id: &Bson, update: Document) -> Document {
    if update.is_empty() {
        doc! { "$setOnInsert": { "_id": id.clone() } }
    } else {
        into_update(update)
    }
}
