//! Document CRUD on a store's default model.

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{FindOneAndUpdateOptions, FindOneOptions, ReturnDocument};
use mongodb::results::UpdateResult;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::connection::Store;
use crate::connection::ops::{into_update, logged, upsert_update};
use crate::connection::types::QueryOptions;
use crate::error::Result;

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    /// Insert one document, returning its `_id`.
    pub async fn insert(&self, document: &T) -> Result<Bson> {
        let coll = self.collection()?;
        let namespace = self.namespace();
        log::debug!("insert into {namespace}");

        let result = logged("insert", &namespace, coll.insert_one(document).await)?;
        Ok(result.inserted_id)
    }

    /// Insert documents one at a time, in order.
    ///
    /// Stops at the first failure and returns that error; documents inserted before it stay.
    pub async fn insert_batch<I>(&self, documents: I) -> Result<Vec<Bson>>
    where
        I: IntoIterator<Item = T>,
    {
        let coll = self.collection()?;
        let namespace = self.namespace();
        let mut ids = Vec::new();

        for document in documents {
            let result = coll.insert_one(&document).await;
            let inserted = logged("insert_batch", &namespace, result).inspect_err(|_| {
                log::warn!("insert_batch on {namespace} stopped after {} inserts", ids.len());
            })?;
            ids.push(inserted.inserted_id);
        }

        log::debug!("insert_batch into {namespace}: {} documents", ids.len());
        Ok(ids)
    }

    /// Update the document with this `_id`, inserting it if absent.
    ///
    /// Returns the document as it is after the update. Plain fields are applied as `$set`
    /// alongside any operators; an empty update inserts a bare `{ _id }` when absent and
    /// leaves an existing document untouched.
    pub async fn upsert_by_id(&self, id: impl Into<Bson>, update: Document) -> Result<Option<T>> {
        let coll = self.collection()?;
        let namespace = self.namespace();
        let id = id.into();
        log::debug!("upsert_by_id {id} in {namespace}");

        let mut options = FindOneAndUpdateOptions::default();
        options.upsert = Some(true);
        options.return_document = Some(ReturnDocument::After);

        let result = coll
            .find_one_and_update(doc! { "_id": id.clone() }, upsert_update(&id, update))
            .with_options(options);
        logged("upsert_by_id", &namespace, result.await)
    }

    /// `_id` of the first document matching `filter`, or `None`.
    pub async fn exists(&self, filter: Document) -> Result<Option<Bson>> {
        let coll = self.collection()?.clone_with_type::<Document>();
        let namespace = self.namespace();
        log::debug!("exists in {namespace}: {filter}");

        let mut options = FindOneOptions::default();
        options.projection = Some(doc! { "_id": 1 });

        let found = coll.find_one(filter).with_options(options).await;
        let found = logged("exists", &namespace, found)?;
        Ok(found.and_then(|document| document.get("_id").cloned()))
    }

    /// Delete every document matching `filter`, returning the count.
    pub async fn delete(&self, filter: Document) -> Result<u64> {
        let coll = self.collection()?;
        let namespace = self.namespace();
        log::debug!("delete from {namespace}: {filter}");

        let result = logged("delete", &namespace, coll.delete_many(filter).await)?;
        Ok(result.deleted_count)
    }

    /// Delete the document with this `_id`; true when one was removed.
    pub async fn delete_by_id(&self, id: impl Into<Bson>) -> Result<bool> {
        let coll = self.collection()?;
        let namespace = self.namespace();

        let result = coll.delete_one(doc! { "_id": id.into() }).await;
        let result = logged("delete_by_id", &namespace, result)?;
        Ok(result.deleted_count > 0)
    }

    /// All documents matching `filter`, with sort/projection/skip/limit applied by the driver.
    pub async fn find(&self, filter: Document, opts: QueryOptions) -> Result<Vec<T>> {
        let coll = self.collection()?;
        let namespace = self.namespace();
        log::debug!("find in {namespace}: {filter}");

        let result = async {
            let cursor = coll.find(filter).with_options(opts.into_find_options()).await?;
            cursor.try_collect::<Vec<T>>().await
        };
        logged("find", &namespace, result.await)
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        let coll = self.collection()?;
        let namespace = self.namespace();

        logged("find_one", &namespace, coll.find_one(filter).await)
    }

    pub async fn find_by_id(&self, id: impl Into<Bson>) -> Result<Option<T>> {
        self.find_one(doc! { "_id": id.into() }).await
    }

    pub async fn count(&self, filter: Document) -> Result<u64> {
        let coll = self.collection()?;
        let namespace = self.namespace();

        logged("count", &namespace, coll.count_documents(filter).await)
    }

    /// Update every document matching `filter`. A plain field document is applied as `$set`.
    pub async fn update_many(&self, filter: Document, update: Document) -> Result<UpdateResult> {
        let coll = self.collection()?;
        let namespace = self.namespace();
        log::debug!("update_many in {namespace}: {filter}");

        logged("update_many", &namespace, coll.update_many(filter, into_update(update)).await)
    }
}
