//! Raw collection access: untyped queries and pipelines against any collection by name.

use futures::TryStreamExt;
use futures::future::{AbortRegistration, Abortable};
use mongodb::Collection;
use mongodb::bson::{Document, doc};

use crate::connection::Store;
use crate::connection::ops::logged;
use crate::connection::types::{AggregatePipelineError, QueryOptions};
use crate::error::Result;

impl<T> Store<T> {
    /// Untyped handle to `name` in the configured database.
    pub fn raw_collection(&self, name: &str) -> Result<Collection<Document>> {
        Ok(self.manager().database()?.collection::<Document>(name))
    }

    fn raw_namespace(&self, name: &str) -> String {
        format!("{}.{}", self.manager().config().database, name)
    }

    /// Find on any collection, bypassing the default model.
    pub async fn raw_find(
        &self,
        collection: &str,
        filter: Document,
        opts: QueryOptions,
    ) -> Result<Vec<Document>> {
        let coll = self.raw_collection(collection)?;
        let namespace = self.raw_namespace(collection);
        log::debug!("raw_find in {namespace}: {filter}");

        let result = async {
            let cursor = coll.find(filter).with_options(opts.into_find_options()).await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        logged("raw_find", &namespace, result.await)
    }

    /// Aggregate on any collection, bypassing the default model.
    pub async fn raw_aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>> {
        let coll = self.raw_collection(collection)?;
        let namespace = self.raw_namespace(collection);
        log::debug!("raw_aggregate on {namespace}: {} stages", pipeline.len());

        let result = async {
            let cursor = coll.aggregate(pipeline).await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        logged("raw_aggregate", &namespace, result.await)
    }

    /// Aggregate on any collection with abort support.
    ///
    /// With `append_limit`, a positive `limit` is added as a final `$limit` stage.
    pub async fn raw_aggregate_abortable(
        &self,
        collection: &str,
        mut pipeline: Vec<Document>,
        limit: Option<i64>,
        append_limit: bool,
        abort_registration: AbortRegistration,
    ) -> std::result::Result<Vec<Document>, AggregatePipelineError> {
        if append_limit
            && let Some(limit) = limit
            && limit > 0
        {
            pipeline.push(doc! { "$limit": limit });
        }

        let coll = self.raw_collection(collection)?;
        let namespace = self.raw_namespace(collection);

        let fut = async move {
            let cursor = coll.aggregate(pipeline).await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        match Abortable::new(fut, abort_registration).await {
            Ok(result) => Ok(logged("raw_aggregate_abortable", &namespace, result)?),
            Err(_aborted) => {
                log::debug!("raw_aggregate_abortable on {namespace} aborted");
                Err(AggregatePipelineError::Aborted)
            }
        }
    }

    /// Run a database command against the configured database.
    pub async fn run_command(&self, command: Document) -> Result<Document> {
        let db = self.manager().database()?;
        let database = self.manager().config().database.clone();
        log::debug!("run_command on {database}: {command}");

        logged("run_command", &database, db.run_command(command).await)
    }
}
