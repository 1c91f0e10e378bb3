//! Aggregation pipelines on a store's default model.

use futures::TryStreamExt;
use mongodb::bson::Document;

use crate::connection::Store;
use crate::connection::ops::logged;
use crate::error::Result;

impl<T> Store<T>
where
    T: Send + Sync,
{
    /// Run `pipeline` against the default model's collection.
    ///
    /// Stages may reshape documents, so results come back untyped.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let coll = self.collection()?;
        let namespace = self.namespace();
        log::debug!("aggregate on {namespace}: {} stages", pipeline.len());

        let result = async {
            let cursor = coll.aggregate(pipeline).await?;
            cursor.try_collect::<Vec<Document>>().await
        };
        logged("aggregate", &namespace, result.await)
    }
}
