use mongodb::bson::Document;
use mongodb::options::FindOptions;

/// Error type for abortable aggregation pipelines
#[derive(Debug)]
pub enum AggregatePipelineError {
    Mongo(crate::error::Error),
    Aborted,
}

impl From<crate::error::Error> for AggregatePipelineError {
    fn from(value: crate::error::Error) -> Self {
        Self::Mongo(value)
    }
}

impl From<mongodb::error::Error> for AggregatePipelineError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Mongo(value.into())
    }
}

impl std::fmt::Display for AggregatePipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregatePipelineError::Mongo(err) => err.fmt(f),
            AggregatePipelineError::Aborted => f.write_str("Aggregation aborted"),
        }
    }
}

impl std::error::Error for AggregatePipelineError {}

/// Options forwarded to the driver's `find`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOptions {
    pub sort: Option<Document>,
    pub projection: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

impl QueryOptions {
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn into_find_options(self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = self.sort;
        options.projection = self.projection;
        options.skip = self.skip;
        options.limit = self.limit;
        options
    }
}
