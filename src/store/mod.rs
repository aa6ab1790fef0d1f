use serde_json::Value;
use tracing::debug;

use crate::converter::{ConvertResult, Document, FindRequest, Operation, QueryConverter};

/// The driver side: runs compiled operations against a live document store.
pub trait DocumentStore {
    fn find(&self, request: &FindRequest) -> ConvertResult<Vec<Document>>;
    fn aggregate(&self, collection: &str, pipeline: &[Document], options: &Document) -> ConvertResult<Vec<Document>>;
    fn count(&self, collection: &str, filter: &Document) -> ConvertResult<u64>;
    fn distinct(&self, collection: &str, field: &str, filter: &Document) -> ConvertResult<Vec<Value>>;
    fn delete_many(&self, collection: &str, filter: &Document) -> ConvertResult<u64>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Documents(Vec<Document>),
    Values(Vec<Value>),
    Count(u64),
    Deleted(u64),
}

impl QueryConverter {
    /// Hands the compiled operation to `store`; results are passed through untouched.
    pub fn run(&self, store: &dyn DocumentStore) -> ConvertResult<QueryResult> {
        let operation = self.operation();
        debug!(operation = operation.name(), collection = operation.collection(), "running operation");

        match operation {
            Operation::Find(request) => store.find(request).map(QueryResult::Documents),
            Operation::Count { collection, filter } => store.count(collection, filter).map(QueryResult::Count),
            Operation::Distinct { collection, field, filter } => {
                store.distinct(collection, field, filter).map(QueryResult::Values)
            }
            Operation::Aggregate { collection, pipeline, options } => {
                store.aggregate(collection, pipeline, options).map(QueryResult::Documents)
            }
            Operation::Delete { collection, filter } => store.delete_many(collection, filter).map(QueryResult::Deleted),
        }
    }
}
