use serde::Serialize;

use crate::converter::Document;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindRequest {
    pub collection: String,
    pub filter: Document,
    pub projection: Document,
    pub sort: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// What the driver is asked to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Operation {
    Find(FindRequest),
    Count { collection: String, filter: Document },
    Distinct { collection: String, field: String, filter: Document },
    Aggregate { collection: String, pipeline: Vec<Document>, options: Document },
    Delete { collection: String, filter: Document },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Find(_) => "find",
            Operation::Count { .. } => "count",
            Operation::Distinct { .. } => "distinct",
            Operation::Aggregate { .. } => "aggregate",
            Operation::Delete { .. } => "delete",
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Operation::Find(request) => &request.collection,
            Operation::Count { collection, .. }
            | Operation::Distinct { collection, .. }
            | Operation::Aggregate { collection, .. }
            | Operation::Delete { collection, .. } => collection,
        }
    }
}
