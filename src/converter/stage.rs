use serde_json::Value;

use crate::converter::{document::{document, field_reference}, Document};

/// One aggregation pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(Document),
    Lookup(Document),
    Unwind { path: String, preserve_null_and_empty: bool },
    Sort(Document),
    Group(Document),
    Skip(i64),
    Limit(i64),
    Project(Document),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::Lookup(_) => "$lookup",
            Stage::Unwind { .. } => "$unwind",
            Stage::Sort(_) => "$sort",
            Stage::Group(_) => "$group",
            Stage::Skip(_) => "$skip",
            Stage::Limit(_) => "$limit",
            Stage::Project(_) => "$project",
        }
    }

    pub fn to_document(&self) -> Document {
        let body = match self {
            Stage::Match(doc) | Stage::Lookup(doc) | Stage::Sort(doc) | Stage::Group(doc) | Stage::Project(doc) => {
                Value::Object(doc.clone())
            }
            Stage::Unwind { path, preserve_null_and_empty } => {
                let mut unwind = document("path", field_reference(path));
                unwind.insert("preserveNullAndEmptyArrays".into(), Value::Bool(*preserve_null_and_empty));
                Value::Object(unwind)
            }
            Stage::Skip(count) | Stage::Limit(count) => Value::from(*count),
        };
        document(self.name(), body)
    }
}
