use serde_json::{Map, Value};

/// A store document. Key order is preserved.
pub type Document = Map<String, Value>;

pub fn document(key: impl Into<String>, value: impl Into<Value>) -> Document {
    let mut doc = Document::new();
    doc.insert(key.into(), value.into());
    doc
}

pub fn object(key: impl Into<String>, value: impl Into<Value>) -> Value {
    Value::Object(document(key, value))
}

/// `$path`, the aggregation reference to a field.
pub fn field_reference(path: &str) -> String {
    match path.starts_with('$') {
        true => path.to_string(),
        false => format!("${}", path),
    }
}

/// Key usable inside `$group` `_id` sub documents and accumulators.
pub fn safe_key(path: &str) -> String {
    path.replace('.', "_")
}
