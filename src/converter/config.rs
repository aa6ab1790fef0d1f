use std::io::Read;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::converter::{ConvertError, ConvertResult, Document};

/// Declared type of a document field, used to coerce SQL literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConverterConfig {
    pub field_types: IndexMap<String, FieldType>,
    pub default_field_type: FieldType,
    pub aggregation_allow_disk_use: Option<bool>,
    pub aggregation_batch_size: Option<u32>,
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(field_types: IndexMap<String, FieldType>, default_field_type: FieldType) -> Self {
        Self {
            field_types,
            default_field_type,
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> ConvertResult<Self> {
        serde_json::from_str(text).map_err(|err| ConvertError::Config(err.to_string()))
    }

    pub fn from_reader(reader: impl Read) -> ConvertResult<Self> {
        serde_json::from_reader(reader).map_err(|err| ConvertError::Config(err.to_string()))
    }

    pub fn with_field_type(mut self, field: &str, field_type: FieldType) -> Self {
        self.field_types.insert(field.to_string(), field_type);
        self
    }

    pub fn with_default_field_type(mut self, field_type: FieldType) -> Self {
        self.default_field_type = field_type;
        self
    }

    pub fn with_allow_disk_use(mut self, allow_disk_use: bool) -> Self {
        self.aggregation_allow_disk_use = Some(allow_disk_use);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.aggregation_batch_size = Some(batch_size);
        self
    }

    pub fn validate(&self) -> ConvertResult<()> {
        if self.aggregation_batch_size == Some(0) {
            return Err(ConvertError::Config("aggregation batch size must be greater than 0".into()));
        }

        if let Some(field) = self.field_types.keys().find(|field| field.trim().is_empty()) {
            return Err(ConvertError::Config(format!("invalid field path in type mapping: '{}'", field)));
        }

        Ok(())
    }

    /// Declared type of `field`, falling back to the default type.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.field_types.get(field).copied().unwrap_or(self.default_field_type)
    }

    /// Options sent alongside an aggregation pipeline.
    pub fn aggregation_options(&self) -> Document {
        let mut options = Document::new();
        if let Some(allow_disk_use) = self.aggregation_allow_disk_use {
            options.insert("allowDiskUse".into(), Value::Bool(allow_disk_use));
        }
        if let Some(batch_size) = self.aggregation_batch_size {
            let mut cursor = Document::new();
            cursor.insert("batchSize".into(), Value::from(batch_size));
            options.insert("cursor".into(), Value::Object(cursor));
        }
        options
    }
}
