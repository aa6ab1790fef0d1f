pub mod parser;

pub mod converter;
pub use converter::{
    ConvertError, ConvertResult, ConverterConfig, FieldType, Operation, QueryConverter,
};

pub mod store;
pub use store::{DocumentStore, QueryResult};
