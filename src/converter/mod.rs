pub mod error;
pub use error::*;

pub mod config;
pub use config::*;

pub mod document;
pub use document::Document;

pub mod coercion;
pub mod functions;
pub mod translator;
pub mod alias;
pub mod statement_model;
pub mod stage;
pub use stage::Stage;

pub mod join;
pub mod aggregation;
pub mod sort;
pub mod having;

pub mod compiled_query;
pub use compiled_query::CompiledQuery;

pub mod pipeline;
pub use pipeline::PipelineAssembler;

pub mod operation;
pub use operation::{FindRequest, Operation};

pub mod query_converter;
pub use query_converter::QueryConverter;
