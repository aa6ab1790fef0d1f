use crate::{
    converter::{stage::Stage, Document},
    parser::ast::Command,
};

/// Everything compiled out of one statement, before it is shaped into an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub collection: String,
    pub command: Command,
    /// Plain read/delete filter, or the `$match` ahead of the joins.
    pub filter: Document,
    /// Field projection of a plain read, or the `$group` body when grouping.
    pub projection: Document,
    pub alias_projection: Document,
    pub sort: Document,
    pub pre_group_sort: Document,
    pub having: Document,
    pub join_stages: Vec<Stage>,
    pub prior_stages: Vec<Document>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub grouping: bool,
    pub count_all: bool,
    pub distinct_field: Option<String>,
    pub pipeline_required: bool,
}
