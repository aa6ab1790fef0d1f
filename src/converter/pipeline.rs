use tracing::debug;

use crate::converter::{compiled_query::CompiledQuery, stage::Stage, statement_model::StatementModel, Document};

/// Orders the compiled fragments into one aggregation pipeline.
pub struct PipelineAssembler;

impl PipelineAssembler {
    pub fn stages(query: &CompiledQuery) -> Vec<Stage> {
        let mut stages = vec![];

        if !query.filter.is_empty() {
            stages.push(Stage::Match(query.filter.clone()));
        }
        stages.extend(query.join_stages.iter().cloned());

        if query.grouping {
            if !query.pre_group_sort.is_empty() {
                stages.push(Stage::Sort(query.pre_group_sort.clone()));
            }
            stages.push(Stage::Group(query.projection.clone()));
            if !query.having.is_empty() {
                stages.push(Stage::Match(query.having.clone()));
            }
        }

        if !query.sort.is_empty() {
            stages.push(Stage::Sort(query.sort.clone()));
        }
        if let Some(offset) = query.offset {
            stages.push(Stage::Skip(offset));
        }
        if let Some(limit) = query.limit {
            stages.push(Stage::Limit(limit));
        }

        match query.grouping {
            true if !query.alias_projection.is_empty() => stages.push(Stage::Project(query.alias_projection.clone())),
            false if !query.projection.is_empty() => stages.push(Stage::Project(query.projection.clone())),
            _ => {}
        }

        stages
    }

    pub fn assemble(query: &CompiledQuery) -> Vec<Document> {
        let mut pipeline = query.prior_stages.clone();
        pipeline.extend(Self::stages(query).iter().map(Stage::to_document));

        debug!(collection = %query.collection, stages = pipeline.len(), "pipeline assembled");
        pipeline
    }

    /// True when the statement cannot run as a plain find, count or delete.
    pub fn requires_pipeline(model: &StatementModel, prior_stages: &[Document]) -> bool {
        !model.alias_table.is_empty()
            || !model.group_keys.is_empty()
            || !model.joins.is_empty()
            || !prior_stages.is_empty()
            || model.having_expr.is_some()
            || (model.is_total_group && !model.is_count_all)
    }
}
