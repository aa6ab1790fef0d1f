use serde_json::Value;
use tracing::debug;

use crate::{
    converter::{
        aggregation::AggregationCompiler,
        compiled_query::CompiledQuery,
        having::HavingCompiler,
        join::{join_alias, split_where, JoinPipelineBuilder, WhereSplit},
        operation::{FindRequest, Operation},
        pipeline::PipelineAssembler,
        sort::SortCompiler,
        statement_model::{ModelSource, StatementModel},
        translator::ExpressionTranslator,
        ConvertError, ConvertResult, ConverterConfig, Document,
    },
    parser::ast::{Command, Statement},
};

/// Compiles one SQL statement into the operation a document store runs.
#[derive(Debug, Clone)]
pub struct QueryConverter {
    config: ConverterConfig,
    statement: Statement,
    compiled: CompiledQuery,
    operation: Operation,
}

impl QueryConverter {
    pub fn new(sql: &str, config: ConverterConfig) -> ConvertResult<Self> {
        config.validate()?;
        let statement = Statement::try_from(sql)?;
        Self::from_statement(statement, config)
    }

    pub fn from_statement(statement: Statement, config: ConverterConfig) -> ConvertResult<Self> {
        config.validate()?;
        let compiled = Self::compile_statement(&statement, &config)?;
        let operation = Self::select_operation(&compiled, &config);
        debug!(operation = operation.name(), collection = operation.collection(), "statement compiled");

        Ok(Self { config, statement, compiled, operation })
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn compiled(&self) -> &CompiledQuery {
        &self.compiled
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Compiles a statement; a nested source is compiled first and becomes the prior stages.
    pub fn compile_statement(statement: &Statement, config: &ConverterConfig) -> ConvertResult<CompiledQuery> {
        let model = StatementModel::from_statement(statement)?;

        let (collection, prior_stages) = match &model.source {
            ModelSource::Table(name) => (name.clone(), vec![]),
            ModelSource::Nested(inner) => {
                if inner.command == Command::Delete {
                    return ConvertError::unsupported("DELETE cannot be used as a source").err();
                }
                let inner = Self::compile_statement(inner, config)?;
                let stages = PipelineAssembler::assemble(&inner);
                (inner.collection, stages)
            }
        };

        let translator = ExpressionTranslator::new(config);

        let join_aliases = model.joins.iter().map(join_alias).collect::<ConvertResult<Vec<_>>>()?;
        let split = match (&model.where_expr, join_aliases.is_empty()) {
            (Some(expr), false) => split_where(expr, &join_aliases),
            (where_expr, _) => WhereSplit { pushed: where_expr.clone(), residual: None },
        };

        let filter = match &split.pushed {
            Some(expr) => translator.translate_filter(expr)?,
            None => Document::new(),
        };
        let join_stages = JoinPipelineBuilder::new(&translator).build(&model.joins, split.residual.as_ref())?;

        let mut query = CompiledQuery {
            collection,
            command: model.command,
            filter,
            join_stages,
            limit: model.limit,
            offset: model.offset,
            grouping: model.has_grouping(),
            count_all: model.is_count_all,
            pipeline_required: PipelineAssembler::requires_pipeline(&model, &prior_stages),
            prior_stages,
            ..Default::default()
        };

        if query.grouping {
            let grouping = AggregationCompiler::compile(&model)?;
            let plan = SortCompiler::new(&model, Some(&grouping)).compile()?;

            query.projection = grouping.group_document(&plan.first_accumulators);
            query.sort = plan.sort;
            query.pre_group_sort = plan.pre_group_sort;
            if let Some(having) = &model.having_expr {
                query.having = HavingCompiler::new(&model, &grouping, &translator).compile(having)?;
            }
            query.alias_projection = grouping.alias_projection;
        } else {
            if let Some(having) = &model.having_expr {
                return ConvertError::validation(format!("HAVING requires GROUP BY or aggregate functions: {}", having)).err();
            }
            query.sort = SortCompiler::new(&model, None).compile()?.sort;
            query.projection = Self::plain_projection(&model);
        }

        query.distinct_field = Self::distinct_field(&model, &query);

        debug!(
            collection = %query.collection,
            grouping = query.grouping,
            pipeline = query.pipeline_required,
            "query compiled"
        );
        Ok(query)
    }

    fn plain_projection(model: &StatementModel) -> Document {
        if model.command == Command::Delete || model.is_wildcard() {
            return Document::new();
        }

        let mut projection = Document::new();
        let mut id_selected = false;
        for (path, alias) in model.select_columns() {
            id_selected |= path == "_id";
            match alias {
                Some(alias) => projection.insert(alias.to_string(), Value::String(format!("${}", path))),
                None => projection.insert(path, Value::from(1)),
            };
        }
        if !id_selected {
            projection.insert("_id".into(), Value::from(0));
        }
        projection
    }

    /// Field for a store-side distinct, when nothing else needs a pipeline.
    fn distinct_field(model: &StatementModel, query: &CompiledQuery) -> Option<String> {
        let plain = model.distinct
            && !model.explicit_group_by
            && model.select_items.len() == 1
            && model.joins.is_empty()
            && query.prior_stages.is_empty()
            && model.alias_table.is_empty()
            && model.order_by.is_empty()
            && model.limit.is_none()
            && model.offset.is_none();
        if !plain {
            return None;
        }
        model.select_columns().into_iter().next().map(|(path, _)| path)
    }

    fn select_operation(query: &CompiledQuery, config: &ConverterConfig) -> Operation {
        let collection = query.collection.clone();

        if query.command == Command::Delete {
            return Operation::Delete { collection, filter: query.filter.clone() };
        }
        if let Some(field) = &query.distinct_field {
            return Operation::Distinct { collection, field: field.clone(), filter: query.filter.clone() };
        }
        if query.pipeline_required {
            return Operation::Aggregate {
                collection,
                pipeline: PipelineAssembler::assemble(query),
                options: config.aggregation_options(),
            };
        }
        if query.count_all {
            return Operation::Count { collection, filter: query.filter.clone() };
        }

        Operation::Find(FindRequest {
            collection,
            filter: query.filter.clone(),
            projection: query.projection.clone(),
            sort: query.sort.clone(),
            skip: query.offset,
            limit: query.limit,
        })
    }
}
