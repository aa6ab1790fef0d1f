use std::cell::RefCell;

use crate::{
    converter::{
        aggregation::{accumulator_name, Grouping},
        alias::AliasTarget,
        statement_model::StatementModel,
        translator::ExpressionTranslator,
        ConvertError, ConvertResult, Document,
    },
    parser::ast::{Column, Expr},
};

const AGGREGATES: [&str; 5] = ["count", "sum", "min", "max", "avg"];

/// Compiles HAVING against the fields produced by `$group`.
pub struct HavingCompiler<'a> {
    model: &'a StatementModel,
    grouping: &'a Grouping,
    translator: &'a ExpressionTranslator<'a>,
}

impl<'a> HavingCompiler<'a> {
    pub fn new(model: &'a StatementModel, grouping: &'a Grouping, translator: &'a ExpressionTranslator<'a>) -> Self {
        Self { model, grouping, translator }
    }

    pub fn compile(&self, having: &Expr) -> ConvertResult<Document> {
        let resolved = self.resolve(having)?;
        self.translator.translate_filter(&resolved)
    }

    /// Aggregates become their accumulator fields, grouped columns their `_id` location.
    pub fn resolve(&self, having: &Expr) -> ConvertResult<Expr> {
        let alias_table = &self.model.alias_table;
        let missing = RefCell::new(vec![]);
        let unknown = RefCell::new(vec![]);

        let resolved = having.transform(&|expr: &Expr| match expr {
            Expr::Function(function) if AGGREGATES.contains(&function.lower_name().as_str()) => {
                let name = accumulator_name(function, alias_table.alias_for_aggregate(&function.to_string()));
                if !self.grouping.accumulators.contains_key(&name) {
                    missing.borrow_mut().push(function.to_string());
                }
                Some(Expr::Column(Column::from_path(&name)))
            }
            Expr::Column(column) => {
                let path = column.path();
                if let Some(AliasTarget::Aggregate(_)) = alias_table.resolve(&path) {
                    return None;
                }
                if self.grouping.accumulators.contains_key(&path) {
                    return None;
                }
                let field = alias_table.field_from_alias_or_field(&path);
                match self.grouping.id_reference(&field) {
                    Some(reference) => Some(Expr::Column(Column::from_path(&reference))),
                    None => {
                        unknown.borrow_mut().push(path);
                        None
                    }
                }
            }
            _ => None,
        });

        if let Some(function) = missing.into_inner().first() {
            return ConvertError::validation(format!("HAVING aggregate {} must also be selected", function)).err();
        }
        if let Some(path) = unknown.into_inner().first() {
            return ConvertError::validation(format!("HAVING column {} is neither grouped nor aggregated", path)).err();
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::{
        converter::{
            aggregation::AggregationCompiler,
            having::HavingCompiler,
            statement_model::StatementModel,
            translator::ExpressionTranslator,
            ConvertError, ConvertResult, ConverterConfig,
        },
        parser::ast::Statement,
    };

    fn having(sql: &str) -> ConvertResult<Value> {
        let statement = Statement::try_from(sql).expect("Failed to parse statement");
        let model = StatementModel::from_statement(&statement).expect("Failed to build model");
        let grouping = AggregationCompiler::compile(&model)?;
        let config = ConverterConfig::default();
        let translator = ExpressionTranslator::new(&config);
        let expr = model.having_expr.clone().expect("statement has no HAVING");

        HavingCompiler::new(&model, &grouping, &translator).compile(&expr).map(Value::Object)
    }

    #[test]
    pub fn test_aggregate_resolves_to_accumulator() {
        let result = having("SELECT a, COUNT(*) FROM t GROUP BY a HAVING COUNT(*) > 2").expect("Failed to compile");

        assert_eq!(result, json!({"count": {"$gt": 2}}));
    }

    #[test]
    pub fn test_aliased_aggregate() {
        let result = having("SELECT a, SUM(b) AS total FROM t GROUP BY a HAVING total >= 10 AND SUM(b) < 100")
            .expect("Failed to compile");

        assert_eq!(result, json!({"$and": [{"total": {"$gte": 10}}, {"total": {"$lt": 100}}]}));
    }

    #[test]
    pub fn test_grouped_columns_resolve_to_id() {
        let result = having("SELECT a AS x, b, MAX(c) FROM t GROUP BY a, b HAVING x = 'k' AND b <> 1")
            .expect("Failed to compile");

        assert_eq!(result, json!({"$and": [{"_id.a": "k"}, {"_id.b": {"$ne": 1}}]}));

        let result = having("SELECT a, MAX(c) FROM t GROUP BY a HAVING a = 'k'").expect("Failed to compile");
        assert_eq!(result, json!({"_id": "k"}));
    }

    #[test]
    pub fn test_two_aggregates_compare_as_expression() {
        let result = having("SELECT a, MIN(b), MAX(b) FROM t GROUP BY a HAVING MAX(b) > MIN(b)").expect("Failed to compile");

        assert_eq!(result, json!({"$expr": {"$gt": ["$max_b", "$min_b"]}}));
    }

    #[test]
    pub fn test_unselected_aggregate_is_rejected() {
        let result = having("SELECT a, COUNT(*) FROM t GROUP BY a HAVING SUM(b) > 1");

        assert!(matches!(result, Err(ConvertError::Validation(_))));
    }

    #[test]
    pub fn test_ungrouped_column_is_rejected() {
        let result = having("SELECT a, COUNT(*) FROM t GROUP BY a HAVING b > 1");

        assert_eq!(
            result,
            Err(ConvertError::Validation("HAVING column b is neither grouped nor aggregated".into()))
        );
    }

    #[test]
    pub fn test_accumulator_field_by_name() {
        let result = having("SELECT a, COUNT(*) FROM t GROUP BY a HAVING count > 1").expect("Failed to compile");

        assert_eq!(result, json!({"count": {"$gt": 1}}));
    }
}
