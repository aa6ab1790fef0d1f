use serde_json::Value;
use tracing::debug;

use crate::{
    converter::{
        document::{document, field_reference, object, safe_key},
        statement_model::StatementModel,
        ConvertError, ConvertResult, Document,
    },
    parser::ast::{Expr, Function, SelectItem},
};

/// `$group` pieces for one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub id: Value,
    pub accumulators: Document,
    pub alias_projection: Document,
    pub grouped_fields: Vec<String>,
}

impl Grouping {
    /// Where a grouped field lives after `$group`, `None` when it is not grouped.
    pub fn id_reference(&self, path: &str) -> Option<String> {
        if !self.grouped_fields.iter().any(|field| field == path) {
            return None;
        }
        match self.grouped_fields.len() {
            1 => Some("_id".to_string()),
            _ => Some(format!("_id.{}", safe_key(path))),
        }
    }

    /// The `$group` body: `_id` first, then the accumulators, then `extra`.
    pub fn group_document(&self, extra: &Document) -> Document {
        let mut group = document("_id", self.id.clone());
        for (key, value) in self.accumulators.iter().chain(extra.iter()) {
            group.insert(key.clone(), value.clone());
        }
        group
    }
}

/// Output field of an aggregate: its alias, `count`, or `<fn>_<field>`.
pub fn accumulator_name(function: &Function, alias: Option<&str>) -> String {
    if let Some(alias) = alias {
        return alias.to_string();
    }

    let name = function.lower_name();
    if name == "count" {
        return name;
    }
    match function.column_args().first() {
        Some(column) => format!("{}_{}", name, safe_key(&column.path())),
        None => name,
    }
}

pub fn accumulator(function: &Function) -> ConvertResult<Value> {
    let name = function.lower_name();
    match name.as_str() {
        "count" => Ok(object("$sum", 1)),
        "sum" | "min" | "max" | "avg" => match function.column_args().first() {
            Some(column) => Ok(object(format!("${}", name), field_reference(&column.path()))),
            None => ConvertError::translation(format!("{} requires a field argument", function)).err(),
        },
        _ => ConvertError::unsupported(format!("could not understand function: {}", function.name)).err(),
    }
}

pub struct AggregationCompiler;

impl AggregationCompiler {
    pub fn compile(model: &StatementModel) -> ConvertResult<Grouping> {
        let mut grouped_fields: Vec<String> = vec![];
        let select_paths = model.select_columns().into_iter().map(|(path, _)| path);
        for path in select_paths.chain(model.group_keys.iter().cloned()) {
            if !grouped_fields.contains(&path) {
                grouped_fields.push(path);
            }
        }

        let id = match grouped_fields.as_slice() {
            [] => Value::Object(Document::new()),
            [field] => Value::String(field_reference(field)),
            fields => Value::Object(
                fields
                    .iter()
                    .map(|field| (safe_key(field), Value::String(field_reference(field))))
                    .collect(),
            ),
        };

        let mut grouping = Grouping {
            id,
            accumulators: Document::new(),
            alias_projection: Document::new(),
            grouped_fields,
        };

        for item in &model.select_items {
            let SelectItem::Expr { expr, alias } = item else {
                continue;
            };
            match expr {
                Expr::Column(column) => {
                    let path = column.path();
                    let key = alias.clone().unwrap_or_else(|| path.clone());
                    if let Some(reference) = grouping.id_reference(&path) {
                        grouping.alias_projection.insert(key, Value::String(field_reference(&reference)));
                    }
                }
                Expr::Function(function) => {
                    let name = accumulator_name(function, alias.as_deref());
                    if grouping.accumulators.contains_key(&name) {
                        return ConvertError::validation(format!(
                            "{} repeats the output field {}, alias one of the aggregates",
                            function, name
                        ))
                        .err();
                    }
                    grouping.accumulators.insert(name.clone(), accumulator(function)?);
                    grouping.alias_projection.insert(name, Value::from(1));
                }
                _ => {}
            }
        }
        grouping.alias_projection.insert("_id".into(), Value::from(0));

        debug!(grouped = ?grouping.grouped_fields, accumulators = grouping.accumulators.len(), "grouping compiled");
        Ok(grouping)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::{
        converter::{
            aggregation::{accumulator_name, AggregationCompiler, Grouping},
            statement_model::StatementModel,
            ConvertError,
        },
        parser::{ast::{Expr, Statement}, QueryParser},
    };

    fn compile(sql: &str) -> Grouping {
        let statement = Statement::try_from(sql).expect("Failed to parse statement");
        let model = StatementModel::from_statement(&statement).expect("Failed to build model");
        AggregationCompiler::compile(&model).expect("Failed to compile grouping")
    }

    #[test]
    pub fn test_single_key_is_scalar() {
        let grouping = compile("SELECT a, COUNT(*) FROM t GROUP BY a");

        assert_eq!(grouping.id, json!("$a"));
        assert_eq!(grouping.accumulators.get("count"), Some(&json!({"$sum": 1})));
        assert_eq!(Value::Object(grouping.alias_projection.clone()), json!({"a": "$_id", "count": 1, "_id": 0}));
        let keys: Vec<&String> = grouping.alias_projection.keys().collect();
        assert_eq!(keys, vec!["a", "count", "_id"]);
    }

    #[test]
    pub fn test_many_keys_are_a_document() {
        let grouping = compile("SELECT a, b.c, COUNT(*) FROM t GROUP BY a, b.c");

        assert_eq!(grouping.id, json!({"a": "$a", "b_c": "$b.c"}));
        assert_eq!(
            Value::Object(grouping.alias_projection),
            json!({"a": "$_id.a", "b.c": "$_id.b_c", "count": 1, "_id": 0})
        );
    }

    #[test]
    pub fn test_aliases_and_named_accumulators() {
        let grouping = compile("SELECT a AS x, SUM(b) AS total, MAX(c), AVG(d.e) FROM t GROUP BY a");

        assert_eq!(
            Value::Object(grouping.accumulators),
            json!({"total": {"$sum": "$b"}, "max_c": {"$max": "$c"}, "avg_d_e": {"$avg": "$d.e"}})
        );
        assert_eq!(grouping.alias_projection.get("x"), Some(&json!("$_id")));
    }

    #[test]
    pub fn test_same_field_under_two_aliases_collapses() {
        let grouping = compile("SELECT a AS x, a AS y, COUNT(*) FROM t GROUP BY a");

        assert_eq!(grouping.id, json!("$a"));
        assert_eq!(grouping.alias_projection.get("x"), Some(&json!("$_id")));
        assert_eq!(grouping.alias_projection.get("y"), Some(&json!("$_id")));
    }

    #[test]
    pub fn test_total_group() {
        let grouping = compile("SELECT SUM(a), MIN(b) FROM t");

        assert_eq!(grouping.id, json!({}));
        assert!(grouping.grouped_fields.is_empty());
        assert_eq!(grouping.id_reference("a"), None);
    }

    #[test]
    pub fn test_group_document_keeps_id_first() {
        let grouping = compile("SELECT a, b, COUNT(*) FROM t GROUP BY a, b");
        let extra = crate::converter::document::document("z", json!({"$first": "$z"}));

        let group = grouping.group_document(&extra);

        let keys: Vec<&String> = group.keys().collect();
        assert_eq!(keys, vec!["_id", "count", "z"]);
        assert_eq!(grouping.id_reference("b"), Some("_id.b".to_string()));
    }

    #[test]
    pub fn test_unknown_function_is_unsupported() {
        let statement = Statement::try_from("SELECT a, MEDIAN(b) FROM t GROUP BY a").expect("Failed to parse statement");
        let model = StatementModel::from_statement(&statement).expect("Failed to build model");

        match AggregationCompiler::compile(&model) {
            Err(ConvertError::Unsupported(message)) => assert!(message.contains("MEDIAN")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    pub fn test_repeated_output_field_is_rejected() {
        let statement = Statement::try_from("SELECT a, COUNT(*), COUNT(b) FROM t GROUP BY a").expect("Failed to parse statement");
        let model = StatementModel::from_statement(&statement).expect("Failed to build model");

        assert_eq!(
            AggregationCompiler::compile(&model),
            Err(ConvertError::Validation("COUNT(b) repeats the output field count, alias one of the aggregates".into()))
        );

        let grouping = compile("SELECT a, COUNT(*), COUNT(b) AS with_b FROM t GROUP BY a");
        assert_eq!(Value::Object(grouping.accumulators), json!({"count": {"$sum": 1}, "with_b": {"$sum": 1}}));
    }

    #[test]
    pub fn test_accumulator_name() {
        let mut parser = QueryParser::new("sum(a.b)");
        let Expr::Function(function) = Expr::parse(&mut parser).expect("Failed to parse") else {
            panic!("expected function");
        };

        assert_eq!(accumulator_name(&function, None), "sum_a_b");
        assert_eq!(accumulator_name(&function, Some("s")), "s");
    }
}
