use serde_json::Value;
use tracing::debug;

use crate::{
    converter::{
        document::{document, field_reference, object},
        stage::Stage,
        translator::ExpressionTranslator,
        ConvertError, ConvertResult, Document,
    },
    parser::ast::{Column, ComparatorOp, Expr, Join, JoinKind, Source},
};

/// WHERE conjuncts that only read the base table, and what must wait for the joins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereSplit {
    pub pushed: Option<Expr>,
    pub residual: Option<Expr>,
}

fn collect_conjuncts(expr: &Expr, conjuncts: &mut Vec<Expr>) {
    match expr {
        Expr::And { left, right } => {
            collect_conjuncts(left, conjuncts);
            collect_conjuncts(right, conjuncts);
        }
        other => conjuncts.push(other.clone()),
    }
}

fn combine(conjuncts: Vec<Expr>) -> Option<Expr> {
    conjuncts
        .into_iter()
        .reduce(|left, right| Expr::And { left: Box::new(left), right: Box::new(right) })
}

fn is_joined_column(column: &Column, join_aliases: &[String]) -> bool {
    column
        .collection()
        .is_some_and(|collection| join_aliases.iter().any(|alias| alias == collection))
}

/// Splits an alias-stripped WHERE tree. Any OR keeps the whole tree after the joins.
pub fn split_where(expr: &Expr, join_aliases: &[String]) -> WhereSplit {
    if expr.contains_or() {
        debug!("OR found in WHERE, filter pushdown abandoned");
        return WhereSplit { pushed: None, residual: Some(expr.clone()) };
    }

    let mut conjuncts = vec![];
    collect_conjuncts(expr, &mut conjuncts);

    let (residual, pushed): (Vec<Expr>, Vec<Expr>) = conjuncts
        .into_iter()
        .partition(|conjunct| conjunct.any_column(&|column: &Column| is_joined_column(column, join_aliases)));

    WhereSplit { pushed: combine(pushed), residual: combine(residual) }
}

pub fn join_alias(join: &Join) -> ConvertResult<String> {
    match &join.source {
        Source::Table { name, alias } => Ok(alias.clone().unwrap_or_else(|| name.clone())),
        Source::Query { .. } => ConvertError::unsupported(format!("subqueries are not supported as join targets: {}", join)).err(),
    }
}

/// Emits `$lookup` and `$unwind` stages per join, then the residual `$match`.
pub struct JoinPipelineBuilder<'a> {
    translator: &'a ExpressionTranslator<'a>,
}

impl<'a> JoinPipelineBuilder<'a> {
    pub fn new(translator: &'a ExpressionTranslator<'a>) -> Self {
        Self { translator }
    }

    pub fn build(&self, joins: &[Join], residual: Option<&Expr>) -> ConvertResult<Vec<Stage>> {
        let mut stages = vec![];
        for join in joins {
            let preserve_null_and_empty = match join.kind {
                JoinKind::Inner => false,
                JoinKind::Left => true,
                JoinKind::Right | JoinKind::Full => {
                    return ConvertError::unsupported(format!("{} is not supported", join.kind)).err();
                }
            };

            let Source::Table { name, .. } = &join.source else {
                return ConvertError::unsupported(format!("subqueries are not supported as join targets: {}", join)).err();
            };
            let alias = join_alias(join)?;

            let lookup = self.lookup(name, &alias, &join.on)?;
            debug!(collection = %name, alias = %alias, "join lookup built");

            stages.push(Stage::Lookup(lookup));
            stages.push(Stage::Unwind { path: alias, preserve_null_and_empty });
        }

        if let Some(residual) = residual {
            stages.push(Stage::Match(self.translator.translate_filter(residual)?));
        }

        Ok(stages)
    }

    fn lookup(&self, collection: &str, alias: &str, on: &Expr) -> ConvertResult<Document> {
        let mut lookup = document("from", collection);

        if let Some((local, foreign)) = Self::simple_keys(alias, on) {
            lookup.insert("localField".into(), Value::String(local));
            lookup.insert("foreignField".into(), Value::String(foreign));
        } else {
            let mut lets = Document::new();
            let condition = self.condition(on, alias, &mut lets)?;
            lookup.insert("let".into(), Value::Object(lets));
            lookup.insert("pipeline".into(), Value::Array(vec![object("$match", object("$expr", condition))]));
        }

        lookup.insert("as".into(), Value::String(alias.to_string()));
        Ok(lookup)
    }

    /// `local.field = alias.field` in either order.
    fn simple_keys(alias: &str, on: &Expr) -> Option<(String, String)> {
        let Expr::Compare { left, op: ComparatorOp::Eq, right } = on else {
            return None;
        };
        let (left, right) = (left.as_column()?, right.as_column()?);
        let joined = |column: &Column| column.collection() == Some(alias);

        match (joined(left), joined(right)) {
            (false, true) => Some((left.path(), right.name().to_string())),
            (true, false) => Some((right.path(), left.name().to_string())),
            _ => None,
        }
    }

    fn collect_chain<'e>(expr: &'e Expr, and: bool, operands: &mut Vec<&'e Expr>) {
        match (expr, and) {
            (Expr::And { left, right }, true) | (Expr::Or { left, right }, false) => {
                Self::collect_chain(left, and, operands);
                Self::collect_chain(right, and, operands);
            }
            _ => operands.push(expr),
        }
    }

    /// Join condition as an aggregation expression; base fields become `$$` variables.
    fn condition(&self, expr: &Expr, alias: &str, lets: &mut Document) -> ConvertResult<Value> {
        match expr {
            Expr::And { .. } | Expr::Or { .. } => {
                let and = matches!(expr, Expr::And { .. });
                let mut operands = vec![];
                Self::collect_chain(expr, and, &mut operands);
                let values = operands
                    .into_iter()
                    .map(|operand| self.condition(operand, alias, lets))
                    .collect::<ConvertResult<Vec<_>>>()?;
                Ok(object(if and { "$and" } else { "$or" }, values))
            }
            Expr::Compare { left, op, right } => {
                let pair = vec![self.operand(left, alias, lets)?, self.operand(right, alias, lets)?];
                Ok(object(op.mongo_operator(), pair))
            }
            Expr::Parenthesis { expr: inner, negated } => {
                let inner = self.condition(inner, alias, lets)?;
                match negated {
                    true => Ok(object("$not", vec![inner])),
                    false => Ok(inner),
                }
            }
            Expr::Not(inner) => Ok(object("$not", vec![self.condition(inner, alias, lets)?])),
            Expr::IsNull { expr: inner, negated } => {
                let op = if *negated { "$ne" } else { "$eq" };
                Ok(object(op, vec![self.operand(inner, alias, lets)?, Value::Null]))
            }
            Expr::InList { expr: inner, list, negated } => {
                let values = list
                    .iter()
                    .map(|item| self.operand(item, alias, lets))
                    .collect::<ConvertResult<Vec<_>>>()?;
                let membership = object("$in", vec![self.operand(inner, alias, lets)?, Value::Array(values)]);
                match negated {
                    true => Ok(object("$not", vec![membership])),
                    false => Ok(membership),
                }
            }
            Expr::Column(_) | Expr::Function(_) => self.operand(expr, alias, lets),
            other => ConvertError::unsupported(format!("unsupported expression in join condition: {}", other)).err(),
        }
    }

    fn operand(&self, expr: &Expr, alias: &str, lets: &mut Document) -> ConvertResult<Value> {
        match expr {
            Expr::Column(column) if column.collection() == Some(alias) => {
                Ok(Value::String(field_reference(column.name())))
            }
            Expr::Column(column) => {
                let variable = bind_variable(&column.path(), lets);
                Ok(Value::String(format!("$${}", variable)))
            }
            Expr::Literal(literal) => Ok(literal.to_value()),
            Expr::Function(function) => {
                let mut args = function
                    .args
                    .iter()
                    .map(|arg| self.operand(arg, alias, lets))
                    .collect::<ConvertResult<Vec<_>>>()?;
                let value = match args.len() {
                    1 => args.remove(0),
                    _ => Value::Array(args),
                };
                Ok(object(format!("${}", function.name), value))
            }
            other => self.condition(other, alias, lets),
        }
    }
}

/// `$lookup` variables must start with a lowercase letter.
pub fn variable_name(path: &str) -> String {
    let name = path.replace('.', "_");
    match name.chars().next() {
        Some(first) if first.is_ascii_lowercase() => name,
        _ => format!("v_{}", name),
    }
}

/// Binds `path` in `lets`, reusing its binding or suffixing a clashing name.
fn bind_variable(path: &str, lets: &mut Document) -> String {
    let reference = Value::String(field_reference(path));
    if let Some((name, _)) = lets.iter().find(|(_, bound)| **bound == reference) {
        return name.clone();
    }

    let base = variable_name(path);
    let mut name = base.clone();
    let mut suffix = 1;
    while lets.contains_key(&name) {
        suffix += 1;
        name = format!("{}_{}", base, suffix);
    }
    lets.insert(name.clone(), reference);
    name
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::{
        converter::{
            join::{split_where, variable_name, JoinPipelineBuilder},
            stage::Stage,
            translator::ExpressionTranslator,
            ConvertError, ConverterConfig,
        },
        parser::{ast::{Expr, Join}, QueryParser},
    };

    fn parse(text: &str) -> Expr {
        let mut parser = QueryParser::new(text);
        Expr::parse(&mut parser).expect("Failed to parse expression")
    }

    fn joins(text: &str) -> Vec<Join> {
        let mut parser = QueryParser::new(text);
        Join::parse(&mut parser).expect("Failed to parse joins")
    }

    fn documents(stages: &[Stage]) -> Value {
        Value::Array(stages.iter().map(|stage| Value::Object(stage.to_document())).collect())
    }

    fn build(joins_text: &str, residual: Option<&str>) -> Result<Value, ConvertError> {
        let config = ConverterConfig::default();
        let translator = ExpressionTranslator::new(&config);
        let residual = residual.map(parse);
        JoinPipelineBuilder::new(&translator)
            .build(&joins(joins_text), residual.as_ref())
            .map(|stages| documents(&stages))
    }

    #[test]
    pub fn test_split_pushes_base_conjuncts() {
        let aliases = vec!["o".to_string()];

        let split = split_where(&parse("age > 3 AND o.total > 10 AND name = 'x'"), &aliases);

        assert_eq!(split.pushed.map(|e| e.to_string()), Some("age > 3 AND name = 'x'".to_string()));
        assert_eq!(split.residual.map(|e| e.to_string()), Some("o.total > 10".to_string()));
    }

    #[test]
    pub fn test_split_abandoned_on_or() {
        let aliases = vec!["o".to_string()];
        let expr = parse("age > 3 AND (o.total > 10 OR name = 'x')");

        let split = split_where(&expr, &aliases);

        assert_eq!(split.pushed, None);
        assert_eq!(split.residual, Some(expr));
    }

    #[test]
    pub fn test_split_all_base() {
        let split = split_where(&parse("age > 3"), &["o".to_string()]);

        assert_eq!(split.pushed.map(|e| e.to_string()), Some("age > 3".to_string()));
        assert_eq!(split.residual, None);
    }

    #[test]
    pub fn test_simple_lookup() {
        let result = build("INNER JOIN orders o ON o.person_id = id", None).expect("Failed to build joins");

        assert_eq!(result, json!([
            {"$lookup": {"from": "orders", "localField": "id", "foreignField": "person_id", "as": "o"}},
            {"$unwind": {"path": "$o", "preserveNullAndEmptyArrays": false}}
        ]));
    }

    #[test]
    pub fn test_left_join_preserves_and_residual_match() {
        let result = build("LEFT JOIN orders o ON id = o.person_id", Some("o.total > 10")).expect("Failed to build joins");

        assert_eq!(result, json!([
            {"$lookup": {"from": "orders", "localField": "id", "foreignField": "person_id", "as": "o"}},
            {"$unwind": {"path": "$o", "preserveNullAndEmptyArrays": true}},
            {"$match": {"o.total": {"$gt": 10}}}
        ]));
    }

    #[test]
    pub fn test_compound_condition_uses_pipeline() {
        let result = build("JOIN orders o ON o.person_id = id AND o.status = 'open' AND o.year >= Year", None)
            .expect("Failed to build joins");

        assert_eq!(result[0], json!({"$lookup": {
            "from": "orders",
            "let": {"id": "$id", "v_Year": "$Year"},
            "pipeline": [{"$match": {"$expr": {"$and": [
                {"$eq": ["$person_id", "$$id"]},
                {"$eq": ["$status", "open"]},
                {"$gte": ["$year", "$$v_Year"]}
            ]}}}],
            "as": "o"
        }}));
    }

    #[test]
    pub fn test_clashing_variables_get_distinct_names() {
        let result = build("JOIN orders o ON o.x = a.b AND o.y = a_b AND o.z = a.b", None).expect("Failed to build joins");

        assert_eq!(result[0], json!({"$lookup": {
            "from": "orders",
            "let": {"a_b": "$a.b", "a_b_2": "$a_b"},
            "pipeline": [{"$match": {"$expr": {"$and": [
                {"$eq": ["$x", "$$a_b"]},
                {"$eq": ["$y", "$$a_b_2"]},
                {"$eq": ["$z", "$$a_b"]}
            ]}}}],
            "as": "o"
        }}));
    }

    #[test]
    pub fn test_right_and_full_joins_rejected() {
        assert!(matches!(build("RIGHT JOIN b ON b.id = id", None), Err(ConvertError::Unsupported(_))));
        assert!(matches!(build("FULL OUTER JOIN b ON b.id = id", None), Err(ConvertError::Unsupported(_))));
        assert!(matches!(build("JOIN (SELECT a FROM b) x ON x.a = id", None), Err(ConvertError::Unsupported(_))));
    }

    #[test]
    pub fn test_variable_name() {
        assert_eq!(variable_name("address.city"), "address_city");
        assert_eq!(variable_name("_id"), "v__id");
    }
}
