use serde_json::Value;
use tracing::trace;

use crate::{
    converter::{
        coercion::coerce_literal,
        document::{document, field_reference, object},
        functions::{date_match, like_to_regex, object_id_match, regex_match},
        ConvertError, ConvertResult, ConverterConfig, Document,
    },
    parser::ast::{ComparatorOp, Expr, Function, Literal},
};

/// Rewrites WHERE and HAVING trees into store filter documents.
pub struct ExpressionTranslator<'a> {
    config: &'a ConverterConfig,
}

impl<'a> ExpressionTranslator<'a> {
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Translates a predicate that must produce a filter document.
    pub fn translate_filter(&self, expr: &Expr) -> ConvertResult<Document> {
        match self.translate(expr, None)? {
            Value::Object(filter) => Ok(filter),
            other => ConvertError::translation(format!("expression '{}' does not produce a filter: {}", expr, other)).err(),
        }
    }

    /// `other_side` is the companion operand when `expr` is one side of a comparison.
    pub fn translate(&self, expr: &Expr, other_side: Option<&Expr>) -> ConvertResult<Value> {
        trace!(expr = %expr, "translating expression");

        match expr {
            Expr::Compare { left, op, right } => self.translate_compare(expr, left, *op, right),
            Expr::Like { expr: field, pattern, negated } => self.translate_like(field, pattern, *negated),
            Expr::IsNull { expr: field, negated } => {
                let field = field.as_column().map(|column| column.path()).unwrap_or_else(|| field.to_string());
                Ok(object(field, object("$exists", *negated)))
            }
            Expr::InList { expr: left, list, negated } => {
                if let Some(Expr::Subquery(statement)) = list.iter().find(|item| matches!(item, Expr::Subquery(_))) {
                    return ConvertError::unsupported(format!("subquery in IN is not supported: ({})", statement)).err();
                }
                if let Some(filter) = object_id_match(expr)? {
                    return Ok(Value::Object(filter));
                }
                self.translate_in(left, list, *negated)
            }
            Expr::And { left, right } => self.translate_connective("$and", expr, left, right),
            Expr::Or { left, right } => self.translate_connective("$or", expr, left, right),
            Expr::Parenthesis { expr: inner, negated } => {
                let inner = self.translate(inner, None)?;
                match negated {
                    true => Ok(object("$nor", vec![inner])),
                    false => Ok(inner),
                }
            }
            Expr::Not(inner) => match other_side {
                None => Ok(object(inner.to_string(), object("$ne", true))),
                Some(_) => ConvertError::translation(format!("NOT cannot be used as an operand: {}", expr)).err(),
            },
            Expr::Function(function) => {
                if other_side.is_none() && let Some(filter) = regex_match(expr)? {
                    return Ok(Value::Object(filter));
                }
                self.function_tree(function)
            }
            Expr::Column(column) => match other_side {
                None => Ok(object(column.path(), true)),
                Some(_) => Ok(Value::String(column.path())),
            },
            Expr::Literal(literal) => match other_side {
                Some(other) => Ok(self.literal_value(literal, Some(other))),
                None => ConvertError::translation(format!("literal {} cannot be used as a predicate", literal)).err(),
            },
            Expr::Wildcard => ConvertError::translation("unexpected '*' in expression").err(),
            Expr::Subquery(statement) => {
                ConvertError::unsupported(format!("subqueries are not supported in expressions: ({})", statement)).err()
            }
        }
    }

    fn literal_value(&self, literal: &Literal, other_side: Option<&Expr>) -> Value {
        let field_type = match other_side.and_then(Expr::as_column) {
            Some(column) => self.config.field_type(&column.path()),
            None => self.config.default_field_type,
        };
        coerce_literal(literal, field_type)
    }

    /// Value of an operand inside an aggregation expression, fields as `$path`.
    fn operand(&self, expr: &Expr, other_side: &Expr) -> ConvertResult<Value> {
        match expr {
            Expr::Column(column) => Ok(Value::String(field_reference(&column.path()))),
            Expr::Function(function) => self.function_tree(function),
            Expr::Literal(literal) => Ok(self.literal_value(literal, Some(other_side))),
            other => self.translate(other, Some(other_side)),
        }
    }

    /// `{"$name": arg}` or `{"$name": [args]}`, nesting inner calls.
    pub fn function_tree(&self, function: &Function) -> ConvertResult<Value> {
        let mut args = vec![];
        for arg in &function.args {
            let value = match arg {
                Expr::Column(column) => Value::String(field_reference(&column.path())),
                Expr::Function(inner) => self.function_tree(inner)?,
                Expr::Literal(literal) => literal.to_value(),
                Expr::Wildcard => {
                    return ConvertError::translation(format!("'*' is not a valid argument of {}", function)).err();
                }
                other => self.translate(other, None)?,
            };
            args.push(value);
        }

        let value = match args.len() {
            1 => args.remove(0),
            _ => Value::Array(args),
        };
        Ok(object(format!("${}", function.name), value))
    }

    fn translate_compare(&self, expr: &Expr, left: &Expr, op: ComparatorOp, right: &Expr) -> ConvertResult<Value> {
        let specials: [fn(&Expr) -> ConvertResult<Option<Document>>; 3] = [regex_match, date_match, object_id_match];
        for special in specials {
            if let Some(filter) = special(expr)? {
                return Ok(Value::Object(filter));
            }
        }

        let is_function = |side: &Expr| side.as_function().is_some();
        let both_columns = left.as_column().is_some() && right.as_column().is_some();

        if is_function(left) || is_function(right) || both_columns {
            let pair = vec![self.operand(left, right)?, self.operand(right, left)?];
            return Ok(object("$expr", object(op.mongo_operator(), pair)));
        }

        let (column, value, op) = match (left.as_column(), right.as_column()) {
            (Some(column), _) => (column, self.translate(right, Some(left))?, op),
            (None, Some(column)) => (column, self.translate(left, Some(right))?, op.mirror()),
            (None, None) => {
                return ConvertError::translation(format!("comparison needs a field on one side: {}", expr)).err();
            }
        };

        match op {
            ComparatorOp::Eq => Ok(object(column.path(), value)),
            _ => Ok(object(column.path(), object(op.mongo_operator(), value))),
        }
    }

    fn translate_like(&self, field: &Expr, pattern: &Expr, negated: bool) -> ConvertResult<Value> {
        if negated {
            return ConvertError::unsupported("NOT LIKE queries not supported").err();
        }

        let Some(column) = field.as_column() else {
            return ConvertError::translation(format!("LIKE requires a field on the left side: {}", field)).err();
        };

        let pattern = match pattern {
            Expr::Literal(Literal::String(pattern)) => pattern.clone(),
            Expr::Column(column) => column.path(),
            other => return ConvertError::translation(format!("invalid LIKE pattern: {}", other)).err(),
        };

        let regex = format!("^{}$", like_to_regex(&pattern));
        Ok(object(column.path(), object("$regex", regex)))
    }

    fn translate_in(&self, left: &Expr, list: &[Expr], negated: bool) -> ConvertResult<Value> {
        let values = list
            .iter()
            .map(|item| self.operand(item, left))
            .collect::<ConvertResult<Vec<_>>>()?;

        if let Some(function) = left.as_function() {
            let key = if negated { "$fnin" } else { "$fin" };
            let mut membership = document("function", self.function_tree(function)?);
            membership.insert("list".into(), Value::Array(values));
            return Ok(object(key, membership));
        }

        let key = if negated { "$nin" } else { "$in" };
        let left_value = match left {
            Expr::Column(column) => Value::String(field_reference(&column.path())),
            Expr::Literal(literal) => literal.to_value(),
            other => return ConvertError::translation(format!("invalid IN operand: {}", other)).err(),
        };
        Ok(object("$expr", object(key, vec![left_value, Value::Array(values)])))
    }

    fn translate_connective(&self, key: &str, node: &Expr, left: &Expr, right: &Expr) -> ConvertResult<Value> {
        let mut operands = vec![];
        if self.flatten(node, left, right, &mut operands)? {
            operands.reverse();
        } else {
            operands = vec![self.translate(left, None)?, self.translate(right, None)?];
        }
        Ok(object(key, operands))
    }

    /// Walks the left spine while it repeats the connective of `node` and every right child is a leaf.
    /// Operands are collected right to left; false means the chain is mixed.
    fn flatten(&self, node: &Expr, left: &Expr, right: &Expr, operands: &mut Vec<Value>) -> ConvertResult<bool> {
        if !right.is_boolean_connective() {
            match (node, left) {
                (Expr::And { .. }, Expr::And { left: inner_left, right: inner_right })
                | (Expr::Or { .. }, Expr::Or { left: inner_left, right: inner_right }) => {
                    operands.push(self.translate(right, None)?);
                    return self.flatten(node, inner_left, inner_right, operands);
                }
                _ => {}
            }
        }

        if left.is_boolean_connective() || right.is_boolean_connective() {
            return Ok(false);
        }

        operands.push(self.translate(right, None)?);
        operands.push(self.translate(left, None)?);
        Ok(true)
    }
}
