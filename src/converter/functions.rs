use bson::{oid::ObjectId, Bson};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::{
    converter::{
        document::{document, object},
        ConvertError, ConvertResult, Document,
    },
    parser::ast::{Column, ComparatorOp, Expr, Function, Literal},
};

static DATE_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'[^']*'|y+|M+|d+|H+|h+|m+|s+|S+|a|Z|X+|%").expect("valid date token regex"));

const NATURAL: &str = "natural";

/// Translates a SQL LIKE pattern into the body of a regular expression.
pub fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::new();
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex
}

fn date_token(captures: &Captures) -> String {
    let token = &captures[0];
    match token {
        "%" => "%%".to_string(),
        "yyyy" | "y" => "%Y".to_string(),
        "yy" => "%y".to_string(),
        "MM" | "M" => "%m".to_string(),
        "MMM" => "%b".to_string(),
        "dd" | "d" => "%d".to_string(),
        "HH" | "H" => "%H".to_string(),
        "hh" | "h" => "%I".to_string(),
        "mm" | "m" => "%M".to_string(),
        "ss" | "s" => "%S".to_string(),
        "SSS" => "%3f".to_string(),
        "a" => "%p".to_string(),
        "Z" => "%z".to_string(),
        "X" | "XX" | "XXX" => "%:z".to_string(),
        quoted if quoted.starts_with('\'') => quoted.trim_matches('\'').replace('%', "%%"),
        other => other.to_string(),
    }
}

/// Converts a `yyyy-MM-dd HH:mm:ss` style pattern into a chrono format string.
pub fn java_pattern_to_chrono(pattern: &str) -> String {
    DATE_TOKENS.replace_all(pattern, date_token).into_owned()
}

fn parse_with_format(value: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_str(value, format) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

fn parse_natural(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d"]
        .iter()
        .find_map(|format| parse_with_format(value, format))
}

/// Parses `value` with a Java style pattern, or ISO forms for `natural`.
pub fn parse_date(value: &str, pattern: &str) -> ConvertResult<DateTime<Utc>> {
    let parsed = match pattern.eq_ignore_ascii_case(NATURAL) {
        true => parse_natural(value),
        false => parse_with_format(value, &java_pattern_to_chrono(pattern)),
    };

    parsed.ok_or_else(|| {
        ConvertError::translation(format!("could not convert '{}' to a date with pattern '{}'", value, pattern))
    })
}

/// Relaxed extended JSON date: `{"$date": "2020-01-31T00:00:00Z"}`.
pub fn date_value(date: &DateTime<Utc>) -> Value {
    Bson::DateTime(bson::DateTime::from_chrono(*date)).into_relaxed_extjson()
}

pub fn object_id_value(hex: &str) -> ConvertResult<Value> {
    let id = ObjectId::parse_str(hex)
        .map_err(|err| ConvertError::translation(format!("invalid object id '{}': {}", hex, err)))?;
    Ok(Bson::ObjectId(id).into_relaxed_extjson())
}

fn named<'a>(expr: &'a Expr, name: &str) -> Option<&'a Function> {
    expr.as_function().filter(|function| function.name.eq_ignore_ascii_case(name))
}

fn string_arg(function: &Function, index: usize) -> Option<&str> {
    match function.args.get(index) {
        Some(Expr::Literal(Literal::String(value))) => Some(value),
        _ => None,
    }
}

fn column_arg(function: &Function, index: usize) -> Option<&Column> {
    function.args.get(index).and_then(Expr::as_column)
}

/// `regexMatch(column, 'pattern' [, 'options'])`, bare or compared to TRUE.
pub fn regex_match(expr: &Expr) -> ConvertResult<Option<Document>> {
    let function = match expr {
        Expr::Function(_) => named(expr, "regexMatch"),
        Expr::Compare { left, op: ComparatorOp::Eq, right } => match (left.as_ref(), right.as_ref()) {
            (function, Expr::Literal(Literal::Bool(true))) | (Expr::Literal(Literal::Bool(true)), function) => {
                named(function, "regexMatch")
            }
            _ => None,
        },
        _ => None,
    };

    let Some(function) = function else {
        return Ok(None);
    };

    let (Some(column), Some(pattern)) = (column_arg(function, 0), string_arg(function, 1)) else {
        return ConvertError::translation(format!("regexMatch requires a column and a pattern: {}", function)).err();
    };

    let mut regex = document("$regex", pattern);
    match (function.args.len(), string_arg(function, 2)) {
        (2, _) => {}
        (3, Some(options)) => {
            regex.insert("$options".into(), Value::from(options));
        }
        _ => return ConvertError::translation(format!("invalid regexMatch options: {}", function)).err(),
    }

    Ok(Some(document(column.path(), Value::Object(regex))))
}

/// `date(column, 'pattern') <op> 'value'`, in either operand order.
pub fn date_match(expr: &Expr) -> ConvertResult<Option<Document>> {
    let Expr::Compare { left, op, right } = expr else {
        return Ok(None);
    };

    let (function, value, op) = match (named(left, "date"), named(right, "date")) {
        (Some(function), _) => (function, right.as_ref(), *op),
        (None, Some(function)) => (function, left.as_ref(), op.mirror()),
        (None, None) => return Ok(None),
    };

    let (Some(column), Some(pattern)) = (column_arg(function, 0), string_arg(function, 1)) else {
        return ConvertError::translation(format!("date requires a column and a pattern: {}", function)).err();
    };

    let Expr::Literal(Literal::String(value)) = value else {
        return ConvertError::translation(format!("date must be compared to a string: {}", expr)).err();
    };

    let date = date_value(&parse_date(value, pattern)?);
    Ok(Some(document(column.path(), object(op.mongo_operator(), date))))
}

fn object_id_field(function: &Function) -> ConvertResult<String> {
    match (function.args.len(), function.args.first()) {
        (1, Some(Expr::Literal(Literal::String(field)))) => Ok(field.clone()),
        (1, Some(Expr::Column(column))) => Ok(column.path()),
        _ => ConvertError::translation(format!("OBJECTID requires a single field name: {}", function)).err(),
    }
}

fn object_id_literal(expr: &Expr) -> ConvertResult<Value> {
    match expr {
        Expr::Literal(Literal::String(hex)) => object_id_value(hex),
        other => ConvertError::translation(format!("object id must be a string: {}", other)).err(),
    }
}

/// `OBJECTID('field')` compared with `=`, `<>` or used with `[NOT] IN`.
pub fn object_id_match(expr: &Expr) -> ConvertResult<Option<Document>> {
    match expr {
        Expr::Compare { left, op, right } => {
            let (function, value) = match (named(left, "objectid"), named(right, "objectid")) {
                (Some(function), _) => (function, right.as_ref()),
                (None, Some(function)) => (function, left.as_ref()),
                (None, None) => return Ok(None),
            };

            let field = object_id_field(function)?;
            let id = object_id_literal(value)?;
            match op {
                ComparatorOp::Eq => Ok(Some(document(field, id))),
                ComparatorOp::NotEq => Ok(Some(document(field, object("$ne", id)))),
                other => ConvertError::unsupported(format!("OBJECTID does not support operator {}", other)).err(),
            }
        }
        Expr::InList { expr, list, negated } => {
            let Some(function) = named(expr, "objectid") else {
                return Ok(None);
            };

            let field = object_id_field(function)?;
            let ids = list.iter().map(object_id_literal).collect::<ConvertResult<Vec<_>>>()?;
            let op = if *negated { "$nin" } else { "$in" };
            Ok(Some(document(field, object(op, ids))))
        }
        _ => Ok(None),
    }
}
