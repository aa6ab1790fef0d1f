use serde_json::Value;

use crate::{
    converter::{
        functions::{date_value, parse_date},
        FieldType,
    },
    parser::ast::Literal,
};

/// Converts a SQL literal into the value stored for a field of `field_type`.
/// Values that do not fit the declared type are kept as written.
pub fn coerce_literal(literal: &Literal, field_type: FieldType) -> Value {
    match (field_type, literal) {
        (FieldType::Number, Literal::String(text)) => {
            if let Ok(value) = text.trim().parse::<i64>() {
                return Value::from(value);
            }
            match text.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                Some(number) => Value::Number(number),
                None => literal.to_value(),
            }
        }
        (FieldType::String, Literal::Int(_) | Literal::Float(_) | Literal::Bool(_)) => {
            Value::String(literal.to_string().to_lowercase())
        }
        (FieldType::Boolean, Literal::String(text)) => match text.to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => literal.to_value(),
        },
        (FieldType::Date, Literal::String(text)) => match parse_date(text, "natural") {
            Ok(date) => date_value(&date),
            Err(_) => literal.to_value(),
        },
        _ => literal.to_value(),
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::NotNan;
    use serde_json::json;

    use crate::{
        converter::{_tests::fixtures::date_json, coercion::coerce_literal, FieldType},
        parser::ast::Literal,
    };

    #[test]
    pub fn test_number_coercion() {
        assert_eq!(coerce_literal(&Literal::String("42".into()), FieldType::Number), json!(42));
        assert_eq!(coerce_literal(&Literal::String("4.5".into()), FieldType::Number), json!(4.5));
        assert_eq!(coerce_literal(&Literal::String("abc".into()), FieldType::Number), json!("abc"));
    }

    #[test]
    pub fn test_string_coercion() {
        assert_eq!(coerce_literal(&Literal::Int(42), FieldType::String), json!("42"));
        let float = Literal::Float(NotNan::new(1.5).expect("not nan"));
        assert_eq!(coerce_literal(&float, FieldType::String), json!("1.5"));
        assert_eq!(coerce_literal(&Literal::Bool(true), FieldType::String), json!("true"));
    }

    #[test]
    pub fn test_boolean_and_date_coercion() {
        assert_eq!(coerce_literal(&Literal::String("TRUE".into()), FieldType::Boolean), json!(true));
        assert_eq!(
            coerce_literal(&Literal::String("2020-01-31".into()), FieldType::Date),
            date_json("2020-01-31T00:00:00Z")
        );
    }

    #[test]
    pub fn test_unknown_keeps_literal() {
        assert_eq!(coerce_literal(&Literal::String("42".into()), FieldType::Unknown), json!("42"));
        assert_eq!(coerce_literal(&Literal::Null, FieldType::Number), json!(null));
    }
}
