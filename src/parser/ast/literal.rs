use ordered_float::NotNan;
use serde_json::{Number, Value};
use std::fmt::{self, Display};

use crate::parser::{ParseError, QueryParser};

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(NotNan<f64>),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn is_string_start(ch: char) -> bool {
        ch == '\'' || ch == '"'
    }

    pub fn is_number_start(parser: &QueryParser) -> bool {
        let current = parser.current();
        current.is_ascii_digit()
            || ((current == '-' || current == '.') && parser.peek(1).is_ascii_digit())
    }

    /// Quoted string; a doubled quote inside the string stands for the quote itself.
    pub fn parse_string(parser: &mut QueryParser) -> Result<Literal, ParseError> {
        let pivot = parser.position;
        let quote = parser.current();
        parser.next();

        let mut value = String::new();
        loop {
            if parser.eof() {
                return ParseError::new("Unterminated string", pivot, parser).err();
            }

            let current = parser.current();
            if current == quote {
                if parser.peek(1) == quote {
                    value.push(quote);
                    parser.jump(2);
                    continue;
                }
                parser.next();
                break;
            }

            value.push(current);
            parser.next();
        }

        Ok(Literal::String(value))
    }

    pub fn parse_number(parser: &mut QueryParser) -> Result<Literal, ParseError> {
        let pivot = parser.position;
        if parser.current() == '-' {
            parser.next();
        }

        let mut is_float = false;
        while !parser.eof() {
            let current = parser.current();
            if current == '.' && !is_float {
                is_float = true;
            } else if !current.is_ascii_digit() {
                break;
            }
            parser.next();
        }

        let text = parser.text_from_pivot(pivot);
        if !is_float && let Ok(value) = text.parse::<i64>() {
            return Ok(Literal::Int(value));
        }

        let value = text.parse::<f64>().ok().filter(|value| value.is_finite());
        match value.and_then(|value| NotNan::new(value).ok()) {
            Some(value) => Ok(Literal::Float(value)),
            None => ParseError::new("Invalid number", pivot, parser).err(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(value) => Value::String(value.clone()),
            Literal::Int(value) => Value::from(*value),
            Literal::Float(value) => Number::from_f64(value.into_inner())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Bool(value) => Value::Bool(*value),
            Literal::Null => Value::Null,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(n) => write!(f, "{}", n.into_inner()),
            Literal::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Literal::Null => write!(f, "NULL"),
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(_) => write!(f, "String({})", self),
            Literal::Int(_) => write!(f, "Int({})", self),
            Literal::Float(_) => write!(f, "Float({})", self),
            Literal::Bool(_) => write!(f, "Bool({})", self),
            Literal::Null => write!(f, "Null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::NotNan;
    use serde_json::json;

    use crate::parser::{ast::Literal, QueryParser};

    #[test]
    pub fn test_parse_string_single_quotes() {
        let mut parser = QueryParser::new("'it''s' rest");

        let result = Literal::parse_string(&mut parser).expect("Failed to parse string");

        assert_eq!(result, Literal::String("it's".to_string()));
        assert_eq!(parser.current(), ' ');
    }

    #[test]
    pub fn test_parse_string_double_quotes() {
        let mut parser = QueryParser::new("\"abc\"");

        let result = Literal::parse_string(&mut parser).expect("Failed to parse string");

        assert_eq!(result, Literal::String("abc".to_string()));
        assert!(parser.eof());
    }

    #[test]
    pub fn test_parse_string_unterminated() {
        let mut parser = QueryParser::new("'abc");

        let result = Literal::parse_string(&mut parser);

        match result {
            Ok(_) => panic!(),
            Err(err) => assert_eq!(err.message, "Unterminated string"),
        }
    }

    #[test]
    pub fn test_parse_numbers() {
        let mut parser = QueryParser::new("42");
        assert_eq!(Literal::parse_number(&mut parser).expect("Failed to parse int"), Literal::Int(42));

        let mut parser = QueryParser::new("-7,");
        assert_eq!(Literal::parse_number(&mut parser).expect("Failed to parse negative"), Literal::Int(-7));

        let mut parser = QueryParser::new("3.25)");
        let expected = Literal::Float(NotNan::new(3.25).expect("not nan"));
        assert_eq!(Literal::parse_number(&mut parser).expect("Failed to parse float"), expected);
    }

    #[test]
    pub fn test_parse_number_out_of_range() {
        let mut parser = QueryParser::new("100000000000000000000");
        let expected = Literal::Float(NotNan::new(1e20).expect("not nan"));
        assert_eq!(Literal::parse_number(&mut parser).expect("Failed to parse large number"), expected);

        let text = format!("1{}", "0".repeat(400));
        let mut parser = QueryParser::new(&text);
        match Literal::parse_number(&mut parser) {
            Ok(literal) => panic!("expected an error, got {:?}", literal),
            Err(err) => assert_eq!(err.message, "Invalid number"),
        }
    }

    #[test]
    pub fn test_display_escapes_quotes() {
        assert_eq!(Literal::String("it's".to_string()).to_string(), "'it''s'");
        assert_eq!(Literal::Bool(true).to_string(), "TRUE");
        assert_eq!(Literal::Null.to_string(), "NULL");
    }

    #[test]
    pub fn test_to_value() {
        assert_eq!(Literal::Int(5).to_value(), json!(5));
        assert_eq!(Literal::Float(NotNan::new(1.5).expect("not nan")).to_value(), json!(1.5));
        assert_eq!(Literal::String("a".into()).to_value(), json!("a"));
        assert_eq!(Literal::Null.to_value(), json!(null));
    }
}
