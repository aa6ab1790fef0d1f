use std::fmt;

use crate::parser::QueryParser;

/// Where and why the SQL text was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Source text from `start` up to and including the cursor.
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pivot: usize, parser: &QueryParser) -> Self {
        let start = pivot.min(parser.position);
        Self {
            message: message.into(),
            text: parser.text_from_range(start, parser.position + 1),
            start,
            end: parser.position,
        }
    }

    /// Rejection of whatever follows a complete statement.
    pub fn trailing(parser: &QueryParser) -> Self {
        Self {
            message: "unable to parse complete sql string".into(),
            text: parser.text_from_range(parser.position, parser.length),
            start: parser.position,
            end: parser.length,
        }
    }

    pub fn err<T>(self) -> Result<T, ParseError> {
        Err(self)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParseError: {}\n  at [{}:{}] -> '{}'", self.message, self.start, self.end, self.text)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use crate::parser::{ParseError, QueryParser};

    #[test]
    pub fn test_display() {
        let mut parser = QueryParser::new("SELECT ?");
        parser.jump(7);

        let err = ParseError::new("Invalid expression", 7, &parser);

        assert_eq!(err.to_string(), "ParseError: Invalid expression\n  at [7:7] -> '?'");
    }

    #[test]
    pub fn test_trailing() {
        let mut parser = QueryParser::new("SELECT a FROM t x y");
        parser.jump(18);

        let err = ParseError::trailing(&parser);

        assert_eq!(err.message, "unable to parse complete sql string");
        assert_eq!(err.text, "y");
        assert_eq!((err.start, err.end), (18, 19));
    }
}
