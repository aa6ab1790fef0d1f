use std::fmt;

use crate::parser::{ast::{Statement, TextCollector}, ParseError, QueryParser};

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table { name: String, alias: Option<String> },
    Query { statement: Box<Statement>, alias: Option<String> },
}

impl Source {
    pub fn parse(parser: &mut QueryParser) -> Result<Self, ParseError> {
        if parser.consume_char('(') {
            let statement = Statement::parse(parser)?;
            parser.expect_char(')', "Expected ')' to close the sub select")?;
            let alias = TextCollector::collect_alias(parser)?;
            return Ok(Source::Query { statement: Box::new(statement), alias });
        }

        let pivot = parser.position;
        let name = TextCollector::collect_path(parser)
            .map_err(|_| ParseError::new("Invalid table name", pivot, parser))?
            .join(".");
        parser.next_non_whitespace();

        let alias = TextCollector::collect_alias(parser)?;
        Ok(Source::Table { name, alias })
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Source::Table { alias, .. } | Source::Query { alias, .. } => alias.as_deref(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Table { name, .. } => write!(f, "{}", name)?,
            Source::Query { statement, .. } => write!(f, "({})", statement)?,
        }
        match self.alias() {
            Some(alias) => write!(f, " {}", alias),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{ast::Source, QueryParser};

    #[test]
    pub fn test_table_with_alias() {
        let mut parser = QueryParser::new("people p WHERE");

        let result = Source::parse(&mut parser).expect("Failed to parse source");

        assert_eq!(result, Source::Table { name: "people".into(), alias: Some("p".into()) });
        assert_eq!(parser.current(), 'W');
    }

    #[test]
    pub fn test_table_without_alias() {
        let mut parser = QueryParser::new("people WHERE");

        let result = Source::parse(&mut parser).expect("Failed to parse source");

        assert_eq!(result, Source::Table { name: "people".into(), alias: None });
    }

    #[test]
    pub fn test_sub_select() {
        let mut parser = QueryParser::new("(SELECT a FROM t WHERE a > 1) AS sub");

        let result = Source::parse(&mut parser).expect("Failed to parse source");

        match result {
            Source::Query { statement, alias } => {
                assert_eq!(alias, Some("sub".into()));
                assert_eq!(statement.to_string(), "SELECT a FROM t WHERE a > 1");
            }
            Source::Table { .. } => panic!(),
        }
    }
}
