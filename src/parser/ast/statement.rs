use std::fmt;

use crate::parser::{
    ast::{Column, Expr, Join, Literal, OrderBy, SelectItem, Source},
    ParseError, QueryParser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    Select,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub command: Command,
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub source: Source,
    pub joins: Vec<Join>,
    pub criteria: Option<Expr>,
    pub group_by: Vec<Column>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Statement {
    pub fn parse(parser: &mut QueryParser) -> Result<Statement, ParseError> {
        parser.next_non_whitespace();

        if parser.consume_word(|c| &c.delete) {
            return Self::parse_delete(parser);
        }

        parser.expect_word(|c| &c.select, "Expected SELECT or DELETE")?;
        let distinct = parser.consume_word(|c| &c.distinct);
        let projection = SelectItem::parse(parser)?;

        parser.expect_word(|c| &c.from, "Expected FROM")?;
        let source = Source::parse(parser)?;
        let joins = Join::parse(parser)?;
        let criteria = Self::parse_criteria(parser)?;

        let mut group_by = vec![];
        if parser.consume_word(|c| &c.group) {
            parser.expect_word(|c| &c.by, "Expected BY after GROUP")?;
            group_by = Self::parse_group_by(parser)?;
        }

        let having = match parser.consume_word(|c| &c.having) {
            true => Some(Expr::parse(parser)?),
            false => None,
        };

        let mut order_by = vec![];
        if parser.consume_word(|c| &c.order) {
            parser.expect_word(|c| &c.by, "Expected BY after ORDER")?;
            order_by = OrderBy::parse(parser)?;
        }

        let limit = match parser.consume_word(|c| &c.limit) {
            true => Some(Self::parse_count(parser, "Invalid limit")?),
            false => None,
        };
        let offset = match parser.consume_word(|c| &c.offset) {
            true => Some(Self::parse_count(parser, "Invalid offset")?),
            false => None,
        };

        Ok(Statement {
            command: Command::Select,
            distinct,
            projection,
            source,
            joins,
            criteria,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_delete(parser: &mut QueryParser) -> Result<Statement, ParseError> {
        parser.expect_word(|c| &c.from, "Expected FROM after DELETE")?;
        let source = Source::parse(parser)?;
        if let Source::Query { .. } = source {
            return ParseError::new("DELETE requires a table", parser.position, parser).err();
        }

        let criteria = Self::parse_criteria(parser)?;
        Ok(Statement {
            command: Command::Delete,
            distinct: false,
            projection: vec![],
            source,
            joins: vec![],
            criteria,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit: None,
            offset: None,
        })
    }

    fn parse_criteria(parser: &mut QueryParser) -> Result<Option<Expr>, ParseError> {
        match parser.consume_word(|c| &c.r#where) {
            true => Ok(Some(Expr::parse(parser)?)),
            false => Ok(None),
        }
    }

    fn parse_group_by(parser: &mut QueryParser) -> Result<Vec<Column>, ParseError> {
        let mut columns = vec![];
        loop {
            let pivot = parser.position;
            match Expr::parse_operand(parser)? {
                Expr::Column(column) => columns.push(column),
                _ => return ParseError::new("Invalid group by", pivot, parser).err(),
            }
            if !parser.consume_char(',') {
                return Ok(columns);
            }
        }
    }

    fn parse_count(parser: &mut QueryParser, message: &str) -> Result<i64, ParseError> {
        let pivot = parser.position;
        match Expr::parse_operand(parser)? {
            Expr::Literal(Literal::Int(value)) if value >= 0 => Ok(value),
            _ => ParseError::new(message, pivot, parser).err(),
        }
    }
}

impl TryFrom<&str> for Statement {
    type Error = ParseError;

    fn try_from(sql: &str) -> Result<Self, Self::Error> {
        let mut parser = QueryParser::new(sql);
        let statement = Statement::parse(&mut parser)?;

        parser.consume_char(';');
        if !parser.eof() {
            return ParseError::trailing(&parser).err();
        }

        Ok(statement)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join(", ");

        match self.command {
            Command::Delete => write!(f, "DELETE FROM {}", self.source)?,
            Command::Select => {
                write!(f, "SELECT ")?;
                if self.distinct {
                    write!(f, "DISTINCT ")?;
                }
                let items = self.projection.iter().map(|item| item.to_string()).collect();
                write!(f, "{} FROM {}", join(items), self.source)?;
            }
        }

        for item in &self.joins {
            write!(f, " {}", item)?;
        }
        if let Some(criteria) = &self.criteria {
            write!(f, " WHERE {}", criteria)?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", join(self.group_by.iter().map(|c| c.to_string()).collect()))?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", join(self.order_by.iter().map(|o| o.to_string()).collect()))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{Column, Command, JoinKind, SelectItem, Source, Statement};

    #[test]
    pub fn test_full_select() {
        let text = "SELECT DISTINCT p.name, COUNT(*) AS total FROM people p \
            LEFT JOIN cities c ON c.id = p.city_id \
            WHERE p.age > 18 GROUP BY p.name HAVING COUNT(*) > 1 \
            ORDER BY total DESC LIMIT 10 OFFSET 5;";

        let result = Statement::try_from(text).expect("Failed to parse statement");

        assert_eq!(result.command, Command::Select);
        assert!(result.distinct);
        assert_eq!(result.projection.len(), 2);
        assert_eq!(result.source, Source::Table { name: "people".into(), alias: Some("p".into()) });
        assert_eq!(result.joins[0].kind, JoinKind::Left);
        assert_eq!(result.criteria.as_ref().map(|c| c.to_string()), Some("p.age > 18".to_string()));
        assert_eq!(result.group_by, vec![Column::from_path("p.name")]);
        assert_eq!(result.having.as_ref().map(|h| h.to_string()), Some("COUNT(*) > 1".to_string()));
        assert_eq!(result.order_by.len(), 1);
        assert!(!result.order_by[0].ascending);
        assert_eq!(result.limit, Some(10));
        assert_eq!(result.offset, Some(5));
    }

    #[test]
    pub fn test_delete() {
        let result = Statement::try_from("DELETE FROM people WHERE age < 3").expect("Failed to parse statement");

        assert_eq!(result.command, Command::Delete);
        assert!(result.projection.is_empty());
        assert_eq!(result.to_string(), "DELETE FROM people WHERE age < 3");
    }

    #[test]
    pub fn test_select_wildcard() {
        let result = Statement::try_from("select * from people").expect("Failed to parse statement");

        assert_eq!(result.projection, vec![SelectItem::Wildcard]);
        assert_eq!(result.limit, None);
        assert_eq!(result.offset, None);
    }

    #[test]
    pub fn test_trailing_tokens_rejected() {
        let result = Statement::try_from("SELECT a FROM t WHERE a = 1 garbage here");

        match result {
            Ok(_) => panic!(),
            Err(err) => assert_eq!(err.message, "unable to parse complete sql string"),
        }
    }

    #[test]
    pub fn test_text_after_semicolon_rejected() {
        assert!(Statement::try_from("SELECT a FROM t; SELECT b FROM t").is_err());
    }

    #[test]
    pub fn test_negative_limit_rejected() {
        assert!(Statement::try_from("SELECT a FROM t LIMIT -1").is_err());
    }

    #[test]
    pub fn test_display_renders_sql() {
        let text = "SELECT a, SUM(b) AS s FROM t WHERE c LIKE 'x%' GROUP BY a ORDER BY s DESC LIMIT 2";

        let result = Statement::try_from(text).expect("Failed to parse statement");

        assert_eq!(result.to_string(), text);
    }
}
