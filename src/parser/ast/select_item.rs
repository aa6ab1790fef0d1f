use std::fmt;

use crate::parser::{ast::{Expr, TextCollector}, ParseError, QueryParser};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Expr { expr: Expr, alias: Option<String> },
}

impl SelectItem {
    pub fn parse_single(parser: &mut QueryParser) -> Result<Self, ParseError> {
        if parser.current() == '*' {
            parser.next();
            parser.next_non_whitespace();
            return Ok(SelectItem::Wildcard);
        }

        let expr = Expr::parse(parser)?;
        let alias = TextCollector::collect_alias(parser)?;
        Ok(SelectItem::Expr { expr, alias })
    }

    pub fn parse(parser: &mut QueryParser) -> Result<Vec<Self>, ParseError> {
        let mut items = vec![Self::parse_single(parser)?];
        while parser.consume_char(',') {
            items.push(Self::parse_single(parser)?);
        }
        Ok(items)
    }

    pub fn expr(&self) -> Option<&Expr> {
        match self {
            SelectItem::Wildcard => None,
            SelectItem::Expr { expr, .. } => Some(expr),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            SelectItem::Wildcard => None,
            SelectItem::Expr { alias, .. } => alias.as_deref(),
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Wildcard => write!(f, "*"),
            SelectItem::Expr { expr, alias: Some(alias) } => write!(f, "{} AS {}", expr, alias),
            SelectItem::Expr { expr, alias: None } => write!(f, "{}", expr),
        }
    }
}
