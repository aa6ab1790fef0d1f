use std::fmt;

use crate::parser::{ast::Expr, ParseError, QueryParser};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub ascending: bool,
}

impl OrderBy {
    pub fn parse_single(parser: &mut QueryParser) -> Result<Self, ParseError> {
        let expr = Expr::parse_operand(parser)?;

        if parser.consume_word(|c| &c.desc) {
            return Ok(OrderBy { expr, ascending: false });
        }

        parser.consume_word(|c| &c.asc);
        Ok(OrderBy { expr, ascending: true })
    }

    /// Parses the list that follows `ORDER BY`.
    pub fn parse(parser: &mut QueryParser) -> Result<Vec<Self>, ParseError> {
        let mut orders = vec![Self::parse_single(parser)?];
        while parser.consume_char(',') {
            orders.push(Self::parse_single(parser)?);
        }
        Ok(orders)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, if self.ascending { "ASC" } else { "DESC" })
    }
}
