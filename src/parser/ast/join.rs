use std::fmt;

use crate::parser::{ast::{Expr, Source}, ParseError, QueryParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "INNER JOIN"),
            JoinKind::Left => write!(f, "LEFT JOIN"),
            JoinKind::Right => write!(f, "RIGHT JOIN"),
            JoinKind::Full => write!(f, "FULL JOIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub source: Source,
    pub on: Expr,
}

impl Join {
    /// Reads the join kind, `None` when the cursor is not on a join.
    fn parse_kind(parser: &mut QueryParser) -> Result<Option<JoinKind>, ParseError> {
        if parser.consume_word(|c| &c.join) {
            return Ok(Some(JoinKind::Inner));
        }

        let kind = if parser.consume_word(|c| &c.inner) {
            JoinKind::Inner
        } else if parser.consume_word(|c| &c.left) {
            JoinKind::Left
        } else if parser.consume_word(|c| &c.right) {
            JoinKind::Right
        } else if parser.consume_word(|c| &c.full) {
            JoinKind::Full
        } else {
            return Ok(None);
        };

        if kind != JoinKind::Inner {
            parser.consume_word(|c| &c.outer);
        }
        parser.expect_word(|c| &c.join, "Expected JOIN")?;
        Ok(Some(kind))
    }

    pub fn parse(parser: &mut QueryParser) -> Result<Vec<Join>, ParseError> {
        let mut joins = vec![];
        while let Some(kind) = Self::parse_kind(parser)? {
            let source = Source::parse(parser)?;
            parser.expect_word(|c| &c.on, "Expected ON after the joined table")?;
            let on = Expr::parse(parser)?;
            joins.push(Join { kind, source, on });
        }
        Ok(joins)
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ON {}", self.kind, self.source, self.on)
    }
}
