use std::fmt;

use crate::parser::QueryParser;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for ComparatorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparatorOp::Eq => write!(f, "="),
            ComparatorOp::NotEq => write!(f, "<>"),
            ComparatorOp::Lt => write!(f, "<"),
            ComparatorOp::LtEq => write!(f, "<="),
            ComparatorOp::Gt => write!(f, ">"),
            ComparatorOp::GtEq => write!(f, ">="),
        }
    }
}

impl fmt::Debug for ComparatorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComparatorOp({})", self)
    }
}

impl ComparatorOp {
    /// Consumes a comparison operator at the cursor. Two character operators are tried first.
    pub fn check(parser: &mut QueryParser) -> Option<ComparatorOp> {
        let pair = (parser.current(), parser.peek(1));
        let (op, length) = match pair {
            ('<', '>') | ('!', '=') => (ComparatorOp::NotEq, 2),
            ('<', '=') => (ComparatorOp::LtEq, 2),
            ('>', '=') => (ComparatorOp::GtEq, 2),
            ('=', _) => (ComparatorOp::Eq, 1),
            ('<', _) => (ComparatorOp::Lt, 1),
            ('>', _) => (ComparatorOp::Gt, 1),
            _ => return None,
        };

        parser.jump(length);
        parser.next_non_whitespace();
        Some(op)
    }

    pub fn mongo_operator(&self) -> &'static str {
        match self {
            ComparatorOp::Eq => "$eq",
            ComparatorOp::NotEq => "$ne",
            ComparatorOp::Lt => "$lt",
            ComparatorOp::LtEq => "$lte",
            ComparatorOp::Gt => "$gt",
            ComparatorOp::GtEq => "$gte",
        }
    }

    /// Operator to use once both operands swap sides.
    pub fn mirror(&self) -> ComparatorOp {
        match self {
            ComparatorOp::Lt => ComparatorOp::Gt,
            ComparatorOp::LtEq => ComparatorOp::GtEq,
            ComparatorOp::Gt => ComparatorOp::Lt,
            ComparatorOp::GtEq => ComparatorOp::LtEq,
            other => *other,
        }
    }
}
