use std::fmt;

use crate::parser::{
    ast::{Column, ComparatorOp, Function, Literal, Statement, TextCollector},
    ParseError, QueryComparers, QueryParser,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Column(Column),
    Function(Function),
    Wildcard,
    Compare { left: Box<Expr>, op: ComparatorOp, right: Box<Expr> },
    Like { expr: Box<Expr>, pattern: Box<Expr>, negated: bool },
    IsNull { expr: Box<Expr>, negated: bool },
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    And { left: Box<Expr>, right: Box<Expr> },
    Or { left: Box<Expr>, right: Box<Expr> },
    Parenthesis { expr: Box<Expr>, negated: bool },
    Not(Box<Expr>),
    Subquery(Box<Statement>),
}

impl Expr {
    pub fn parse(parser: &mut QueryParser) -> Result<Expr, ParseError> {
        Self::parse_or(parser)
    }

    fn parse_or(parser: &mut QueryParser) -> Result<Expr, ParseError> {
        let mut left = Self::parse_and(parser)?;
        while parser.consume_word(|c| &c.or) {
            let right = Self::parse_and(parser)?;
            left = Expr::Or { left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(parser: &mut QueryParser) -> Result<Expr, ParseError> {
        let mut left = Self::parse_not(parser)?;
        while parser.consume_word(|c| &c.and) {
            let right = Self::parse_not(parser)?;
            left = Expr::And { left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_not(parser: &mut QueryParser) -> Result<Expr, ParseError> {
        if !parser.consume_word(|c| &c.not) {
            return Self::parse_predicate(parser);
        }

        match Self::parse_not(parser)? {
            Expr::Parenthesis { expr, negated: false } => Ok(Expr::Parenthesis { expr, negated: true }),
            inner => Ok(Expr::Not(Box::new(inner))),
        }
    }

    fn parse_predicate(parser: &mut QueryParser) -> Result<Expr, ParseError> {
        let left = Self::parse_operand(parser)?;

        if let Some(op) = ComparatorOp::check(parser) {
            let right = Self::parse_operand(parser)?;
            return Ok(Expr::Compare { left: Box::new(left), op, right: Box::new(right) });
        }

        if parser.consume_word(|c| &c.is) {
            let negated = parser.consume_word(|c| &c.not);
            parser.expect_word(|c| &c.null, "Expected NULL")?;
            return Ok(Expr::IsNull { expr: Box::new(left), negated });
        }

        let pivot = parser.position;
        let negated = parser.consume_word(|c| &c.not);

        if parser.consume_word(|c| &c.like) {
            let pattern = Self::parse_operand(parser)?;
            return Ok(Expr::Like { expr: Box::new(left), pattern: Box::new(pattern), negated });
        }

        if parser.consume_word(|c| &c.r#in) {
            let list = Self::parse_list(parser)?;
            return Ok(Expr::InList { expr: Box::new(left), list, negated });
        }

        if negated {
            return ParseError::new("Expected LIKE or IN after NOT", pivot, parser).err();
        }

        Ok(left)
    }

    fn parse_list(parser: &mut QueryParser) -> Result<Vec<Expr>, ParseError> {
        parser.expect_char('(', "Expected '(' to open the list")?;
        if parser.is_word(|c| &c.select) {
            let statement = Statement::parse(parser)?;
            parser.expect_char(')', "Expected ')' to close the subquery")?;
            return Ok(vec![Expr::Subquery(Box::new(statement))]);
        }

        let mut list = vec![];
        loop {
            list.push(Self::parse_operand(parser)?);
            if parser.consume_char(',') {
                continue;
            }
            parser.expect_char(')', "Expected ')' to close the list")?;
            return Ok(list);
        }
    }

    pub fn parse_operand(parser: &mut QueryParser) -> Result<Expr, ParseError> {
        let pivot = parser.position;
        let current = parser.current();

        let expr = if current == '(' {
            parser.next();
            parser.next_non_whitespace();
            if parser.is_word(|c| &c.select) {
                let statement = Statement::parse(parser)?;
                parser.expect_char(')', "Expected ')' to close the subquery")?;
                return Ok(Expr::Subquery(Box::new(statement)));
            }
            let inner = Self::parse_or(parser)?;
            parser.expect_char(')', "Expected ')'")?;
            return Ok(Expr::Parenthesis { expr: Box::new(inner), negated: false });
        } else if Literal::is_string_start(current) {
            Expr::Literal(Literal::parse_string(parser)?)
        } else if Literal::is_number_start(parser) {
            Expr::Literal(Literal::parse_number(parser)?)
        } else if current == '*' {
            parser.next();
            Expr::Wildcard
        } else if parser.consume_word(|c| &c.b_true) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        } else if parser.consume_word(|c| &c.b_false) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        } else if parser.consume_word(|c| &c.null) {
            return Ok(Expr::Literal(Literal::Null));
        } else if TextCollector::is_identifier_start(current) {
            let segments = TextCollector::collect_path(parser)?;
            if parser.current() == '(' {
                Expr::Function(Function::parse_args(segments.join("."), parser)?)
            } else if segments.len() == 1 && QueryComparers::is_reserved(&segments[0]) {
                return ParseError::new("Invalid expression", pivot, parser).err();
            } else {
                Expr::Column(Column::from_segments(segments))
            }
        } else {
            return ParseError::new("Invalid expression", pivot, parser).err();
        };

        parser.next_non_whitespace();
        Ok(expr)
    }

    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Expr::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Expr::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn is_boolean_connective(&self) -> bool {
        matches!(self, Expr::And { .. } | Expr::Or { .. })
    }

    /// Visits every column in the tree, subqueries excluded.
    pub fn any_column(&self, check: &dyn Fn(&Column) -> bool) -> bool {
        match self {
            Expr::Column(column) => check(column),
            Expr::Literal(_) | Expr::Wildcard | Expr::Subquery(_) => false,
            Expr::Function(function) => function.args.iter().any(|arg| arg.any_column(check)),
            Expr::Compare { left, right, .. } | Expr::And { left, right } | Expr::Or { left, right } => {
                left.any_column(check) || right.any_column(check)
            }
            Expr::Like { expr, pattern, .. } => expr.any_column(check) || pattern.any_column(check),
            Expr::IsNull { expr, .. } | Expr::Parenthesis { expr, .. } | Expr::Not(expr) => expr.any_column(check),
            Expr::InList { expr, list, .. } => {
                expr.any_column(check) || list.iter().any(|item| item.any_column(check))
            }
        }
    }

    pub fn contains_or(&self) -> bool {
        match self {
            Expr::Or { .. } => true,
            Expr::And { left, right } | Expr::Compare { left, right, .. } => left.contains_or() || right.contains_or(),
            Expr::Parenthesis { expr, .. } | Expr::Not(expr) | Expr::IsNull { expr, .. } => expr.contains_or(),
            Expr::Like { expr, pattern, .. } => expr.contains_or() || pattern.contains_or(),
            Expr::InList { expr, list, .. } => expr.contains_or() || list.iter().any(Expr::contains_or),
            Expr::Function(function) => function.args.iter().any(Expr::contains_or),
            Expr::Literal(_) | Expr::Column(_) | Expr::Wildcard | Expr::Subquery(_) => false,
        }
    }

    /// Rebuilds the tree, replacing every column with the result of `map`.
    pub fn map_columns(&self, map: &dyn Fn(&Column) -> Expr) -> Expr {
        self.transform(&|expr: &Expr| expr.as_column().map(map))
    }

    /// Rebuilds the tree top down; a node for which `replace` returns a value is not descended.
    pub fn transform(&self, replace: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
        if let Some(replacement) = replace(self) {
            return replacement;
        }

        let boxed = |expr: &Expr| Box::new(expr.transform(replace));
        match self {
            Expr::Literal(_) | Expr::Column(_) | Expr::Wildcard | Expr::Subquery(_) => self.clone(),
            Expr::Function(function) => Expr::Function(Function {
                name: function.name.clone(),
                args: function.args.iter().map(|arg| arg.transform(replace)).collect(),
            }),
            Expr::Compare { left, op, right } => Expr::Compare { left: boxed(left), op: *op, right: boxed(right) },
            Expr::Like { expr, pattern, negated } => Expr::Like { expr: boxed(expr), pattern: boxed(pattern), negated: *negated },
            Expr::IsNull { expr, negated } => Expr::IsNull { expr: boxed(expr), negated: *negated },
            Expr::InList { expr, list, negated } => Expr::InList {
                expr: boxed(expr),
                list: list.iter().map(|item| item.transform(replace)).collect(),
                negated: *negated,
            },
            Expr::And { left, right } => Expr::And { left: boxed(left), right: boxed(right) },
            Expr::Or { left, right } => Expr::Or { left: boxed(left), right: boxed(right) },
            Expr::Parenthesis { expr, negated } => Expr::Parenthesis { expr: boxed(expr), negated: *negated },
            Expr::Not(expr) => Expr::Not(boxed(expr)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: &bool| if *negated { "NOT " } else { "" };
        match self {
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Column(column) => write!(f, "{}", column),
            Expr::Function(function) => write!(f, "{}", function),
            Expr::Wildcard => write!(f, "*"),
            Expr::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Like { expr, pattern, negated } => write!(f, "{} {}LIKE {}", expr, not(negated), pattern),
            Expr::IsNull { expr, negated } => write!(f, "{} IS {}NULL", expr, not(negated)),
            Expr::InList { expr, list, negated } => {
                let items: Vec<String> = list.iter().map(|item| item.to_string()).collect();
                write!(f, "{} {}IN ({})", expr, not(negated), items.join(", "))
            }
            Expr::And { left, right } => write!(f, "{} AND {}", left, right),
            Expr::Or { left, right } => write!(f, "{} OR {}", left, right),
            Expr::Parenthesis { expr, negated } => write!(f, "{}({})", not(negated), expr),
            Expr::Not(expr) => write!(f, "NOT {}", expr),
            Expr::Subquery(statement) => write!(f, "({})", statement),
        }
    }
}
