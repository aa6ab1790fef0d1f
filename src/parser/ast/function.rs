use std::fmt;

use crate::parser::{ast::{Column, Expr}, ParseError, QueryParser};

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expr>,
}

impl Function {
    /// Parses the argument list; the cursor must be on the opening parenthesis.
    pub fn parse_args(name: String, parser: &mut QueryParser) -> Result<Function, ParseError> {
        parser.expect_char('(', "Expected '('")?;

        let mut args = vec![];
        if parser.consume_char(')') {
            return Ok(Function { name, args });
        }

        loop {
            args.push(Expr::parse(parser)?);
            if parser.consume_char(',') {
                continue;
            }
            parser.expect_char(')', "Invalid function arguments")?;
            break;
        }

        Ok(Function { name, args })
    }

    pub fn lower_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Columns referenced directly by the arguments.
    pub fn column_args(&self) -> Vec<&Column> {
        self.args.iter().filter_map(Expr::as_column).collect()
    }

    pub fn is_count_all(&self) -> bool {
        self.lower_name() == "count"
            && (self.args.is_empty() || matches!(self.args.as_slice(), [Expr::Wildcard]))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|arg| arg.to_string()).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}
