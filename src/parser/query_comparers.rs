use crate::parser::WordComparer;

#[derive(Debug)]
pub struct QueryComparers {
    pub select: WordComparer,
    pub distinct: WordComparer,
    pub delete: WordComparer,
    pub alias: WordComparer,
    pub from: WordComparer,
    pub join: WordComparer,
    pub inner: WordComparer,
    pub left: WordComparer,
    pub right: WordComparer,
    pub full: WordComparer,
    pub outer: WordComparer,
    pub on: WordComparer,
    pub r#where: WordComparer,
    pub group: WordComparer,
    pub by: WordComparer,
    pub having: WordComparer,
    pub order: WordComparer,
    pub asc: WordComparer,
    pub desc: WordComparer,
    pub limit: WordComparer,
    pub offset: WordComparer,
    pub and: WordComparer,
    pub or: WordComparer,
    pub not: WordComparer,
    pub like: WordComparer,
    pub is: WordComparer,
    pub r#in: WordComparer,
    pub b_true: WordComparer,
    pub b_false: WordComparer,
    pub null: WordComparer,
}

impl Default for QueryComparers {
    fn default() -> Self {
        Self::new()
    }
}

const RESERVED: [&str; 30] = [
    "SELECT", "DISTINCT", "DELETE", "AS", "FROM", "JOIN", "INNER", "LEFT", "RIGHT", "FULL",
    "OUTER", "ON", "WHERE", "GROUP", "BY", "HAVING", "ORDER", "ASC", "DESC", "LIMIT",
    "OFFSET", "AND", "OR", "NOT", "LIKE", "IS", "IN", "TRUE", "FALSE", "NULL",
];

impl QueryComparers {
    pub fn new() -> Self {
        let keyword = |word: &str| WordComparer::new(word).with_any_delimiter_postfix().with_eof();
        Self {
            select: keyword("SELECT"),
            distinct: keyword("DISTINCT"),
            delete: keyword("DELETE"),
            alias: keyword("AS"),
            from: keyword("FROM"),
            join: keyword("JOIN"),
            inner: keyword("INNER"),
            left: keyword("LEFT"),
            right: keyword("RIGHT"),
            full: keyword("FULL"),
            outer: keyword("OUTER"),
            on: keyword("ON"),
            r#where: keyword("WHERE"),
            group: keyword("GROUP"),
            by: keyword("BY"),
            having: keyword("HAVING"),
            order: keyword("ORDER"),
            asc: keyword("ASC"),
            desc: keyword("DESC"),
            limit: keyword("LIMIT"),
            offset: keyword("OFFSET"),
            and: keyword("AND"),
            or: keyword("OR"),
            not: keyword("NOT"),
            like: keyword("LIKE"),
            is: keyword("IS"),
            r#in: keyword("IN"),
            b_true: keyword("TRUE"),
            b_false: keyword("FALSE"),
            null: keyword("NULL"),
        }
    }

    /// Words that can never be read as an implicit alias.
    pub fn is_reserved(word: &str) -> bool {
        RESERVED.iter().any(|reserved| reserved.eq_ignore_ascii_case(word))
    }
}
