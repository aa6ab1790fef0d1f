use indexmap::IndexMap;

use crate::parser::ast::{Column, Expr, OrderBy, SelectItem};

/// Removes the base table alias from field references.
#[derive(Debug, Clone, Copy)]
pub struct AliasResolver<'a> {
    base_alias: Option<&'a str>,
}

impl<'a> AliasResolver<'a> {
    pub fn new(base_alias: Option<&'a str>) -> Self {
        Self { base_alias }
    }

    pub fn strip_column(&self, column: &Column) -> Column {
        match (column, self.base_alias) {
            (Column::WithCollection { collection, name }, Some(base)) if collection == base => {
                Column::Name { name: name.clone() }
            }
            _ => column.clone(),
        }
    }

    pub fn strip_expr(&self, expr: &Expr) -> Expr {
        expr.map_columns(&|column: &Column| Expr::Column(self.strip_column(column)))
    }

    pub fn strip_group_key(&self, key: &str) -> String {
        match self.base_alias.and_then(|base| key.strip_prefix(base)).and_then(|rest| rest.strip_prefix('.')) {
            Some(rest) => rest.to_string(),
            None => key.to_string(),
        }
    }

    pub fn strip_select_item(&self, item: &SelectItem) -> SelectItem {
        match item {
            SelectItem::Wildcard => SelectItem::Wildcard,
            SelectItem::Expr { expr, alias } => SelectItem::Expr { expr: self.strip_expr(expr), alias: alias.clone() },
        }
    }

    pub fn strip_order_by(&self, order: &OrderBy) -> OrderBy {
        OrderBy { expr: self.strip_expr(&order.expr), ascending: order.ascending }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    Field(String),
    Aggregate(String),
}

/// Projection alias to the field path or aggregate signature it names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    entries: IndexMap<String, AliasTarget>,
}

impl AliasTable {
    pub fn from_select_items(items: &[SelectItem]) -> Self {
        let mut entries = IndexMap::new();
        for item in items {
            let SelectItem::Expr { expr, alias: Some(alias) } = item else {
                continue;
            };
            match expr {
                Expr::Column(column) => {
                    entries.insert(alias.clone(), AliasTarget::Field(column.path()));
                }
                Expr::Function(function) => {
                    entries.insert(alias.clone(), AliasTarget::Aggregate(function.to_string()));
                }
                _ => {}
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, alias: &str) -> Option<&AliasTarget> {
        self.entries.get(alias)
    }

    /// Field behind `name` when it is a field alias, otherwise `name` itself.
    pub fn field_from_alias_or_field(&self, name: &str) -> String {
        match self.entries.get(name) {
            Some(AliasTarget::Field(path)) => path.clone(),
            _ => name.to_string(),
        }
    }

    pub fn alias_for_aggregate(&self, signature: &str) -> Option<&str> {
        self.entries.iter().find_map(|(alias, target)| match target {
            AliasTarget::Aggregate(aggregate) if aggregate.eq_ignore_ascii_case(signature) => Some(alias.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        converter::alias::{AliasResolver, AliasTable, AliasTarget},
        parser::{ast::{Expr, SelectItem}, QueryParser},
    };

    fn parse(text: &str) -> Expr {
        let mut parser = QueryParser::new(text);
        Expr::parse(&mut parser).expect("Failed to parse expression")
    }

    #[test]
    pub fn test_strip_base_alias_only() {
        let resolver = AliasResolver::new(Some("p"));

        let result = resolver.strip_expr(&parse("p.age > 3 AND o.total = p.spent AND p.address.city = 'x'"));

        assert_eq!(result.to_string(), "age > 3 AND o.total = spent AND address.city = 'x'");
    }

    #[test]
    pub fn test_strip_is_idempotent() {
        let resolver = AliasResolver::new(Some("p"));
        let original = parse("p.p.name = 'a' OR p.age IN (1, 2) OR count(p.x) > 1");

        let once = resolver.strip_expr(&original);
        let twice = resolver.strip_expr(&once);

        assert_eq!(once, twice);
        assert_eq!(once.to_string(), "p.name = 'a' OR age IN (1, 2) OR count(x) > 1");
    }

    #[test]
    pub fn test_strip_without_alias() {
        let resolver = AliasResolver::new(None);
        let original = parse("t.a = 1");

        assert_eq!(resolver.strip_expr(&original), original);
        assert_eq!(resolver.strip_group_key("t.a"), "t.a");
    }

    #[test]
    pub fn test_strip_group_key() {
        let resolver = AliasResolver::new(Some("t"));

        assert_eq!(resolver.strip_group_key("t.a"), "a");
        assert_eq!(resolver.strip_group_key("tt.a"), "tt.a");
        assert_eq!(resolver.strip_group_key("a"), "a");
    }

    #[test]
    pub fn test_alias_table() {
        let mut parser = QueryParser::new("a AS x, b, SUM(c) AS total");
        let items = SelectItem::parse(&mut parser).expect("Failed to parse items");

        let table = AliasTable::from_select_items(&items);

        assert_eq!(table.resolve("x"), Some(&AliasTarget::Field("a".into())));
        assert_eq!(table.resolve("total"), Some(&AliasTarget::Aggregate("SUM(c)".into())));
        assert_eq!(table.field_from_alias_or_field("x"), "a");
        assert_eq!(table.field_from_alias_or_field("total"), "total");
        assert_eq!(table.field_from_alias_or_field("b"), "b");
        assert_eq!(table.alias_for_aggregate("sum(c)"), Some("total"));
    }
}
