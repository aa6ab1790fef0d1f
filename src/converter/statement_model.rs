use tracing::debug;

use crate::{
    converter::{
        alias::{AliasResolver, AliasTable},
        ConvertError, ConvertResult,
    },
    parser::ast::{Command, Expr, Join, OrderBy, SelectItem, Source, Statement},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    Table(String),
    Nested(Box<Statement>),
}

/// Normalized view of one statement, with the base alias already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementModel {
    pub command: Command,
    pub select_items: Vec<SelectItem>,
    pub source: ModelSource,
    pub base_alias: Option<String>,
    pub joins: Vec<Join>,
    pub where_expr: Option<Expr>,
    pub having_expr: Option<Expr>,
    pub group_keys: Vec<String>,
    pub explicit_group_by: bool,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub distinct: bool,
    pub is_count_all: bool,
    pub is_total_group: bool,
    pub alias_table: AliasTable,
}

impl StatementModel {
    pub fn from_statement(statement: &Statement) -> ConvertResult<Self> {
        let (source, base_alias) = match &statement.source {
            Source::Table { name, alias } => (ModelSource::Table(name.clone()), alias.clone().or_else(|| Some(name.clone()))),
            Source::Query { statement, alias } => (ModelSource::Nested(statement.clone()), alias.clone()),
        };

        let resolver_alias = base_alias.clone();
        let resolver = AliasResolver::new(resolver_alias.as_deref());

        let select_items: Vec<SelectItem> = statement.projection.iter().map(|item| resolver.strip_select_item(item)).collect();
        Self::validate_select(statement, &select_items)?;

        let alias_table = AliasTable::from_select_items(&select_items);

        let explicit_group_by = !statement.group_by.is_empty();
        let mut group_keys: Vec<String> = statement
            .group_by
            .iter()
            .map(|column| alias_table.field_from_alias_or_field(&resolver.strip_group_key(&column.path())))
            .collect();

        if statement.distinct && !explicit_group_by {
            group_keys = select_items
                .iter()
                .filter_map(|item| item.expr().and_then(Expr::as_column))
                .map(|column| column.path())
                .collect();
        }

        let functions = select_items.iter().filter(|item| matches!(item.expr(), Some(Expr::Function(_)))).count();

        let is_count_all = match select_items.as_slice() {
            [SelectItem::Expr { expr: Expr::Function(function), .. }] => function.is_count_all(),
            _ => false,
        };
        let is_total_group = !explicit_group_by && functions > 0 && functions == select_items.len();

        if !explicit_group_by && !statement.distinct && !is_total_group && functions > 0 {
            return ConvertError::validation(
                "illegal expression(s) found in select clause. Only column names supported",
            )
            .err();
        }

        let joins = statement
            .joins
            .iter()
            .map(|join| Join { kind: join.kind, source: join.source.clone(), on: resolver.strip_expr(&join.on) })
            .collect();

        let model = StatementModel {
            command: statement.command,
            select_items,
            source,
            base_alias,
            joins,
            where_expr: statement.criteria.as_ref().map(|expr| resolver.strip_expr(expr)),
            having_expr: statement.having.as_ref().map(|expr| resolver.strip_expr(expr)),
            group_keys,
            explicit_group_by,
            order_by: statement.order_by.iter().map(|order| resolver.strip_order_by(order)).collect(),
            limit: statement.limit,
            offset: statement.offset,
            distinct: statement.distinct,
            is_count_all,
            is_total_group,
            alias_table,
        };

        debug!(
            group_keys = ?model.group_keys,
            count_all = model.is_count_all,
            total_group = model.is_total_group,
            "statement model built"
        );
        Ok(model)
    }

    fn validate_select(statement: &Statement, items: &[SelectItem]) -> ConvertResult<()> {
        let has_wildcard = items.iter().any(|item| matches!(item, SelectItem::Wildcard));
        if has_wildcard && items.len() > 1 {
            return ConvertError::validation("cannot run SELECT * with other fields").err();
        }
        if has_wildcard && statement.distinct {
            return ConvertError::validation("cannot run SELECT * with DISTINCT").err();
        }
        if has_wildcard && !statement.group_by.is_empty() {
            return ConvertError::validation("cannot run SELECT * with GROUP BY").err();
        }

        for expr in items.iter().filter_map(SelectItem::expr) {
            match expr {
                Expr::Column(_) | Expr::Function(_) => {}
                Expr::Subquery(_) => {
                    return ConvertError::unsupported(format!("subqueries are not supported in the select list: {}", expr)).err();
                }
                other => {
                    return ConvertError::validation(format!(
                        "illegal expression(s) found in select clause. Only column names supported: {}",
                        other
                    ))
                    .err();
                }
            }
        }

        Ok(())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.select_items.as_slice(), [SelectItem::Wildcard])
    }

    /// Column items of the select list, in order.
    pub fn select_columns(&self) -> Vec<(String, Option<&str>)> {
        self.select_items
            .iter()
            .filter_map(|item| match item {
                SelectItem::Expr { expr: Expr::Column(column), alias } => Some((column.path(), alias.as_deref())),
                _ => None,
            })
            .collect()
    }

    pub fn has_grouping(&self) -> bool {
        !self.group_keys.is_empty() || self.is_total_group
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        converter::{statement_model::{ModelSource, StatementModel}, ConvertError},
        parser::ast::Statement,
    };

    fn model(sql: &str) -> StatementModel {
        let statement = Statement::try_from(sql).expect("Failed to parse statement");
        StatementModel::from_statement(&statement).expect("Failed to build model")
    }

    fn model_err(sql: &str) -> ConvertError {
        let statement = Statement::try_from(sql).expect("Failed to parse statement");
        StatementModel::from_statement(&statement).expect_err("model should be rejected")
    }

    #[test]
    pub fn test_strips_base_alias_everywhere() {
        let result = model("SELECT p.name, o.total FROM people p JOIN orders o ON o.pid = p.id WHERE p.age > 1 ORDER BY p.name");

        assert_eq!(result.source, ModelSource::Table("people".into()));
        assert_eq!(result.base_alias.as_deref(), Some("p"));
        assert_eq!(result.select_columns(), vec![("name".to_string(), None), ("o.total".to_string(), None)]);
        assert_eq!(result.joins[0].on.to_string(), "o.pid = id");
        assert_eq!(result.where_expr.map(|e| e.to_string()), Some("age > 1".to_string()));
        assert_eq!(result.order_by[0].expr.to_string(), "name");
    }

    #[test]
    pub fn test_table_name_is_base_alias() {
        let result = model("SELECT people.name FROM people");

        assert_eq!(result.select_columns(), vec![("name".to_string(), None)]);
    }

    #[test]
    pub fn test_count_all_and_total_group() {
        let result = model("SELECT COUNT(*) FROM t");
        assert!(result.is_count_all);
        assert!(result.is_total_group);

        let result = model("SELECT SUM(a), MAX(b) FROM t");
        assert!(!result.is_count_all);
        assert!(result.is_total_group);

        let result = model("SELECT a FROM t");
        assert!(!result.is_total_group);
        assert!(!result.has_grouping());
    }

    #[test]
    pub fn test_group_keys_resolve_aliases() {
        let result = model("SELECT t.a AS x, COUNT(*) FROM t GROUP BY x, t.b");

        assert_eq!(result.group_keys, vec!["a", "b"]);
        assert!(result.explicit_group_by);
        assert!(!result.is_total_group);
    }

    #[test]
    pub fn test_distinct_synthesizes_group_key() {
        let result = model("SELECT DISTINCT a FROM t");

        assert_eq!(result.group_keys, vec!["a"]);
        assert!(!result.explicit_group_by);
    }

    #[test]
    pub fn test_distinct_with_aggregate_groups_columns() {
        let result = model("SELECT DISTINCT a, COUNT(*) FROM t");

        assert_eq!(result.group_keys, vec!["a"]);
        assert!(!result.is_total_group);
        assert!(result.has_grouping());
    }

    #[test]
    pub fn test_validation_errors() {
        assert!(matches!(model_err("SELECT *, a FROM t"), ConvertError::Validation(_)));
        assert!(matches!(model_err("SELECT DISTINCT * FROM t"), ConvertError::Validation(_)));
        assert!(matches!(model_err("SELECT a, COUNT(*) FROM t"), ConvertError::Validation(_)));
        assert!(matches!(model_err("SELECT a = 1 FROM t"), ConvertError::Validation(_)));
        assert!(matches!(model_err("SELECT (SELECT b FROM u) FROM t"), ConvertError::Unsupported(_)));
    }

    #[test]
    pub fn test_nested_source() {
        let result = model("SELECT a FROM (SELECT a, b FROM t WHERE b > 1) sub");

        assert!(matches!(result.source, ModelSource::Nested(_)));
        assert_eq!(result.base_alias.as_deref(), Some("sub"));
    }
}
