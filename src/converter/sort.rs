use serde_json::Value;

use crate::{
    converter::{
        aggregation::{accumulator_name, Grouping},
        alias::AliasTarget,
        document::{field_reference, object, safe_key},
        statement_model::StatementModel,
        ConvertError, ConvertResult, Document,
    },
    parser::ast::{Expr, OrderBy},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortPlan {
    pub sort: Document,
    /// Applied before `$group` for keys that are neither selected nor grouped.
    pub pre_group_sort: Document,
    /// `$first` accumulators carrying those keys through the group.
    pub first_accumulators: Document,
}

fn direction(order: &OrderBy) -> Value {
    Value::from(if order.ascending { 1 } else { -1 })
}

pub struct SortCompiler<'a> {
    model: &'a StatementModel,
    grouping: Option<&'a Grouping>,
}

impl<'a> SortCompiler<'a> {
    pub fn new(model: &'a StatementModel, grouping: Option<&'a Grouping>) -> Self {
        Self { model, grouping }
    }

    pub fn compile(&self) -> ConvertResult<SortPlan> {
        let mut plan = SortPlan::default();
        for order in &self.model.order_by {
            match self.grouping {
                Some(grouping) => self.grouped_key(grouping, order, &mut plan)?,
                None => {
                    let key = self.plain_key(order)?;
                    plan.sort.insert(key, direction(order));
                }
            }
        }
        Ok(plan)
    }

    fn plain_key(&self, order: &OrderBy) -> ConvertResult<String> {
        match &order.expr {
            Expr::Column(column) => Ok(self.model.alias_table.field_from_alias_or_field(&column.path())),
            Expr::Function(function) => {
                ConvertError::unsupported(format!("cannot sort by aggregate {} without grouping", function)).err()
            }
            other => ConvertError::unsupported(format!("unsupported ORDER BY expression: {}", other)).err(),
        }
    }

    fn grouped_key(&self, grouping: &Grouping, order: &OrderBy, plan: &mut SortPlan) -> ConvertResult<()> {
        let alias_table = &self.model.alias_table;
        match &order.expr {
            Expr::Column(column) => {
                let path = column.path();
                if let Some(AliasTarget::Aggregate(_)) = alias_table.resolve(&path) {
                    plan.sort.insert(path, direction(order));
                    return Ok(());
                }

                let field = alias_table.field_from_alias_or_field(&path);
                match grouping.id_reference(&field) {
                    Some(reference) => {
                        plan.sort.insert(reference, direction(order));
                    }
                    None => {
                        let key = safe_key(&field);
                        plan.first_accumulators.insert(key.clone(), object("$first", field_reference(&field)));
                        plan.pre_group_sort.insert(field, direction(order));
                        plan.sort.insert(key, direction(order));
                    }
                }
                Ok(())
            }
            Expr::Function(function) => {
                let name = accumulator_name(function, alias_table.alias_for_aggregate(&function.to_string()));
                if !grouping.accumulators.contains_key(&name) {
                    return ConvertError::validation(format!("ORDER BY aggregate {} must also be selected", function)).err();
                }
                plan.sort.insert(name, direction(order));
                Ok(())
            }
            other => ConvertError::unsupported(format!("unsupported ORDER BY expression: {}", other)).err(),
        }
    }
}
