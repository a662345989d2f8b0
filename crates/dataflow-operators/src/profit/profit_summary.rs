//! `profit_summary`: outer-joins income/cost/expense tables on
//! `(年, 月, 办公室)` and derives the four summary rows.
//!
//! Each of the three upstream tables is resolved by its configured
//! `income_node_id`/`cost_node_id`/`expense_node_id`, falling back to the
//! next unclaimed input in edge-encounter (connection) order when the
//! corresponding config key is absent. A node with fewer than three
//! resolved upstreams treats the missing ones as absent rather than
//! erroring, as long as at least one is present.

use dataflow_engine::constants::{
    PROFIT_COST_TOTAL, PROFIT_EXPENSE_TOTAL, PROFIT_GROUP_MONTH, PROFIT_GROUP_OFFICE, PROFIT_GROUP_YEAR,
    PROFIT_INCOME_TOTAL, PROFIT_PROFIT_TOTAL,
};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{Column, FillStrategy, JoinHow, Table, Value};
use serde_json::Value as Json;

const INCOME_COLS: &[&str] = &["计业绩产品收入", "不计业绩产品收入", "计业绩团品收入", "不计业绩团品收入"];
const COST_COLS: &[&str] = &["计业绩产品成本", "不计业绩产品成本", "计业绩团品成本", "不计业绩团品成本"];
const EXPENSE_COLS: &[&str] = &[
    "一线工资",
    "红包",
    "任务款",
    "门店房租",
    "门店水、电、液化气",
    "门店物业费",
    "其他分摊",
    "其他费用",
];

pub fn run(inputs: Vec<Table>, config: &Json, ctx: &mut OperatorContext) -> Result<Table> {
    let mut positional = inputs.into_iter();
    let mut resolve = |key: &str| -> Option<Table> {
        match crate::config::opt_str(config, key) {
            Some(node_id) => ctx.get(node_id).cloned(),
            None => positional.next(),
        }
    };
    let income = resolve("income_node_id");
    let cost = resolve("cost_node_id");
    let expense = resolve("expense_node_id");

    let key_cols = [PROFIT_GROUP_YEAR.to_string(), PROFIT_GROUP_MONTH.to_string(), PROFIT_GROUP_OFFICE.to_string()];

    let ensure_keys = |table: &Table, label: &str| -> Result<()> {
        for k in &key_cols {
            if !table.has_column(k) {
                return Err(DataflowError::column_missing(k, &table.column_names()).with_node(label));
            }
        }
        Ok(())
    };

    let mut merged: Option<Table> = None;
    for (table, label) in [(&income, "收入"), (&cost, "成本"), (&expense, "费用")] {
        let Some(table) = table else { continue };
        ensure_keys(table, label)?;
        merged = Some(match merged {
            None => table.clone(),
            Some(acc) => acc.merge(table, &key_cols, &key_cols, JoinHow::Outer)?,
        });
    }
    let merged = merged.ok_or_else(|| DataflowError::arity(1, 0))?;

    let all_amount_cols: Vec<String> = INCOME_COLS.iter().chain(COST_COLS).chain(EXPENSE_COLS).map(|s| s.to_string()).collect();
    let present: Vec<String> = all_amount_cols.iter().filter(|c| merged.has_column(c)).cloned().collect();
    let mut merged = merged.fill_na(Some(&present), FillStrategy::FillValue(Value::Real(0.0)))?;

    for col in &all_amount_cols {
        if !merged.has_column(col) {
            merged.push_column(Column::new(col.clone(), vec![Value::Real(0.0); merged.num_rows()]));
        }
    }

    let sum_row = |table: &Table, row: usize, cols: &[&str]| -> f64 {
        cols.iter()
            .map(|c| table.get(row, c).and_then(|v| v.as_f64()).unwrap_or(0.0))
            .sum()
    };

    let mut income_total = Vec::with_capacity(merged.num_rows());
    let mut cost_total = Vec::with_capacity(merged.num_rows());
    let mut expense_total = Vec::with_capacity(merged.num_rows());
    let mut profit_total = Vec::with_capacity(merged.num_rows());
    for r in 0..merged.num_rows() {
        let i = sum_row(&merged, r, INCOME_COLS);
        let c = sum_row(&merged, r, COST_COLS);
        let e = sum_row(&merged, r, EXPENSE_COLS);
        income_total.push(Value::Real(i));
        cost_total.push(Value::Real(c));
        expense_total.push(Value::Real(e));
        profit_total.push(Value::Real(i - c - e));
    }
    merged.push_column(Column::new(PROFIT_INCOME_TOTAL, income_total));
    merged.push_column(Column::new(PROFIT_COST_TOTAL, cost_total));
    merged.push_column(Column::new(PROFIT_EXPENSE_TOTAL, expense_total));
    merged.push_column(Column::new(PROFIT_PROFIT_TOTAL, profit_total));

    let year_idx = merged.column_index(PROFIT_GROUP_YEAR).expect("key column");
    let month_idx = merged.column_index(PROFIT_GROUP_MONTH).expect("key column");
    let office_idx = merged.column_index(PROFIT_GROUP_OFFICE).expect("key column");
    let sorted = merged.sort_rows_by(|a, b| {
        a[year_idx]
            .partial_cmp_value(&b[year_idx])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a[month_idx].partial_cmp_value(&b[month_idx]).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a[office_idx].partial_cmp_value(&b[office_idx]).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut ordered_names = key_cols.to_vec();
    ordered_names.extend(all_amount_cols.iter().cloned());
    ordered_names.extend([
        PROFIT_INCOME_TOTAL.to_string(),
        PROFIT_COST_TOTAL.to_string(),
        PROFIT_EXPENSE_TOTAL.to_string(),
        PROFIT_PROFIT_TOTAL.to_string(),
    ]);
    let extra: Vec<String> = sorted.column_names().into_iter().filter(|c| !ordered_names.contains(c)).collect();
    ordered_names.extend(extra);

    sorted.select(&ordered_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use std::collections::HashMap;

    fn keyed(year: i64, month: i64, office: &str, col: &str, v: f64) -> Table {
        Table::from_columns(vec![
            Column::new(PROFIT_GROUP_YEAR, vec![Value::Integer(year)]),
            Column::new(PROFIT_GROUP_MONTH, vec![Value::Integer(month)]),
            Column::new(PROFIT_GROUP_OFFICE, vec![Value::Text(office.to_string())]),
            Column::new(col, vec![Value::Real(v)]),
        ])
    }

    #[test]
    fn profit_equals_income_minus_cost_minus_expense() {
        let income = keyed(2026, 7, "A", "计业绩产品收入", 100.0);
        let cost = keyed(2026, 7, "A", "计业绩产品成本", 30.0);
        let expense = keyed(2026, 7, "A", "一线工资", 20.0);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![income, cost, expense], &serde_json::json!({}), &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.get(0, PROFIT_INCOME_TOTAL).unwrap().as_f64(), Some(100.0));
        assert_eq!(out.get(0, PROFIT_COST_TOTAL).unwrap().as_f64(), Some(30.0));
        assert_eq!(out.get(0, PROFIT_EXPENSE_TOTAL).unwrap().as_f64(), Some(20.0));
        assert_eq!(out.get(0, PROFIT_PROFIT_TOTAL).unwrap().as_f64(), Some(50.0));
    }

    #[test]
    fn missing_cost_and_expense_upstreams_are_treated_as_zero() {
        let income = keyed(2026, 7, "A", "计业绩产品收入", 100.0);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![income], &serde_json::json!({}), &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.get(0, PROFIT_PROFIT_TOTAL).unwrap().as_f64(), Some(100.0));
    }

    #[test]
    fn no_inputs_at_all_fails() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        assert!(run(vec![], &serde_json::json!({}), &mut ctx).is_err());
    }

    #[test]
    fn rows_are_sorted_by_year_month_then_office() {
        let a = keyed(2026, 7, "B", "计业绩产品收入", 1.0);
        let b = keyed(2026, 7, "A", "计业绩产品收入", 2.0);
        let income = Table::concat(&[&a, &b], dataflow_table::ConcatJoin::Outer, true);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![income], &serde_json::json!({}), &mut ctx).unwrap();
        assert_eq!(out.get(0, PROFIT_GROUP_OFFICE).unwrap().display_text(), "A");
        assert_eq!(out.get(1, PROFIT_GROUP_OFFICE).unwrap().display_text(), "B");
    }

    #[test]
    fn resolves_upstreams_by_configured_node_id_rather_than_positional_order() {
        let income = keyed(2026, 7, "A", "计业绩产品收入", 100.0);
        let cost = keyed(2026, 7, "A", "计业绩产品成本", 30.0);
        let expense = keyed(2026, 7, "A", "一线工资", 20.0);

        let mut execution = HashMap::new();
        execution.insert("cost_node".to_string(), cost);
        execution.insert("income_node".to_string(), income);
        execution.insert("expense_node".to_string(), expense);

        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = OperatorContext::new(&files, &model, "test", false, None, &execution, &mut log);

        let config = serde_json::json!({
            "income_node_id": "income_node",
            "cost_node_id": "cost_node",
            "expense_node_id": "expense_node",
        });
        // Positional order is scrambled on purpose: it must be ignored once
        // every upstream is resolved by its configured node id.
        let out = run(vec![], &config, &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.get(0, PROFIT_INCOME_TOTAL).unwrap().as_f64(), Some(100.0));
        assert_eq!(out.get(0, PROFIT_COST_TOTAL).unwrap().as_f64(), Some(30.0));
        assert_eq!(out.get(0, PROFIT_EXPENSE_TOTAL).unwrap().as_f64(), Some(20.0));
        assert_eq!(out.get(0, PROFIT_PROFIT_TOTAL).unwrap().as_f64(), Some(50.0));
    }

    #[test]
    fn falls_back_to_positional_order_for_unconfigured_keys() {
        let income = keyed(2026, 7, "A", "计业绩产品收入", 100.0);
        let cost = keyed(2026, 7, "A", "计业绩产品成本", 30.0);

        let mut execution = HashMap::new();
        execution.insert("expense_node".to_string(), keyed(2026, 7, "A", "一线工资", 20.0));

        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = OperatorContext::new(&files, &model, "test", false, None, &execution, &mut log);

        // Only expense is named by config; income/cost fall back to the
        // positional fan-in order of `inputs`.
        let config = serde_json::json!({ "expense_node_id": "expense_node" });
        let out = run(vec![income, cost], &config, &mut ctx).unwrap();
        assert_eq!(out.get(0, PROFIT_INCOME_TOTAL).unwrap().as_f64(), Some(100.0));
        assert_eq!(out.get(0, PROFIT_COST_TOTAL).unwrap().as_f64(), Some(30.0));
        assert_eq!(out.get(0, PROFIT_EXPENSE_TOTAL).unwrap().as_f64(), Some(20.0));
    }
}
