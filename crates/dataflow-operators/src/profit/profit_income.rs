//! `profit_income`: groups an order/live-sale detail stream by
//! `(年, 月, 办公室)`, partitioning by product-kind × performance-flag
//! into four income columns.

use crate::config::require_str;
use crate::profit::common::{apply_status_filter, group_by_period, key_columns};
use dataflow_engine::{OperatorContext, Result};
use dataflow_table::{Table, Value};
use serde_json::Value as Json;
use std::collections::HashSet;

fn value_set(config: &Json, key: &str) -> HashSet<String> {
    crate::config::opt_str_list(config, key).into_iter().collect()
}

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| dataflow_engine::DataflowError::arity(1, 0))?;
    let table = apply_status_filter(&table, config)?;

    let team_col = require_str(config, "team_col")?;
    let date_col = require_str(config, "date_col")?;
    let product_col = require_str(config, "product_type_col")?;
    let perf_col = require_str(config, "perf_flag_col")?;
    let perf_amount_col = require_str(config, "perf_amount_col")?;
    let nonperf_amount_col = require_str(config, "nonperf_amount_col")?;

    let main_vals = value_set(config, "main_product_values");
    let group_vals = value_set(config, "group_product_values");
    let perf_vals = value_set(config, "perf_values");

    let product_idx = table
        .column_index(product_col)
        .ok_or_else(|| dataflow_engine::DataflowError::column_missing(product_col, &table.column_names()))?;
    let perf_idx = table
        .column_index(perf_col)
        .ok_or_else(|| dataflow_engine::DataflowError::column_missing(perf_col, &table.column_names()))?;
    let perf_amt_idx = table
        .column_index(perf_amount_col)
        .ok_or_else(|| dataflow_engine::DataflowError::column_missing(perf_amount_col, &table.column_names()))?;
    let nonperf_amt_idx = table
        .column_index(nonperf_amount_col)
        .ok_or_else(|| dataflow_engine::DataflowError::column_missing(nonperf_amount_col, &table.column_names()))?;

    let (years, months, teams) = key_columns(&table, date_col, team_col)?;

    let mut rev_main_perf = Vec::with_capacity(table.num_rows());
    let mut rev_main_nonperf = Vec::with_capacity(table.num_rows());
    let mut rev_group_perf = Vec::with_capacity(table.num_rows());
    let mut rev_group_nonperf = Vec::with_capacity(table.num_rows());

    for r in 0..table.num_rows() {
        let kind = table.columns()[product_idx].values[r].display_text();
        let is_main = main_vals.contains(&kind);
        let is_group = group_vals.contains(&kind);
        let is_perf = perf_vals.contains(&table.columns()[perf_idx].values[r].display_text());
        let amt_perf = table.columns()[perf_amt_idx].values[r].as_f64().unwrap_or(0.0);
        let amt_nonperf = table.columns()[nonperf_amt_idx].values[r].as_f64().unwrap_or(0.0);

        rev_main_perf.push(Value::Real(if is_main && is_perf { amt_perf } else { 0.0 }));
        rev_main_nonperf.push(Value::Real(if is_main && !is_perf { amt_nonperf } else { 0.0 }));
        rev_group_perf.push(Value::Real(if is_group && is_perf { amt_perf } else { 0.0 }));
        rev_group_nonperf.push(Value::Real(if is_group && !is_perf { amt_nonperf } else { 0.0 }));
    }

    Ok(group_by_period(
        years,
        months,
        teams,
        vec![
            ("计业绩产品收入".to_string(), rev_main_perf),
            ("不计业绩产品收入".to_string(), rev_main_nonperf),
            ("计业绩团品收入".to_string(), rev_group_perf),
            ("不计业绩团品收入".to_string(), rev_group_nonperf),
        ],
    ))
}
