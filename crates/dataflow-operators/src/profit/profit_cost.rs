//! `profit_cost`: groups an order detail stream by `(年, 月, 办公室)`,
//! computing main-product cost from a configured unit cost and
//! group-product cost from configurable source columns.

use crate::config::require_str;
use crate::profit::common::{apply_status_filter, group_by_period, key_columns};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{Table, Value};
use serde_json::Value as Json;
use std::collections::HashSet;

fn value_set(config: &Json, key: &str) -> HashSet<String> {
    crate::config::opt_str_list(config, key).into_iter().collect()
}

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let table = apply_status_filter(&table, config)?;

    let team_col = require_str(config, "team_col")?;
    let date_col = require_str(config, "date_col")?;
    let product_col = require_str(config, "product_type_col")?;
    let perf_col = require_str(config, "perf_flag_col")?;
    let qty_col = require_str(config, "signed_qty_col")?;
    let unit_cost = crate::config::opt_f64(config, "main_unit_cost", 0.0);

    let main_vals = value_set(config, "main_product_values");
    let group_vals = value_set(config, "group_product_values");
    let perf_vals = value_set(config, "perf_values");

    let product_idx = table
        .column_index(product_col)
        .ok_or_else(|| DataflowError::column_missing(product_col, &table.column_names()))?;
    let perf_idx = table
        .column_index(perf_col)
        .ok_or_else(|| DataflowError::column_missing(perf_col, &table.column_names()))?;
    let qty_idx = table
        .column_index(qty_col)
        .ok_or_else(|| DataflowError::column_missing(qty_col, &table.column_names()))?;

    let group_perf_col = crate::config::opt_str(config, "group_cost_perf_col");
    let group_nonperf_col = crate::config::opt_str(config, "group_cost_nonperf_col");
    let group_perf_idx = group_perf_col
        .map(|c| table.column_index(c).ok_or_else(|| DataflowError::column_missing(c, &table.column_names())))
        .transpose()?;
    let group_nonperf_idx = group_nonperf_col
        .map(|c| table.column_index(c).ok_or_else(|| DataflowError::column_missing(c, &table.column_names())))
        .transpose()?;

    let (years, months, teams) = key_columns(&table, date_col, team_col)?;

    let mut cost_main_perf = Vec::with_capacity(table.num_rows());
    let mut cost_main_nonperf = Vec::with_capacity(table.num_rows());
    let mut cost_group_perf = Vec::with_capacity(table.num_rows());
    let mut cost_group_nonperf = Vec::with_capacity(table.num_rows());

    for r in 0..table.num_rows() {
        let kind = table.columns()[product_idx].values[r].display_text();
        let is_main = main_vals.contains(&kind);
        let is_group = group_vals.contains(&kind);
        let is_perf = perf_vals.contains(&table.columns()[perf_idx].values[r].display_text());
        let qty = table.columns()[qty_idx].values[r].as_f64().unwrap_or(0.0);

        cost_main_perf.push(Value::Real(if is_main && is_perf { qty * unit_cost } else { 0.0 }));
        cost_main_nonperf.push(Value::Real(if is_main && !is_perf { qty * unit_cost } else { 0.0 }));

        let group_perf = group_perf_idx.map(|ci| table.columns()[ci].values[r].as_f64().unwrap_or(0.0)).unwrap_or(0.0);
        let group_nonperf = group_nonperf_idx.map(|ci| table.columns()[ci].values[r].as_f64().unwrap_or(0.0)).unwrap_or(0.0);
        cost_group_perf.push(Value::Real(if is_group && is_perf { group_perf } else { 0.0 }));
        cost_group_nonperf.push(Value::Real(if is_group && !is_perf { group_nonperf } else { 0.0 }));
    }

    Ok(group_by_period(
        years,
        months,
        teams,
        vec![
            ("计业绩产品成本".to_string(), cost_main_perf),
            ("不计业绩产品成本".to_string(), cost_main_nonperf),
            ("计业绩团品成本".to_string(), cost_group_perf),
            ("不计业绩团品成本".to_string(), cost_group_nonperf),
        ],
    ))
}
