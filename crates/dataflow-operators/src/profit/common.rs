//! Shared helpers for the `profit_income`/`profit_cost`/`profit_expense`
//! trio: all three group one detail stream by `(年, 月, 办公室)` and sum
//! configured amount columns into named buckets.

use dataflow_engine::constants::{PROFIT_GROUP_MONTH, PROFIT_GROUP_OFFICE, PROFIT_GROUP_YEAR};
use dataflow_engine::{DataflowError, Result};
use dataflow_table::dates::parse_timestamp;
use dataflow_table::{AggFunc, Column, Table, Value};
use serde_json::Value as Json;
use std::collections::HashSet;

pub fn year_month(v: &Value) -> Option<(i64, i64)> {
    match v {
        Value::Timestamp(dt) => Some((dt.date().format("%Y").to_string().parse().ok()?, dt.date().format("%m").to_string().trim_start_matches('0').parse().ok()?)),
        Value::Date(d) => Some((d.format("%Y").to_string().parse().ok()?, d.format("%m").to_string().trim_start_matches('0').parse().ok()?)),
        Value::Text(s) => {
            let dt = parse_timestamp(s)?;
            Some((dt.date().format("%Y").to_string().parse().ok()?, dt.date().format("%m").to_string().trim_start_matches('0').parse().ok()?))
        }
        _ => None,
    }
}

/// Optional `{filter_by_status, status_col, allowed_status_values}`
/// config block, applied before grouping.
pub fn apply_status_filter(table: &Table, config: &Json) -> Result<Table> {
    if !config.get("filter_by_status").and_then(|v| v.as_bool()).unwrap_or(false) {
        return Ok(table.clone());
    }
    let status_col = crate::config::opt_str(config, "status_col");
    let allowed = crate::config::opt_str_list(config, "allowed_status_values");
    let (Some(status_col), false) = (status_col, allowed.is_empty()) else {
        return Ok(table.clone());
    };
    let idx = table
        .column_index(status_col)
        .ok_or_else(|| DataflowError::column_missing(status_col, &table.column_names()))?;
    let allowed_set: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    let keep: Vec<bool> = table.columns()[idx]
        .values
        .iter()
        .map(|v| allowed_set.contains(v.display_text().as_str()))
        .collect();
    Ok(table.filter_indices(&keep))
}

/// Computes `(年, 月, 办公室)` columns from the configured `date_col`/
/// `team_col`, defaulting an empty team to `未知团队`.
pub fn key_columns(table: &Table, date_col: &str, team_col: &str) -> Result<(Vec<Option<i64>>, Vec<Option<i64>>, Vec<String>)> {
    let date_idx = table
        .column_index(date_col)
        .ok_or_else(|| DataflowError::column_missing(date_col, &table.column_names()))?;
    let team_idx = table
        .column_index(team_col)
        .ok_or_else(|| DataflowError::column_missing(team_col, &table.column_names()))?;

    let mut years = Vec::with_capacity(table.num_rows());
    let mut months = Vec::with_capacity(table.num_rows());
    for v in &table.columns()[date_idx].values {
        match year_month(v) {
            Some((y, m)) => {
                years.push(Some(y));
                months.push(Some(m));
            }
            None => {
                years.push(None);
                months.push(None);
            }
        }
    }

    let teams: Vec<String> = table.columns()[team_idx]
        .values
        .iter()
        .map(|v| {
            let s = v.display_text();
            if s.trim().is_empty() {
                "未知团队".to_string()
            } else {
                s
            }
        })
        .collect();

    Ok((years, months, teams))
}

/// Builds the grouping table `(年, 月, 办公室, <bucket columns>)`,
/// dropping rows with no resolvable date, then sums each bucket.
pub fn group_by_period(
    years: Vec<Option<i64>>,
    months: Vec<Option<i64>>,
    teams: Vec<String>,
    buckets: Vec<(String, Vec<Value>)>,
) -> Table {
    let keep: Vec<bool> = years.iter().zip(months.iter()).map(|(y, m)| y.is_some() && m.is_some()).collect();

    let mut columns = vec![
        Column::new(PROFIT_GROUP_YEAR, years.into_iter().map(|y| y.map(Value::Integer).unwrap_or(Value::Absent)).collect()),
        Column::new(PROFIT_GROUP_MONTH, months.into_iter().map(|m| m.map(Value::Integer).unwrap_or(Value::Absent)).collect()),
        Column::new(PROFIT_GROUP_OFFICE, teams.into_iter().map(Value::Text).collect()),
    ];
    for (name, values) in buckets {
        columns.push(Column::new(name, values));
    }
    let staging = Table::from_columns(columns).filter_indices(&keep);

    let bucket_names: Vec<String> = staging
        .column_names()
        .into_iter()
        .filter(|c| !matches!(c.as_str(), "年" | "月" | "办公室"))
        .collect();
    let aggs: Vec<(String, AggFunc, String)> = bucket_names.into_iter().map(|n| (n.clone(), AggFunc::Sum, n)).collect();

    staging
        .group_aggregate(&[PROFIT_GROUP_YEAR.to_string(), PROFIT_GROUP_MONTH.to_string(), PROFIT_GROUP_OFFICE.to_string()], &aggs)
        .expect("group_by_period keys are freshly constructed and present")
}
