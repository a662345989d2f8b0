//! `profit_expense`: sums configured expense amount columns by
//! `(年, 月, 办公室)`.

use crate::config::require_str;
use crate::profit::common::{group_by_period, key_columns};
use dataflow_engine::constants::{PROFIT_GROUP_MONTH, PROFIT_GROUP_OFFICE, PROFIT_GROUP_YEAR};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{Column, Table, Value};
use serde_json::Value as Json;

const EXPENSE_BUCKETS: &[(&str, &str)] = &[
    ("salary_col", "一线工资"),
    ("redpacket_col", "红包"),
    ("task_col", "任务款"),
    ("rent_col", "门店房租"),
    ("utilities_col", "门店水、电、液化气"),
    ("property_col", "门店物业费"),
    ("alloc_col", "其他分摊"),
    ("other_col", "其他费用"),
];

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;

    if table.num_rows() == 0 || table.num_columns() == 0 {
        let mut names = vec![PROFIT_GROUP_YEAR.to_string(), PROFIT_GROUP_MONTH.to_string(), PROFIT_GROUP_OFFICE.to_string()];
        names.extend(EXPENSE_BUCKETS.iter().map(|(_, label)| label.to_string()));
        let columns = names.into_iter().map(|n| Column::new(n, Vec::new())).collect();
        return Ok(Table::from_columns(columns));
    }

    let team_col = require_str(config, "team_col")?;
    let date_col = require_str(config, "date_col")?;
    let (years, months, teams) = key_columns(&table, date_col, team_col)?;

    let mut buckets = Vec::with_capacity(EXPENSE_BUCKETS.len());
    for (config_key, label) in EXPENSE_BUCKETS {
        let col_name = crate::config::opt_str(config, config_key);
        let values: Vec<Value> = match col_name {
            None => vec![Value::Real(0.0); table.num_rows()],
            Some(name) => {
                let idx = table
                    .column_index(name)
                    .ok_or_else(|| DataflowError::column_missing(name, &table.column_names()))?;
                table.columns()[idx].values.iter().map(|v| Value::Real(v.as_f64().unwrap_or(0.0))).collect()
            }
        };
        buckets.push((label.to_string(), values));
    }

    Ok(group_by_period(years, months, teams, buckets))
}
