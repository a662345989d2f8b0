//! `group_aggregate`: group keys plus a list of per-column aggregations.

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{AggFunc, Table};
use serde_json::Value;

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let keys = crate::config::require_str_or_list(config, "group_by")
        .or_else(|_| crate::config::require_str_or_list(config, "keys"))?;

    let aggs_raw = config
        .get("aggregations")
        .or_else(|| config.get("aggs"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataflowError::config_missing("aggregations"))?;

    let mut aggs = Vec::with_capacity(aggs_raw.len());
    for entry in aggs_raw {
        let column = entry
            .get("column")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataflowError::config_missing("aggregations[].column"))?;
        let func_name = entry
            .get("func")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataflowError::config_missing("aggregations[].func"))?;
        let func = AggFunc::parse(func_name)
            .ok_or_else(|| DataflowError::config_missing(&format!("aggregations[].func (unknown '{}')", func_name)))?;
        let alias = entry
            .get("alias")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}", column, func_name));
        aggs.push((column.to_string(), func, alias));
    }

    Ok(table.group_aggregate(&keys, &aggs)?)
}
