//! `unpivot`: wide→long, config `{id_vars, value_vars, var_name,
//! value_name}`.

use dataflow_engine::{OperatorContext, Result};
use dataflow_table::Table;
use serde_json::Value;

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs
        .into_iter()
        .next()
        .ok_or_else(|| dataflow_engine::DataflowError::arity(1, 0))?;
    let id_vars = crate::config::opt_str_list(config, "id_vars");
    let value_vars = if let Ok(v) = crate::config::require_str_or_list(config, "value_vars") {
        v
    } else {
        table
            .column_names()
            .into_iter()
            .filter(|c| !id_vars.contains(c))
            .collect()
    };
    let var_name = crate::config::opt_str_or(config, "var_name", "variable");
    let value_name = crate::config::opt_str_or(config, "value_name", "value");

    Ok(table.melt(&id_vars, &value_vars, var_name, value_name)?)
}
