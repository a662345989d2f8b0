//! `fill_na`: absent-value handling strategies over a column subset, or
//! every column when none is given.

use crate::config::{opt_str, opt_str_list};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{FillStrategy, Table, Value};
use serde_json::Value as Json;

fn json_to_value(v: &Json) -> Value {
    match v {
        Json::Null => Value::Absent,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .unwrap_or_else(|| Value::Real(n.as_f64().unwrap_or(f64::NAN))),
        Json::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let strategy_name = opt_str(config, "strategy").unwrap_or("drop");
    let strategy = match strategy_name {
        "drop" => FillStrategy::Drop,
        "fill_value" => FillStrategy::FillValue(
            config
                .get("value")
                .map(json_to_value)
                .ok_or_else(|| DataflowError::config_missing("value"))?,
        ),
        "ffill" => FillStrategy::Ffill,
        "bfill" => FillStrategy::Bfill,
        "mean" => FillStrategy::Mean,
        "median" => FillStrategy::Median,
        other => {
            return Err(DataflowError::config_missing(&format!(
                "strategy (unknown '{}')",
                other
            )))
        }
    };

    let subset = opt_str_list(config, "columns");
    let subset_ref = if subset.is_empty() { None } else { Some(subset.as_slice()) };

    Ok(table.fill_na(subset_ref, strategy)?)
}
