//! `join`: exactly 2 inputs `(left, right)`; relational join on
//! multi-column string-normalized keys.

use dataflow_engine::{DataflowError, OperatorContext, Result};
#[cfg(test)]
use dataflow_engine::ErrorCategory;
use dataflow_table::{JoinHow, Table};
use serde_json::Value;

fn parse_how(s: &str) -> Option<JoinHow> {
    Some(match s {
        "inner" => JoinHow::Inner,
        "left" => JoinHow::Left,
        "right" => JoinHow::Right,
        "outer" | "full_outer" => JoinHow::Outer,
        _ => return None,
    })
}

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    if inputs.len() != 2 {
        return Err(DataflowError::arity(2, inputs.len()));
    }
    let mut iter = inputs.into_iter();
    let left = iter.next().unwrap();
    let right = iter.next().unwrap();

    let how_name = crate::config::opt_str_or(config, "how", "inner");
    let how = parse_how(how_name)
        .ok_or_else(|| DataflowError::config_missing(&format!("how (unknown '{}')", how_name)))?;

    let on = crate::config::str_or_list(config, "on");
    let left_on = on
        .clone()
        .or_else(|| crate::config::str_or_list(config, "left_on"))
        .ok_or_else(|| DataflowError::config_missing("left_on"))?;
    let right_on = on
        .or_else(|| crate::config::str_or_list(config, "right_on"))
        .ok_or_else(|| DataflowError::config_missing("right_on"))?;

    Ok(left.merge(&right, &left_on, &right_on, how)?)
}
