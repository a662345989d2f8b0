//! `deduplicate`: optional key subset, `keep ∈ {first, last, none}`.
//! Also accepts `keep = "false"` as a synonym for `none`.

use crate::config::opt_str_list;
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{DedupKeep, Table};
use serde_json::Value;

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let keep_raw = config.get("keep").and_then(|v| v.as_str()).unwrap_or("first");
    let keep = match keep_raw {
        "first" => DedupKeep::First,
        "last" => DedupKeep::Last,
        "none" | "false" => DedupKeep::None,
        other => {
            return Err(DataflowError::config_missing(&format!(
                "keep (unknown '{}')",
                other
            )))
        }
    };

    let subset = opt_str_list(config, "subset");
    let subset_ref = if subset.is_empty() { None } else { Some(subset.as_slice()) };

    Ok(table.deduplicate(subset_ref, keep)?)
}
