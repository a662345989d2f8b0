//! `concat`: 1..N inputs stacked row-wise with inner/outer schema
//! reconciliation.

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{ConcatJoin, Table};
use serde_json::Value;

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    if inputs.is_empty() {
        return Err(DataflowError::arity(1, 0));
    }
    let join_name = crate::config::opt_str_or(config, "join", "outer");
    let join = match join_name {
        "inner" => ConcatJoin::Inner,
        "outer" => ConcatJoin::Outer,
        other => {
            return Err(DataflowError::config_missing(&format!("join (unknown '{}')", other)))
        }
    };
    let ignore_index = crate::config::opt_bool(config, "ignore_index", false);

    let refs: Vec<&Table> = inputs.iter().collect();
    Ok(Table::concat(&refs, join, ignore_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::{Column, Value};

    #[test]
    fn outer_concat_fills_absent_for_columns_missing_on_one_side() {
        let a = Table::from_columns(vec![Column::new("x", vec![Value::Integer(1)])]);
        let b = Table::from_columns(vec![Column::new("y", vec![Value::Integer(2)])]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![a, b], &serde_json::json!({"join": "outer"}), &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert!(out.has_column("x"));
        assert!(out.has_column("y"));
        assert!(out.get(1, "x").unwrap().is_absent());
    }

    #[test]
    fn inner_concat_keeps_only_common_columns() {
        let a = Table::from_columns(vec![
            Column::new("x", vec![Value::Integer(1)]),
            Column::new("y", vec![Value::Integer(9)]),
        ]);
        let b = Table::from_columns(vec![Column::new("x", vec![Value::Integer(2)])]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![a, b], &serde_json::json!({"join": "inner"}), &mut ctx).unwrap();
        assert_eq!(out.column_names(), vec!["x"]);
        assert_eq!(out.num_rows(), 2);
    }
}
