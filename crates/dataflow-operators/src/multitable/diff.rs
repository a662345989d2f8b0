//! `diff`: 2 inputs. Rows present on one side only, across
//! `compare_columns` (default: columns common to both sides), tagged with
//! `_diff_status`.

use dataflow_engine::constants::{DIFF_STATUS_COLUMN, DIFF_STATUS_LEFT_ONLY, DIFF_STATUS_RIGHT_ONLY};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{Table, Value};
use serde_json::Value as Json;
use std::collections::HashSet;

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    if inputs.len() != 2 {
        return Err(DataflowError::arity(2, inputs.len()));
    }
    let mut iter = inputs.into_iter();
    let left = iter.next().unwrap();
    let right = iter.next().unwrap();

    let compare_columns: Vec<String> = {
        let requested = crate::config::opt_str_list(config, "compare_columns");
        if !requested.is_empty() {
            requested
        } else {
            let right_names: HashSet<String> = right.column_names().into_iter().collect();
            left.column_names().into_iter().filter(|c| right_names.contains(c)).collect()
        }
    };

    let left_proj = left.select(&compare_columns)?;
    let right_proj = right.select(&compare_columns)?;

    let key_of = |t: &Table, row: usize| -> Vec<String> {
        compare_columns
            .iter()
            .map(|c| t.get(row, c).map(|v| v.normalized_key()).unwrap_or_default())
            .collect()
    };

    let right_keys: HashSet<Vec<String>> = (0..right_proj.num_rows()).map(|r| key_of(&right_proj, r)).collect();
    let left_keys: HashSet<Vec<String>> = (0..left_proj.num_rows()).map(|r| key_of(&left_proj, r)).collect();

    let mut schema = compare_columns.clone();
    schema.push(DIFF_STATUS_COLUMN.to_string());

    let mut out_rows: Vec<Vec<Value>> = Vec::new();
    for r in 0..left_proj.num_rows() {
        if !right_keys.contains(&key_of(&left_proj, r)) {
            let mut row = left_proj.row_vec(r);
            row.push(Value::Text(DIFF_STATUS_LEFT_ONLY.to_string()));
            out_rows.push(row);
        }
    }
    for r in 0..right_proj.num_rows() {
        if !left_keys.contains(&key_of(&right_proj, r)) {
            let mut row = right_proj.row_vec(r);
            row.push(Value::Text(DIFF_STATUS_RIGHT_ONLY.to_string()));
            out_rows.push(row);
        }
    }

    Ok(Table::from_rows(&schema, out_rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::Column;

    #[test]
    fn reports_rows_present_on_only_one_side() {
        let left = Table::from_columns(vec![
            Column::new("id", vec![Value::Integer(1), Value::Integer(2)]),
            Column::new("amt", vec![Value::Integer(10), Value::Integer(20)]),
        ]);
        let right = Table::from_columns(vec![
            Column::new("id", vec![Value::Integer(2), Value::Integer(3)]),
            Column::new("amt", vec![Value::Integer(20), Value::Integer(30)]),
        ]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![left, right], &serde_json::json!({}), &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 2);
        let statuses: Vec<String> = (0..out.num_rows()).map(|r| out.get(r, DIFF_STATUS_COLUMN).unwrap().display_text()).collect();
        assert!(statuses.contains(&DIFF_STATUS_LEFT_ONLY.to_string()));
        assert!(statuses.contains(&DIFF_STATUS_RIGHT_ONLY.to_string()));
    }
}
