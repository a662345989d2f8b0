//! `reconcile`: 2 inputs `(detail, summary)` — grouped detail-vs-summary
//! comparison with a tolerance band.

use dataflow_engine::constants::{
    RECONCILE_DETAIL_SUM, RECONCILE_DIFF, RECONCILE_RESULT, RECONCILE_RESULT_MATCH, RECONCILE_RESULT_MISMATCH,
    RECONCILE_SUMMARY_SUM,
};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{AggFunc, Column, FillStrategy, JoinHow, Table, Value};
use serde_json::Value as Json;

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    if inputs.len() != 2 {
        return Err(DataflowError::arity(2, inputs.len()));
    }
    let mut iter = inputs.into_iter();
    let detail = iter.next().unwrap();
    let summary = iter.next().unwrap();

    let shared_keys = crate::config::str_or_list(config, "join_keys");
    let detail_keys = shared_keys
        .clone()
        .or_else(|| crate::config::str_or_list(config, "detail_keys"))
        .ok_or_else(|| DataflowError::config_missing("join_keys"))?;
    let summary_keys = shared_keys
        .or_else(|| crate::config::str_or_list(config, "summary_keys"))
        .ok_or_else(|| DataflowError::config_missing("join_keys"))?;

    let left_column = crate::config::opt_str(config, "left_column")
        .or_else(|| crate::config::opt_str(config, "detail_amount"))
        .ok_or_else(|| DataflowError::config_missing("left_column"))?;
    let right_column = crate::config::opt_str(config, "right_column")
        .or_else(|| crate::config::opt_str(config, "summary_amount"))
        .ok_or_else(|| DataflowError::config_missing("right_column"))?;

    let tolerance = crate::config::opt_f64(config, "tolerance", 0.0);
    let output_mode = crate::config::opt_str_or(config, "output_mode", "diff_only");

    let detail_grouped = detail.group_aggregate(
        &detail_keys,
        &[(left_column.to_string(), AggFunc::Sum, RECONCILE_DETAIL_SUM.to_string())],
    )?;
    let mut summary_grouped = summary.group_aggregate(
        &summary_keys,
        &[(right_column.to_string(), AggFunc::Sum, RECONCILE_SUMMARY_SUM.to_string())],
    )?;

    if detail_keys != summary_keys {
        let pairs: Vec<(String, String)> = summary_keys
            .iter()
            .zip(detail_keys.iter())
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();
        summary_grouped = summary_grouped.rename(&pairs)?;
    }

    let merged = detail_grouped.merge(&summary_grouped, &detail_keys, &detail_keys, JoinHow::Outer)?;
    let filled = merged.fill_na(
        Some(&[RECONCILE_DETAIL_SUM.to_string(), RECONCILE_SUMMARY_SUM.to_string()]),
        FillStrategy::FillValue(Value::Real(0.0)),
    )?;

    let detail_idx = filled.column_index(RECONCILE_DETAIL_SUM).expect("just grouped");
    let summary_idx = filled.column_index(RECONCILE_SUMMARY_SUM).expect("just grouped");

    let diffs: Vec<Value> = (0..filled.num_rows())
        .map(|r| {
            let d = filled.columns()[detail_idx].values[r].as_f64().unwrap_or(0.0);
            let s = filled.columns()[summary_idx].values[r].as_f64().unwrap_or(0.0);
            Value::Real(d - s)
        })
        .collect();
    let results: Vec<Value> = diffs
        .iter()
        .map(|v| {
            let diff = v.as_f64().unwrap_or(0.0);
            Value::Text(if diff.abs() <= tolerance {
                RECONCILE_RESULT_MATCH.to_string()
            } else {
                RECONCILE_RESULT_MISMATCH.to_string()
            })
        })
        .collect();

    let mut columns = filled.columns().to_vec();
    columns.push(Column::new(RECONCILE_DIFF, diffs));
    columns.push(Column::new(RECONCILE_RESULT, results));
    let table = Table::from_columns(columns);

    if output_mode == "diff_only" {
        let diff_idx = table.column_index(RECONCILE_DIFF).expect("just pushed");
        let keep: Vec<bool> = table.columns()[diff_idx]
            .values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0).abs() > tolerance)
            .collect();
        return Ok(table.filter_indices(&keep));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};

    fn detail() -> Table {
        Table::from_columns(vec![
            Column::new("店", vec![Value::Text("店A".into()), Value::Text("店A".into()), Value::Text("店B".into())]),
            Column::new("金额", vec![Value::Integer(100), Value::Integer(50), Value::Integer(30)]),
        ])
    }

    fn summary() -> Table {
        Table::from_columns(vec![
            Column::new("店", vec![Value::Text("店A".into()), Value::Text("店B".into())]),
            Column::new("汇总", vec![Value::Integer(150), Value::Integer(40)]),
        ])
    }

    #[test]
    fn diff_only_keeps_only_mismatched_rows() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({
            "join_keys": ["店"],
            "left_column": "金额",
            "right_column": "汇总",
            "tolerance": 0,
            "output_mode": "diff_only",
        });
        let out = run(vec![detail(), summary()], &config, &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.get(0, "店").unwrap().display_text(), "店B");
        assert_eq!(out.get(0, RECONCILE_DETAIL_SUM).unwrap().as_f64(), Some(30.0));
        assert_eq!(out.get(0, RECONCILE_SUMMARY_SUM).unwrap().as_f64(), Some(40.0));
        assert_eq!(out.get(0, RECONCILE_DIFF).unwrap().as_f64(), Some(-10.0));
        assert_eq!(out.get(0, RECONCILE_RESULT).unwrap().display_text(), RECONCILE_RESULT_MISMATCH);
    }

    #[test]
    fn output_mode_all_retains_matching_rows_too() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({
            "join_keys": ["店"],
            "left_column": "金额",
            "right_column": "汇总",
            "tolerance": 0,
            "output_mode": "all",
        });
        let out = run(vec![detail(), summary()], &config, &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 2);
        let matches: usize = (0..out.num_rows())
            .filter(|&r| out.get(r, RECONCILE_RESULT).unwrap().display_text() == RECONCILE_RESULT_MATCH)
            .count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn cross_named_keys_are_renamed_before_merge() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let summary_alt = Table::from_columns(vec![
            Column::new("门店", vec![Value::Text("店A".into()), Value::Text("店B".into())]),
            Column::new("汇总", vec![Value::Integer(150), Value::Integer(30)]),
        ]);
        let config = serde_json::json!({
            "detail_keys": ["店"],
            "summary_keys": ["门店"],
            "left_column": "金额",
            "right_column": "汇总",
            "tolerance": 0,
        });
        let out = run(vec![detail(), summary_alt], &config, &mut ctx).unwrap();
        assert!(out.has_column("店"));
        assert!(!out.has_column("门店"));
        assert_eq!(out.num_rows(), 2);
    }
}
