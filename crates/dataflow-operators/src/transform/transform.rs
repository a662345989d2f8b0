//! `transform`: the general-purpose row/column reshaping operator —
//! optional filter, column drops, computed columns, rename, projection,
//! and a single-column sort, applied in that order.

use dataflow_engine::{DataflowError, ErrorCategory, OperatorContext, Result};
use dataflow_table::expr::{parse_expr, parse_filter};
use dataflow_table::Table;
use serde_json::Value;
use std::collections::HashMap;

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    let mut table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let ambient: HashMap<String, dataflow_table::Value> = HashMap::new();

    if let Some(filter_code) = config.get("filter_code").and_then(|v| v.as_str()).filter(|s| !s.is_empty()) {
        let expr = parse_filter(filter_code, &table.column_names()).map_err(expr_err)?;
        table = table.filter_expr(&expr, &ambient)?;
    }

    if let Some(drop) = config.get("drop_columns").and_then(|v| v.as_array()) {
        let names: Vec<String> = drop.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
        if !names.is_empty() {
            table = table.drop_columns(&names)?;
        }
    }

    if let Some(computed) = config.get("computed_columns").and_then(|v| v.as_array()) {
        for entry in computed {
            let name = entry.get("name").and_then(|v| v.as_str()).ok_or_else(|| DataflowError::config_missing("computed_columns[].name"))?;
            let expr_src = entry.get("expr").and_then(|v| v.as_str()).ok_or_else(|| DataflowError::config_missing("computed_columns[].expr"))?;
            let expr = parse_expr(expr_src).map_err(expr_err)?;
            table = table.add_computed_column(name, &expr, &ambient)?;
        }
    }

    if let Some(rename) = config.get("rename").and_then(|v| v.as_object()) {
        let pairs: Vec<(String, String)> = rename
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|to| (k.clone(), to.to_string())))
            .collect();
        if !pairs.is_empty() {
            table = table.rename(&pairs)?;
        }
    }

    if let Some(columns) = config.get("columns").and_then(|v| v.as_array()) {
        let names: Vec<String> = columns.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
        if !names.is_empty() {
            table = table.select(&names)?;
        }
    }

    if let Some(sort_col) = config.get("sort_by").and_then(|v| v.as_str()).filter(|s| !s.is_empty()) {
        let ascending = config.get("ascending").and_then(|v| v.as_bool()).unwrap_or(true);
        table = table.sort_by(sort_col, ascending)?;
    }

    Ok(table)
}

fn expr_err(e: dataflow_table::expr::ExprError) -> DataflowError {
    DataflowError::new(ErrorCategory::Internal, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::{Column, Value};

    fn offices() -> Table {
        Table::from_columns(vec![Column::new(
            "办公室团队",
            vec![Value::Text("邯郸刘洋".into()), Value::Text("石家庄张三".into())],
        )])
    }

    #[test]
    fn excel_style_equality_shortcut_retains_matching_row() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"filter_code": "办公室团队=邯郸刘洋"});
        let out = run(vec![offices()], &config, &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.get(0, "办公室团队").unwrap().display_text(), "邯郸刘洋");
    }

    #[test]
    fn computed_column_and_rename_and_sort() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let table = Table::from_columns(vec![
            Column::new("a", vec![Value::Integer(1), Value::Integer(3), Value::Integer(2)]),
        ]);
        let config = serde_json::json!({
            "computed_columns": [{"name": "b", "expr": "a * 2"}],
            "rename": {"a": "a_renamed"},
            "sort_by": "b",
            "ascending": false,
        });
        let out = run(vec![table], &config, &mut ctx).unwrap();
        assert_eq!(out.column_names(), vec!["a_renamed", "b"]);
        let b_vals: Vec<i64> = out.column("b").unwrap().values.iter().map(|v| v.as_f64().unwrap() as i64).collect();
        assert_eq!(b_vals, vec![6, 4, 2]);
    }

    #[test]
    fn missing_input_fails_with_arity() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let err = run(vec![], &serde_json::json!({}), &mut ctx).unwrap_err();
        assert_eq!(err.category, ErrorCategory::OperatorArity);
    }
}
