//! `type_convert`: per-column coercion list.

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{ElementKind, Table};
use serde_json::Value;

fn parse_dtype(dtype: &str) -> Option<ElementKind> {
    Some(match dtype {
        "int" => ElementKind::Integer,
        "float" => ElementKind::Real,
        "str" => ElementKind::Text,
        "datetime" => ElementKind::Timestamp,
        "bool" => ElementKind::Boolean,
        _ => return None,
    })
}

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    let mut table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let conversions = config
        .get("columns")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataflowError::config_missing("columns"))?;

    for entry in conversions {
        let column = entry
            .get("column")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataflowError::config_missing("columns[].column"))?;
        let dtype = entry
            .get("dtype")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataflowError::config_missing("columns[].dtype"))?;
        let kind = parse_dtype(dtype)
            .ok_or_else(|| DataflowError::config_missing(&format!("columns[].dtype (unknown '{}')", dtype)))?;
        table = table.coerce_column(column, kind)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::{Column, Value};

    #[test]
    fn coerces_text_column_to_int() {
        let table = Table::from_columns(vec![Column::new("n", vec![Value::Text(" 42 ".into()), Value::Absent])]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"columns": [{"column": "n", "dtype": "int"}]});
        let out = run(vec![table], &config, &mut ctx).unwrap();
        assert_eq!(out.get(0, "n").unwrap().as_f64(), Some(42.0));
        assert!(out.get(1, "n").unwrap().is_absent());
    }

    #[test]
    fn unknown_dtype_fails() {
        let table = Table::from_columns(vec![Column::new("n", vec![Value::Integer(1)])]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"columns": [{"column": "n", "dtype": "complex"}]});
        assert!(run(vec![table], &config, &mut ctx).is_err());
    }
}
