//! `text_process`: single-column text operations — `trim`, `lower`,
//! `upper`, `replace` (regex pattern + substitution), `extract` (regex
//! capture group written to `<col>_extracted`).

use dataflow_engine::{DataflowError, ErrorCategory, OperatorContext, Result};
use dataflow_table::{Column, Table, Value};
use regex::Regex;
use serde_json::Value as Json;

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let column_name = config
        .get("column")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataflowError::config_missing("column"))?;
    let op = config
        .get("op")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataflowError::config_missing("op"))?;

    let idx = table
        .column_index(column_name)
        .ok_or_else(|| DataflowError::column_missing(column_name, &table.column_names()))?;
    let source = &table.columns()[idx];

    let mut columns: Vec<Column> = table.columns().to_vec();

    match op {
        "trim" => {
            let values: Vec<Value> = source.values.iter().map(|v| map_text(v, |s| s.trim().to_string())).collect();
            columns[idx] = Column::new(column_name, values);
        }
        "lower" => {
            let values: Vec<Value> = source.values.iter().map(|v| map_text(v, |s| s.to_lowercase())).collect();
            columns[idx] = Column::new(column_name, values);
        }
        "upper" => {
            let values: Vec<Value> = source.values.iter().map(|v| map_text(v, |s| s.to_uppercase())).collect();
            columns[idx] = Column::new(column_name, values);
        }
        "replace" => {
            let pattern = config
                .get("pattern")
                .and_then(|v| v.as_str())
                .ok_or_else(|| DataflowError::config_missing("pattern"))?;
            let replacement = config.get("replacement").and_then(|v| v.as_str()).unwrap_or("");
            let re = Regex::new(pattern).map_err(|e| DataflowError::new(ErrorCategory::Internal, e.to_string()))?;
            let values: Vec<Value> = source
                .values
                .iter()
                .map(|v| map_text(v, |s| re.replace_all(&s, replacement).into_owned()))
                .collect();
            columns[idx] = Column::new(column_name, values);
        }
        "extract" => {
            let pattern = config
                .get("pattern")
                .and_then(|v| v.as_str())
                .ok_or_else(|| DataflowError::config_missing("pattern"))?;
            let re = Regex::new(pattern).map_err(|e| DataflowError::new(ErrorCategory::Internal, e.to_string()))?;
            let values: Vec<Value> = source
                .values
                .iter()
                .map(|v| match v {
                    Value::Text(s) => re
                        .captures(s)
                        .and_then(|c| c.get(1).or_else(|| c.get(0)))
                        .map(|m| Value::Text(m.as_str().to_string()))
                        .unwrap_or(Value::Absent),
                    _ => Value::Absent,
                })
                .collect();
            let extracted_name = format!("{}_extracted", column_name);
            let new_col = Column::new(&extracted_name, values);
            if let Some(existing) = columns.iter().position(|c| c.name == extracted_name) {
                columns[existing] = new_col;
            } else {
                columns.push(new_col);
            }
        }
        other => {
            return Err(DataflowError::config_missing(&format!("op (unknown '{}')", other)));
        }
    }

    Ok(Table::from_columns(columns))
}

fn map_text(v: &Value, f: impl FnOnce(String) -> String) -> Value {
    match v {
        Value::Text(s) => Value::Text(f(s.clone())),
        Value::Absent => Value::Absent,
        other => Value::Text(f(other.display_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};

    fn names() -> Table {
        Table::from_columns(vec![Column::new("name", vec![Value::Text("  Hello World  ".into())])])
    }

    #[test]
    fn trim_strips_whitespace() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![names()], &serde_json::json!({"column": "name", "op": "trim"}), &mut ctx).unwrap();
        assert_eq!(out.get(0, "name").unwrap().display_text(), "Hello World");
    }

    #[test]
    fn replace_uses_regex_substitution() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"column": "name", "op": "replace", "pattern": "World", "replacement": "Rust"});
        let out = run(vec![names()], &config, &mut ctx).unwrap();
        assert_eq!(out.get(0, "name").unwrap().display_text(), "  Hello Rust  ");
    }

    #[test]
    fn extract_writes_to_suffixed_column() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"column": "name", "op": "extract", "pattern": "(World)"});
        let out = run(vec![names()], &config, &mut ctx).unwrap();
        assert_eq!(out.get(0, "name_extracted").unwrap().display_text(), "World");
    }
}
