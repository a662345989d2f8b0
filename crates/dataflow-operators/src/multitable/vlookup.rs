//! `vlookup`: 2 inputs `(main, lookup)` — fetch columns from a lookup
//! table by key, defaulting to every lookup column not already present
//! in `main`.

use dataflow_engine::{DataflowError, LogLevel, OperatorContext, Result};
use dataflow_table::{JoinHow, Table};
use serde_json::Value;

pub fn run(inputs: Vec<Table>, config: &Value, ctx: &mut OperatorContext) -> Result<Table> {
    if inputs.len() != 2 {
        return Err(DataflowError::arity(2, inputs.len()));
    }
    let mut iter = inputs.into_iter();
    let main = iter.next().unwrap();
    let lookup = iter.next().unwrap();

    let shared = crate::config::opt_str(config, "lookup_key");
    let left_key = shared
        .or_else(|| crate::config::opt_str(config, "left_key"))
        .ok_or_else(|| DataflowError::config_missing("left_key"))?;
    let right_key = shared
        .or_else(|| crate::config::opt_str(config, "right_key"))
        .ok_or_else(|| DataflowError::config_missing("right_key"))?;

    let lookup_names = lookup.column_names();
    let main_names = main.column_names();

    let requested = crate::config::opt_str_list(config, "columns_to_get");
    let columns_to_get: Vec<String> = if requested.is_empty() {
        lookup_names
            .iter()
            .filter(|c| c.as_str() != right_key && !main_names.contains(c))
            .cloned()
            .collect()
    } else {
        requested
            .into_iter()
            .filter(|c| {
                if lookup_names.contains(c) {
                    true
                } else {
                    ctx.log(
                        LogLevel::Warn,
                        format!("vlookup: column '{}' not found in lookup table, ignoring", c),
                    );
                    false
                }
            })
            .collect()
    };

    let mut select_cols = vec![right_key.to_string()];
    select_cols.extend(columns_to_get);
    let lookup_subset = lookup.select(&select_cols)?;

    Ok(main.merge(&lookup_subset, &[left_key.to_string()], &[right_key.to_string()], JoinHow::Left)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::Column;

    fn main_table() -> Table {
        Table::from_columns(vec![
            Column::new("sku", vec![dataflow_table::Value::Integer(1), dataflow_table::Value::Integer(2)]),
            Column::new("qty", vec![dataflow_table::Value::Integer(10), dataflow_table::Value::Integer(5)]),
        ])
    }

    fn lookup_table() -> Table {
        Table::from_columns(vec![
            Column::new("sku", vec![dataflow_table::Value::Text("1".into()), dataflow_table::Value::Text("2".into())]),
            Column::new("name", vec![dataflow_table::Value::Text("Widget".into()), dataflow_table::Value::Text("Gadget".into())]),
            Column::new("price", vec![dataflow_table::Value::Real(9.99), dataflow_table::Value::Real(19.99)]),
        ])
    }

    #[test]
    fn defaults_to_every_non_key_non_collision_lookup_column() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"lookup_key": "sku"});
        let out = run(vec![main_table(), lookup_table()], &config, &mut ctx).unwrap();
        assert!(out.has_column("name"));
        assert!(out.has_column("price"));
        assert_eq!(out.get(0, "name").unwrap().display_text(), "Widget");
    }

    #[test]
    fn unknown_requested_column_is_ignored_with_a_warning() {
        let files = NoFiles;
        let model = NoModel;
        let mut warnings = Vec::new();
        let mut log = |_l, m: String| warnings.push(m);
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"lookup_key": "sku", "columns_to_get": ["name", "nonexistent"]});
        let out = run(vec![main_table(), lookup_table()], &config, &mut ctx).unwrap();
        assert!(out.has_column("name"));
        assert!(!out.has_column("nonexistent"));
        assert!(warnings.iter().any(|w| w.contains("nonexistent")));
    }
}
