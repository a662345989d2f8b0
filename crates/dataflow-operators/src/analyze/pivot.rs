//! `pivot` (long→wide) and `unpivot`/`melt` (wide→long).

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::{AggFunc, Table};
use serde_json::Value;

pub fn run(inputs: Vec<Table>, config: &Value, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let index = crate::config::require_str_or_list(config, "index")?;
    let columns = crate::config::require_str(config, "columns")?;
    let values = crate::config::require_str(config, "values")?;
    let aggfunc_name = crate::config::opt_str_or(config, "aggfunc", "first");
    let aggfunc = AggFunc::parse(aggfunc_name)
        .ok_or_else(|| DataflowError::config_missing(&format!("aggfunc (unknown '{}')", aggfunc_name)))?;

    Ok(table.pivot(&index, columns, values, aggfunc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::{Column, Value};

    #[test]
    fn pivots_long_to_wide_summing_values() {
        let table = Table::from_columns(vec![
            Column::new("store", vec![Value::Text("A".into()), Value::Text("A".into()), Value::Text("B".into())]),
            Column::new("month", vec![Value::Text("1".into()), Value::Text("2".into()), Value::Text("1".into())]),
            Column::new("amount", vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]),
        ]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"index": ["store"], "columns": "month", "values": "amount", "aggfunc": "sum"});
        let out = run(vec![table], &config, &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 2);
        assert!(out.has_column("1"));
        assert!(out.has_column("2"));
        let a_row = (0..out.num_rows()).find(|&r| out.get(r, "store").unwrap().display_text() == "A").unwrap();
        assert_eq!(out.get(a_row, "1").unwrap().as_f64(), Some(10.0));
        assert_eq!(out.get(a_row, "2").unwrap().as_f64(), Some(20.0));
    }
}
