//! `output_csv`: same contract as `output`, routed to the CSV writer by
//! `ArtifactSink` instead of the spreadsheet writer.

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::Table;
use serde_json::Value as Json;

pub fn run(inputs: Vec<Table>, _config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};
    use dataflow_table::Column;

    #[test]
    fn passes_its_single_input_through_unchanged() {
        let table = Table::from_columns(vec![Column::new("x", vec![dataflow_table::Value::Integer(1)])]);
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(vec![table], &serde_json::json!({}), &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 1);
    }
}
