//! `source_optional`: like `source`, but tolerates an absent `file_id`
//! by producing an empty table instead of failing — used
//! where an upstream branch is genuinely optional, e.g. `profit_summary`
//! feeder graphs missing a cost/expense leg.

use crate::config::opt_u64;
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::io::xlsx::{read_xlsx, SheetRef};
use dataflow_table::Table;
use serde_json::Value;

pub fn run(config: &Value, ctx: &mut OperatorContext) -> Result<Table> {
    let file_id = match crate::config::opt_str(config, "file_id") {
        Some(id) => id,
        None => return Ok(Table::empty()),
    };
    let path = ctx
        .file_registry
        .resolve(file_id, ctx.caller_identity)
        .ok_or_else(|| DataflowError::file_not_found(file_id))?;

    let sheet = SheetRef::from_config(config.get("sheet_name"));
    let header_row = opt_u64(config, "header_row", 1) as usize;
    let skip_rows = opt_u64(config, "skip_rows", 0) as usize;
    let row_limit = if ctx.preview { ctx.source_row_limit } else { None };

    Ok(read_xlsx(&path, &sheet, header_row, skip_rows, row_limit)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, NoFiles, NoModel};

    #[test]
    fn absent_file_id_yields_empty_table_instead_of_failing() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let out = run(&serde_json::json!({}), &mut ctx).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.num_columns(), 0);
    }

    #[test]
    fn present_but_unresolvable_file_id_still_fails() {
        let files = NoFiles;
        let model = NoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let err = run(&serde_json::json!({"file_id": "ghost"}), &mut ctx).unwrap_err();
        assert_eq!(err.category, dataflow_engine::ErrorCategory::FileNotFound);
    }
}
