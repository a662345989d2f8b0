//! `source`: reads a spreadsheet through the Input File Registry.

use crate::config::{opt_str, opt_u64};
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::io::xlsx::{read_xlsx, SheetRef};
use dataflow_table::Table;
use serde_json::Value;

pub fn run(config: &Value, ctx: &mut OperatorContext) -> Result<Table> {
    let file_id = opt_str(config, "file_id").ok_or_else(|| DataflowError::config_missing("file_id"))?;
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
