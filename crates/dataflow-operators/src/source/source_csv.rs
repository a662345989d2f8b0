//! `source_csv`: reads a delimited text file through the Input File
//! Registry.

use crate::config::opt_str_or;
use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::io::csv::read_csv;
use dataflow_table::Table;
use serde_json::Value;

pub fn run(config: &Value, ctx: &mut OperatorContext) -> Result<Table> {
    let file_id = crate::config::opt_str(config, "file_id").ok_or_else(|| DataflowError::config_missing("file_id"))?;
    let path = ctx
        .file_registry
        .resolve(file_id, ctx.caller_identity)
        .ok_or_else(|| DataflowError::file_not_found(file_id))?;

    let delimiter = opt_str_or(config, "delimiter", ",").as_bytes().first().copied().unwrap_or(b',');
    let encoding = opt_str_or(config, "encoding", "utf-8");
    let row_limit = if ctx.preview { ctx.source_row_limit } else { None };

    Ok(read_csv(&path, delimiter, encoding, row_limit)?)
}
