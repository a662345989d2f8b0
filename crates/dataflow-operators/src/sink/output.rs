//! `output`: passes its input table through unchanged. The scheduler
//! recognizes `output` as a sink node and routes the resulting table to
//! `ArtifactSink::write` for filename resolution and the actual
//! spreadsheet write.

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::Table;
use serde_json::Value as Json;

pub fn run(inputs: Vec<Table>, _config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))
}
