//! Report schema produced by the scheduler: `ExecutionReport`
//! from `execute`, `PreviewReport` from `preview_node`. Both are plain
//! serde-serializable data, never raised as errors — the scheduler itself
//! never panics and never returns `Err` for an operator failure; a failed
//! execution is a successfully-produced report with `success: false`.

use crate::context::LogEntry;
use crate::error::DataflowError;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Success,
    Error,
}

/// `node_results[id]`: either a table summary or an error detail,
/// depending on how the node fared.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NodeResult {
    Table {
        columns: Vec<String>,
        data: Vec<serde_json::Value>,
        total_rows: usize,
    },
    Error {
        error: ErrorDetail,
        traceback: Vec<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub category: String,
    pub message: String,
}

impl From<&DataflowError> for ErrorDetail {
    fn from(e: &DataflowError) -> Self {
        ErrorDetail {
            category: e.category.as_str().to_string(),
            message: e.message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewWindow>,
    pub logs: Vec<LogEntry>,
    pub node_status: HashMap<String, NodeStatus>,
    pub node_results: HashMap<String, NodeResult>,
}

/// The bounded sample of rows shown in a preview. `node_results` entries
/// always carry a node's full output; this window is the separate,
/// capped sample attached at the top level when a sink fires during
/// `execute`, or returned by `preview_node`.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewWindow {
    pub columns: Vec<String>,
    pub data: Vec<serde_json::Value>,
    pub total_rows: usize,
}

/// Row cap for the sink preview attached to `ExecutionReport`, distinct
/// from `preview_node`'s caller-supplied `display_rows`.
pub const EXECUTION_SINK_PREVIEW_ROWS: usize = 100;


#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    pub logs: Vec<LogEntry>,
    pub node_status: HashMap<String, NodeStatus>,
    pub node_results: HashMap<String, NodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewWindow>,
}
