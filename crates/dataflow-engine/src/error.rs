//! The error taxonomy.
//!
//! Operators fail via this abstract error value, carrying a category tag
//! plus a message. The scheduler catches at the operator boundary, records
//! per-node status/detail (including a call-site trace breadcrumb), and
//! never panics: unexpected failures are turned into `Internal`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataflowError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    GraphStructure,
    GraphCyclic,
    OperatorConfigMissing,
    OperatorColumnMissing,
    OperatorArity,
    FileNotFound,
    OperatorCodeBadOutput,
    SinkIo,
    RemoteUnavailable,
    PreviewUnsupported,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::GraphStructure => "graph_structure",
            ErrorCategory::GraphCyclic => "graph_cyclic",
            ErrorCategory::OperatorConfigMissing => "operator_config_missing",
            ErrorCategory::OperatorColumnMissing => "operator_column_missing",
            ErrorCategory::OperatorArity => "operator_arity",
            ErrorCategory::FileNotFound => "file_not_found",
            ErrorCategory::OperatorCodeBadOutput => "operator_code_bad_output",
            ErrorCategory::SinkIo => "sink_io",
            ErrorCategory::RemoteUnavailable => "remote_unavailable",
            ErrorCategory::PreviewUnsupported => "preview_unsupported",
            ErrorCategory::Internal => "internal",
        }
    }
}

/// A structured, node-localizable failure.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{category:?}: {message}")]
pub struct DataflowError {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default)]
    pub trace: Vec<String>,
}

impl DataflowError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            node_id: None,
            trace: Vec::new(),
        }
    }

    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_trace(mut self, frame: impl Into<String>) -> Self {
        self.trace.push(frame.into());
        self
    }

    pub fn config_missing(key: &str) -> Self {
        Self::new(
            ErrorCategory::OperatorConfigMissing,
            format!("missing required config key '{}'", key),
        )
    }

    pub fn column_missing(name: &str, available: &[String]) -> Self {
        Self::new(
            ErrorCategory::OperatorColumnMissing,
            format!("column '{}' not found; available columns: {}", name, available.join(", ")),
        )
    }

    pub fn arity(expected: usize, found: usize) -> Self {
        Self::new(
            ErrorCategory::OperatorArity,
            format!("expected {} input table(s), found {}", expected, found),
        )
    }

    pub fn file_not_found(file_id: &str) -> Self {
        Self::new(ErrorCategory::FileNotFound, format!("no registry entry for file_id '{}'", file_id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, message)
    }

    pub fn sink_io(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::SinkIo, message)
    }

    pub fn preview_unsupported(node_type: &str) -> Self {
        Self::new(
            ErrorCategory::PreviewUnsupported,
            format!("'{}' does not participate in preview execution", node_type),
        )
    }
}

impl From<dataflow_table::TableError> for DataflowError {
    fn from(e: dataflow_table::TableError) -> Self {
        match e {
            dataflow_table::TableError::ColumnMissing(name, available) => DataflowError::new(
                ErrorCategory::OperatorColumnMissing,
                format!("column '{}' not found; available columns: {}", name, available),
            ),
            other => DataflowError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_missing_table_error_maps_to_operator_column_missing_category() {
        let table_err = dataflow_table::TableError::column_missing("foo", &["a".to_string(), "b".to_string()]);
        let err: DataflowError = table_err.into();
        assert_eq!(err.category, ErrorCategory::OperatorColumnMissing);
        assert!(err.message.contains("foo"));
        assert!(err.message.contains("a, b"));
    }

    #[test]
    fn other_table_errors_map_to_internal() {
        let table_err = dataflow_table::TableError::Invalid("bad shape".to_string());
        let err: DataflowError = table_err.into();
        assert_eq!(err.category, ErrorCategory::Internal);
    }

    #[test]
    fn with_node_and_with_trace_are_chainable_builders() {
        let err = DataflowError::arity(1, 0).with_node("n1").with_trace("frame1").with_trace("frame2");
        assert_eq!(err.node_id.as_deref(), Some("n1"));
        assert_eq!(err.trace, vec!["frame1".to_string(), "frame2".to_string()]);
    }

    #[test]
    fn category_as_str_is_snake_case() {
        assert_eq!(ErrorCategory::GraphCyclic.as_str(), "graph_cyclic");
        assert_eq!(ErrorCategory::OperatorCodeBadOutput.as_str(), "operator_code_bad_output");
    }
}
