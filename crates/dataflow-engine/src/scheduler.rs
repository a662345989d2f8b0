//! The scheduler: drives topological execution and single-node
//! preview over a normalized `Graph`, dispatching to operators through
//! the `OperatorRunner` boundary trait.

use crate::constants::RECONCILE_DIFF;
use crate::context::ExecutionContext;
use crate::error::{DataflowError, ErrorCategory};
use crate::graph::{Graph, RawWorkflow};
use crate::report::{ErrorDetail, ExecutionReport, NodeResult, NodeStatus, PreviewReport, PreviewWindow, EXECUTION_SINK_PREVIEW_ROWS};
use crate::traits::{ArtifactSink, FileRegistry, LogLevel, ModelClient, OperatorContext, OperatorRunner};
use crate::validation::{ancestor_closure, topological_order, topological_order_subset};
use dataflow_table::Table;
use std::collections::HashMap;

/// The first 20 rows `ai_agent` is bounded to; kept here
/// since both the scheduler's preview refusal and the operator's own
/// row bound need to agree on the same contract.
pub const AI_AGENT_MAX_ROWS: usize = 20;

pub struct Scheduler<'a> {
    pub operators: &'a dyn OperatorRunner,
    pub sink: &'a dyn ArtifactSink,
    pub file_registry: &'a dyn FileRegistry,
    pub model_client: &'a dyn ModelClient,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        operators: &'a dyn OperatorRunner,
        sink: &'a dyn ArtifactSink,
        file_registry: &'a dyn FileRegistry,
        model_client: &'a dyn ModelClient,
    ) -> Self {
        Self {
            operators,
            sink,
            file_registry,
            model_client,
        }
    }

    pub fn execute(&self, workflow: RawWorkflow, caller_identity: &str) -> ExecutionReport {
        let mut ctx = ExecutionContext::new();

        let graph = match Graph::normalize(workflow) {
            Ok(g) => g,
            Err(e) => return failed_execution_report(e, ctx.into_logs()),
        };

        let order = match topological_order(&graph) {
            Ok(o) => o,
            Err(e) => return failed_execution_report(e, ctx.into_logs()),
        };

        let mut node_status: HashMap<String, NodeStatus> = graph
            .nodes
            .iter()
            .map(|n| (n.id.clone(), NodeStatus::Pending))
            .collect();
        let mut node_results: HashMap<String, NodeResult> = HashMap::new();
        let mut output_file: Option<String> = None;
        let mut sink_preview: Option<PreviewWindow> = None;
        let mut failure: Option<DataflowError> = None;

        for node_id in &order {
            let node = graph.find_node(node_id).expect("topological order only names known nodes");

            if !self.operators.is_known(&node.node_type) {
                let err = DataflowError::new(
                    ErrorCategory::GraphStructure,
                    format!("unknown node type '{}'", node.node_type),
                )
                .with_node(node.id.clone());
                node_status.insert(node.id.clone(), NodeStatus::Error);
                node_results.insert(node.id.clone(), error_result(&err));
                failure = Some(err);
                break;
            }

            let inputs: Vec<Table> = graph
                .incoming_edges(node_id)
                .filter_map(|e| ctx.get(&e.source).cloned())
                .collect();

            let (tables_so_far, mut log_handle) = ctx.split_for_operator();
            let mut log_sink = |level: LogLevel, message: String| {
                log_handle.log(level.as_str(), message);
            };
            let mut op_ctx = OperatorContext::new(
                self.file_registry,
                self.model_client,
                caller_identity,
                false,
                None,
                tables_so_far,
                &mut log_sink,
            );

            match self
                .operators
                .run(&node.node_type, inputs, &node.config, &mut op_ctx)
            {
                Ok(table) => {
                    if self.operators.is_sink(&node.node_type) {
                        match self.sink.write(&table, &node.node_type, &node.config) {
                            Ok(name) => {
                                output_file = Some(name);
                                sink_preview = Some(sink_preview_window(&table));
                            }
                            Err(e) => {
                                let e = e.with_node(node.id.clone());
                                node_status.insert(node.id.clone(), NodeStatus::Error);
                                node_results.insert(node.id.clone(), error_result(&e));
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                    node_status.insert(node.id.clone(), NodeStatus::Success);
                    node_results.insert(node.id.clone(), table_result(&table));
                    ctx.insert(node.id.clone(), table);
                }
                Err(e) => {
                    let e = e.with_node(node.id.clone()).with_trace(format!("node:{}", node.id));
                    node_status.insert(node.id.clone(), NodeStatus::Error);
                    node_results.insert(node.id.clone(), error_result(&e));
                    failure = Some(e);
                    break;
                }
            }
        }

        ExecutionReport {
            success: failure.is_none(),
            error: failure.as_ref().map(ErrorDetail::from),
            output_file,
            preview: sink_preview,
            logs: ctx.into_logs(),
            node_status,
            node_results,
        }
    }

    pub fn preview_node(
        &self,
        workflow: RawWorkflow,
        node_id: &str,
        source_rows: usize,
        display_rows: usize,
        caller_identity: &str,
    ) -> PreviewReport {
        let mut ctx = ExecutionContext::new();

        let graph = match Graph::normalize(workflow) {
            Ok(g) => g,
            Err(e) => return failed_preview_report(e, ctx.into_logs()),
        };

        if graph.find_node(node_id).is_none() {
            let err = DataflowError::new(ErrorCategory::GraphStructure, format!("unknown node id '{}'", node_id));
            return failed_preview_report(err, ctx.into_logs());
        }

        let subset = ancestor_closure(&graph, node_id);
        let order = match topological_order_subset(&graph, &subset) {
            Ok(o) => o,
            Err(e) => return failed_preview_report(e, ctx.into_logs()),
        };

        let mut node_status: HashMap<String, NodeStatus> = subset
            .iter()
            .map(|id| (id.clone(), NodeStatus::Pending))
            .collect();
        let mut node_results: HashMap<String, NodeResult> = HashMap::new();
        let mut failure: Option<DataflowError> = None;
        let mut final_table: Option<Table> = None;
        let mut final_type: Option<String> = None;

        for id in &order {
            let node = graph.find_node(id).expect("subset order only names known nodes");

            if self.operators.is_ai(&node.node_type) {
                let err = DataflowError::preview_unsupported(&node.node_type).with_node(node.id.clone());
                node_status.insert(node.id.clone(), NodeStatus::Error);
                node_results.insert(node.id.clone(), error_result(&err));
                failure = Some(err);
                break;
            }
            if !self.operators.is_known(&node.node_type) {
                let err = DataflowError::new(
                    ErrorCategory::GraphStructure,
                    format!("unknown node type '{}'", node.node_type),
                )
                .with_node(node.id.clone());
                node_status.insert(node.id.clone(), NodeStatus::Error);
                node_results.insert(node.id.clone(), error_result(&err));
                failure = Some(err);
                break;
            }

            let inputs: Vec<Table> = graph
                .incoming_edges(id)
                .filter_map(|e| ctx.get(&e.source).cloned())
                .collect();

            let (tables_so_far, mut log_handle) = ctx.split_for_operator();
            let mut log_sink = |level: LogLevel, message: String| {
                log_handle.log(level.as_str(), message);
            };
            let mut op_ctx = OperatorContext::new(
                self.file_registry,
                self.model_client,
                caller_identity,
                true,
                Some(source_rows),
                tables_so_far,
                &mut log_sink,
            );

            match self
                .operators
                .run(&node.node_type, inputs, &node.config, &mut op_ctx)
            {
                Ok(table) => {
                    node_status.insert(node.id.clone(), NodeStatus::Success);
                    node_results.insert(node.id.clone(), table_result(&table));
                    if id == node_id {
                        final_type = Some(node.node_type.clone());
                        final_table = Some(table.clone());
                    }
                    ctx.insert(node.id.clone(), table);
                }
                Err(e) => {
                    let e = e.with_node(node.id.clone()).with_trace(format!("node:{}", node.id));
                    node_status.insert(node.id.clone(), NodeStatus::Error);
                    node_results.insert(node.id.clone(), error_result(&e));
                    failure = Some(e);
                    break;
                }
            }
        }

        let (stats, preview) = match (&final_table, &final_type) {
            (Some(table), Some(node_type)) => (
                Some(self.operators.stats(node_type, table)),
                Some(preview_window(node_type, table, display_rows)),
            ),
            _ => (None, None),
        };

        PreviewReport {
            success: failure.is_none(),
            error: failure.as_ref().map(ErrorDetail::from),
            logs: ctx.into_logs(),
            node_status,
            node_results,
            node_id: Some(node_id.to_string()),
            node_type: final_type,
            stats,
            preview,
        }
    }
}

fn table_result(table: &Table) -> NodeResult {
    NodeResult::Table {
        columns: table.column_names(),
        data: table.to_json_rows(),
        total_rows: table.num_rows(),
    }
}

/// The capped sample attached to `ExecutionReport.preview` when a sink
/// fires; unlike `table_result`'s `node_results` entry, this never
/// carries more than `EXECUTION_SINK_PREVIEW_ROWS` rows.
fn sink_preview_window(table: &Table) -> PreviewWindow {
    let sample = table.prefix(EXECUTION_SINK_PREVIEW_ROWS);
    PreviewWindow {
        columns: sample.column_names(),
        data: sample.to_json_rows(),
        total_rows: table.num_rows(),
    }
}

fn error_result(e: &DataflowError) -> NodeResult {
    NodeResult::Error {
        error: ErrorDetail::from(e),
        traceback: e.trace.clone(),
    }
}

fn failed_execution_report(e: DataflowError, logs: Vec<crate::context::LogEntry>) -> ExecutionReport {
    ExecutionReport {
        success: false,
        error: Some(ErrorDetail::from(&e)),
        output_file: None,
        preview: None,
        logs,
        node_status: HashMap::new(),
        node_results: HashMap::new(),
    }
}

fn failed_preview_report(e: DataflowError, logs: Vec<crate::context::LogEntry>) -> PreviewReport {
    PreviewReport {
        success: false,
        error: Some(ErrorDetail::from(&e)),
        logs,
        node_status: HashMap::new(),
        node_results: HashMap::new(),
        node_id: None,
        node_type: None,
        stats: None,
        preview: None,
    }
}

/// The display window: for `reconcile`, biased toward rows exceeding
/// tolerance and sorted by descending absolute difference; otherwise the
/// plain prefix.
fn preview_window(node_type: &str, table: &Table, display_rows: usize) -> PreviewWindow {
    let windowed = if node_type == "reconcile" && table.has_column(RECONCILE_DIFF) {
        let mut indices: Vec<usize> = (0..table.num_rows()).collect();
        indices.sort_by(|&a, &b| {
            let da = table.get(a, RECONCILE_DIFF).and_then(|v| v.as_f64()).unwrap_or(0.0).abs();
            let db = table.get(b, RECONCILE_DIFF).and_then(|v| v.as_f64()).unwrap_or(0.0).abs();
            db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
        });
        indices.truncate(display_rows);
        table.rows_at(&indices)
    } else {
        table.prefix(display_rows)
    };

    PreviewWindow {
        columns: table.column_names(),
        data: windowed.to_json_rows(),
        total_rows: table.num_rows(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RawWorkflow;
    use dataflow_table::{Column, Value};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct NoFiles;
    impl FileRegistry for NoFiles {
        fn resolve(&self, _file_id: &str, _caller_identity: &str) -> Option<PathBuf> {
            None
        }
    }

    struct NoModel;
    impl ModelClient for NoModel {
        fn complete(&self, _prompt: &str) -> crate::Result<String> {
            Err(DataflowError::new(ErrorCategory::RemoteUnavailable, "no model in tests"))
        }
    }

    /// Builds a fixed 3-row table for `source` nodes, echoes its single
    /// input otherwise. Enough operator surface to drive the scheduler
    /// without depending on the operator library crate.
    struct StubOperators;
    impl OperatorRunner for StubOperators {
        fn run(&self, node_type: &str, inputs: Vec<Table>, _config: &serde_json::Value, _ctx: &mut OperatorContext) -> crate::Result<Table> {
            match node_type {
                "source" => Ok(Table::from_columns(vec![Column::new(
                    "n",
                    (1..=3).map(Value::Integer).collect(),
                )])),
                "output" => inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0)),
                other => Err(DataflowError::new(ErrorCategory::GraphStructure, format!("unknown node type '{}'", other))),
            }
        }

        fn is_known(&self, node_type: &str) -> bool {
            matches!(node_type, "source" | "output")
        }
    }

    struct RecordingSink {
        written: Mutex<Vec<String>>,
    }
    impl RecordingSink {
        fn new() -> Self {
            Self { written: Mutex::new(Vec::new()) }
        }
    }
    impl ArtifactSink for RecordingSink {
        fn write(&self, _table: &Table, _node_type: &str, _config: &serde_json::Value) -> crate::Result<String> {
            let name = "output_test.xlsx".to_string();
            self.written.lock().unwrap().push(name.clone());
            Ok(name)
        }
    }

    fn linear_workflow() -> RawWorkflow {
        serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "src", "type": "source", "config": {}},
                {"id": "out", "type": "output", "config": {}}
            ],
            "edges": [
                {"source": "src", "target": "out"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn execute_attaches_a_capped_preview_when_a_sink_fires() {
        let operators = StubOperators;
        let sink = RecordingSink::new();
        let files = NoFiles;
        let model = NoModel;
        let scheduler = Scheduler::new(&operators, &sink, &files, &model);

        let report = scheduler.execute(linear_workflow(), "tester");

        assert!(report.success);
        assert_eq!(report.output_file.as_deref(), Some("output_test.xlsx"));
        let preview = report.preview.expect("sink node should attach a preview");
        assert_eq!(preview.total_rows, 3);
        assert_eq!(preview.data.len(), 3);
        assert!(sink.written.lock().unwrap().len() == 1);
    }

    #[test]
    fn execute_leaves_preview_unset_without_a_sink_node() {
        let operators = StubOperators;
        let sink = RecordingSink::new();
        let files = NoFiles;
        let model = NoModel;
        let scheduler = Scheduler::new(&operators, &sink, &files, &model);

        let workflow: RawWorkflow = serde_json::from_value(serde_json::json!({
            "nodes": [{"id": "src", "type": "source", "config": {}}],
            "edges": []
        }))
        .unwrap();

        let report = scheduler.execute(workflow, "tester");
        assert!(report.success);
        assert!(report.preview.is_none());
        assert!(report.output_file.is_none());
    }
}
