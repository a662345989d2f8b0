//! Boundary traits the host supplies at engine construction time,
//! forming the dependency-inversion seam between the scheduler and the
//! operator library: `dataflow-engine` defines `OperatorRunner`,
//! `dataflow-operators` implements it, and `dataflow-service` wires the
//! two together. This keeps operator dispatch out of the engine crate
//! without the engine depending on the operator library.

use crate::error::Result;
use dataflow_table::Table;
use std::collections::HashMap;
use std::path::PathBuf;

/// Resolves an opaque `file_id` to a filesystem path. The engine treats
/// the registry as read-only and the path as opaque.
pub trait FileRegistry: Send + Sync {
    fn resolve(&self, file_id: &str, caller_identity: &str) -> Option<PathBuf>;
}

/// A per-call remote model client for the `ai_agent` operator. The engine
/// holds no long-lived handle; an implementation is expected to create
/// per-call clients and apply the 60s per-call timeout.
pub trait ModelClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Severity for the operator-visible log capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Everything an operator needs beyond its own `(inputs, config)`: the
/// boundary collaborators, preview-mode flags, and the log capability.
pub struct OperatorContext<'a> {
    pub file_registry: &'a dyn FileRegistry,
    pub model_client: &'a dyn ModelClient,
    pub caller_identity: &'a str,
    pub preview: bool,
    /// Row cap sources must honor while in preview mode (`source_rows`).
    pub source_row_limit: Option<usize>,
    /// The execution-so-far's results, keyed by node id — lets an operator
    /// that takes more than one named upstream (e.g. `profit_summary`)
    /// resolve a config-declared node id directly instead of relying only
    /// on positional fan-in order.
    execution: &'a HashMap<String, Table>,
    log: &'a mut dyn FnMut(LogLevel, String),
}

impl<'a> OperatorContext<'a> {
    pub fn new(
        file_registry: &'a dyn FileRegistry,
        model_client: &'a dyn ModelClient,
        caller_identity: &'a str,
        preview: bool,
        source_row_limit: Option<usize>,
        execution: &'a HashMap<String, Table>,
        log: &'a mut dyn FnMut(LogLevel, String),
    ) -> Self {
        Self {
            file_registry,
            model_client,
            caller_identity,
            preview,
            source_row_limit,
            execution,
            log,
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        (self.log)(level, message.into());
    }

    /// Looks up a node's already-computed table by id, regardless of
    /// whether it's wired to the current node's incoming edges. Used by
    /// operators whose config names upstream nodes directly (spec.md §4.4
    /// `profit_summary`'s `income_node_id`/`cost_node_id`/`expense_node_id`).
    pub fn get(&self, node_id: &str) -> Option<&Table> {
        self.execution.get(node_id)
    }
}

/// The closed dispatch table for operator node types. One implementation
/// lives in `dataflow-operators`; the scheduler only ever calls through this
/// trait, never matches on operator type strings itself except to ask
/// `is_sink`/`is_ai`.
pub trait OperatorRunner: Send + Sync {
    fn run(
        &self,
        node_type: &str,
        inputs: Vec<Table>,
        config: &serde_json::Value,
        ctx: &mut OperatorContext,
    ) -> Result<Table>;

    /// Whether `node_type` is a known operator at all (distinguishes
    /// `graph_structure` "unknown node type" from other failures).
    fn is_known(&self, node_type: &str) -> bool;

    fn is_sink(&self, node_type: &str) -> bool {
        matches!(node_type, "output" | "output_csv")
    }

    fn is_ai(&self, node_type: &str) -> bool {
        node_type == "ai_agent"
    }

    /// Operator-specific preview statistics. Default: none.
    fn stats(&self, _node_type: &str, _table: &Table) -> serde_json::Value {
        serde_json::json!({})
    }
}

/// Resolves the final filename, appends the extension, and writes
/// the table. Implemented by `dataflow-service`.
pub trait ArtifactSink: Send + Sync {
    fn write(&self, table: &Table, node_type: &str, config: &serde_json::Value) -> Result<String>;
}
