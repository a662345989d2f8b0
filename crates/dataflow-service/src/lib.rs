//! Host-agnostic facade: wires the scheduler from `dataflow-engine`
//! to the operator registry from `dataflow-operators` and to concrete,
//! filesystem/HTTP implementations of the boundary traits the engine
//! otherwise leaves abstract. A host embeds this crate and calls
//! `execute`/`preview_node`; it owns routing, multi-tenant identity, and
//! persistence on its own side.

pub mod file_registry;
pub mod model_client;
pub mod sink;

pub use file_registry::{FilesystemFileRegistry, StaticFileRegistry};
pub use model_client::{DisabledModelClient, HttpModelClient};
pub use sink::LocalArtifactSink;

use dataflow_engine::{ExecutionReport, FileRegistry, ModelClient, PreviewReport, RawWorkflow, Scheduler};
use dataflow_operators::OperatorRegistry;

/// Default row cap a preview source read honors when the caller doesn't
/// specify one; this is left host-configurable.
pub const DEFAULT_PREVIEW_SOURCE_ROWS: usize = 500;
/// Default display window size for a preview response.
pub const DEFAULT_PREVIEW_DISPLAY_ROWS: usize = 50;

/// The engine instance a host constructs once and calls through for every
/// execution. Holds no execution-specific state; `execute`/`preview_node`
/// each get their own `ExecutionContext` internally.
pub struct DataflowService {
    operators: OperatorRegistry,
    sink: LocalArtifactSink,
    file_registry: Box<dyn FileRegistry>,
    model_client: Box<dyn ModelClient>,
}

impl DataflowService {
    pub fn new(output_dir: impl Into<std::path::PathBuf>, file_registry: Box<dyn FileRegistry>, model_client: Box<dyn ModelClient>) -> Self {
        Self {
            operators: OperatorRegistry::new(),
            sink: LocalArtifactSink::new(output_dir),
            file_registry,
            model_client,
        }
    }

    /// Convenience constructor for hosts that have the AI operator
    /// disabled entirely — enabling remote-model access is a boundary
    /// configuration choice, the same way enabling the `code` sandbox is.
    pub fn without_ai(output_dir: impl Into<std::path::PathBuf>, file_registry: Box<dyn FileRegistry>) -> Self {
        Self::new(output_dir, file_registry, Box::new(DisabledModelClient))
    }

    pub fn execute(&self, workflow: RawWorkflow, caller_identity: &str) -> ExecutionReport {
        let scheduler = Scheduler::new(&self.operators, &self.sink, self.file_registry.as_ref(), self.model_client.as_ref());
        scheduler.execute(workflow, caller_identity)
    }

    pub fn preview_node(&self, workflow: RawWorkflow, node_id: &str, source_rows: Option<usize>, display_rows: Option<usize>, caller_identity: &str) -> PreviewReport {
        let scheduler = Scheduler::new(&self.operators, &self.sink, self.file_registry.as_ref(), self.model_client.as_ref());
        scheduler.preview_node(
            workflow,
            node_id,
            source_rows.unwrap_or(DEFAULT_PREVIEW_SOURCE_ROWS),
            display_rows.unwrap_or(DEFAULT_PREVIEW_DISPLAY_ROWS),
            caller_identity,
        )
    }
}
