//! The closed operator dispatch table: a static match over the
//! node-declared `type` string, one arm per operator. This is the single
//! implementation of `dataflow_engine::OperatorRunner`; the scheduler
//! never matches on type strings itself beyond `is_sink`/`is_ai`.

use dataflow_engine::{DataflowError, ErrorCategory, OperatorContext, OperatorRunner, Result};
use dataflow_table::Table;
use serde_json::Value as Json;

/// The full, closed set of `type` strings the engine recognizes.
const KNOWN_TYPES: &[&str] = &[
    "source",
    "source_csv",
    "source_optional",
    "transform",
    "type_convert",
    "fill_na",
    "deduplicate",
    "text_process",
    "date_process",
    "group_aggregate",
    "pivot",
    "unpivot",
    "join",
    "concat",
    "vlookup",
    "diff",
    "reconcile",
    "profit_income",
    "profit_cost",
    "profit_expense",
    "profit_summary",
    "profit_table",
    "code",
    "ai_agent",
    "output",
    "output_csv",
];

/// Zero-sized dispatcher; all state lives in the `OperatorContext`/table
/// arguments passed through on each call.
#[derive(Debug, Default, Clone, Copy)]
pub struct OperatorRegistry;

impl OperatorRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl OperatorRunner for OperatorRegistry {
    fn run(
        &self,
        node_type: &str,
        inputs: Vec<Table>,
        config: &Json,
        ctx: &mut OperatorContext,
    ) -> Result<Table> {
        match node_type {
            "source" => crate::source::source::run(config, ctx),
            "source_csv" => crate::source::source_csv::run(config, ctx),
            "source_optional" => crate::source::source_optional::run(config, ctx),

            "transform" => crate::transform::transform::run(inputs, config, ctx),
            "type_convert" => crate::transform::type_convert::run(inputs, config, ctx),
            "fill_na" => crate::transform::fill_na::run(inputs, config, ctx),
            "deduplicate" => crate::transform::deduplicate::run(inputs, config, ctx),
            "text_process" => crate::transform::text_process::run(inputs, config, ctx),
            "date_process" => crate::transform::date_process::run(inputs, config, ctx),

            "group_aggregate" => crate::analyze::group_aggregate::run(inputs, config, ctx),
            "pivot" => crate::analyze::pivot::run(inputs, config, ctx),
            "unpivot" => crate::analyze::unpivot::run(inputs, config, ctx),

            "join" => crate::multitable::join::run(inputs, config, ctx),
            "concat" => crate::multitable::concat::run(inputs, config, ctx),
            "vlookup" => crate::multitable::vlookup::run(inputs, config, ctx),
            "diff" => crate::multitable::diff::run(inputs, config, ctx),
            "reconcile" => crate::multitable::reconcile::run(inputs, config, ctx),

            "profit_income" => crate::profit::profit_income::run(inputs, config, ctx),
            "profit_cost" => crate::profit::profit_cost::run(inputs, config, ctx),
            "profit_expense" => crate::profit::profit_expense::run(inputs, config, ctx),
            "profit_summary" => crate::profit::profit_summary::run(inputs, config, ctx),
            "profit_table" => crate::profit::profit_table::run(inputs, config, ctx),

            "code" => crate::code::run(inputs, config, ctx),
            "ai_agent" => crate::ai::run(inputs, config, ctx),

            "output" => crate::sink::output::run(inputs, config, ctx),
            "output_csv" => crate::sink::output_csv::run(inputs, config, ctx),

            other => Err(DataflowError::new(
                ErrorCategory::GraphStructure,
                format!("unknown node type '{}'", other),
            )),
        }
    }

    fn is_known(&self, node_type: &str) -> bool {
        KNOWN_TYPES.contains(&node_type)
    }

    fn stats(&self, node_type: &str, table: &Table) -> Json {
        match node_type {
            "group_aggregate" | "pivot" | "unpivot" => serde_json::json!({
                "rows": table.num_rows(),
                "columns": table.num_columns(),
            }),
            "reconcile" => {
                let mismatches = (0..table.num_rows())
                    .filter(|&r| {
                        table
                            .get(r, dataflow_engine::constants::RECONCILE_RESULT)
                            .map(|v| v.display_text() == dataflow_engine::constants::RECONCILE_RESULT_MISMATCH)
                            .unwrap_or(false)
                    })
                    .count();
                serde_json::json!({
                    "rows": table.num_rows(),
                    "mismatches": mismatches,
                })
            }
            _ => serde_json::json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_node_types() {
        let registry = OperatorRegistry::new();
        assert!(!registry.is_known("frobnicate"));
        assert!(registry.is_known("join"));
    }

    #[test]
    fn recognizes_sinks_and_ai() {
        let registry = OperatorRegistry::new();
        assert!(registry.is_sink("output"));
        assert!(registry.is_sink("output_csv"));
        assert!(!registry.is_sink("join"));
        assert!(registry.is_ai("ai_agent"));
    }
}
