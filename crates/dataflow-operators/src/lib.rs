//! Tabular operator library for the dataflow execution engine.
//!
//! Operators are grouped by category, one module per operator: source,
//! clean/transform, analyze, multi-table, domain (profit/reconcile),
//! custom-code, AI, and sink. [`registry`]
//! exposes the single `OperatorRunner` implementation the scheduler
//! dispatches through; everything else is implementation detail reachable
//! only via that dispatch or directly for testing.

pub mod ai;
pub mod analyze;
pub mod code;
pub mod config;
pub mod multitable;
pub mod profit;
pub mod registry;
pub mod sink;
pub mod source;
pub mod transform;

pub use registry::OperatorRegistry;
