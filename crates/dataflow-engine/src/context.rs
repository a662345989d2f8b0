//! The execution context: an append-only `node_id -> Table`
//! map plus a time-stamped log buffer operators can write to through the
//! `log` capability exposed on `OperatorContext`.

use dataflow_table::Table;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ExecutionContext {
    tables: HashMap<String, Table>,
    logs: Vec<LogEntry>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_id: impl Into<String>, table: Table) {
        self.tables.insert(node_id.into(), table);
    }

    pub fn get(&self, node_id: &str) -> Option<&Table> {
        self.tables.get(node_id)
    }

    pub fn log(&mut self, level: &str, message: impl Into<String>) {
        LogSink { logs: &mut self.logs }.log(level, message);
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<LogEntry> {
        self.logs
    }

    /// Splits into a read-only view of the tables inserted so far and a
    /// standalone log sink, so a caller can hold both without the borrow
    /// checker treating them as overlapping uses of the whole context —
    /// the scheduler needs the former for `OperatorContext::get` and the
    /// latter for the operator-visible `log` capability, at the same time.
    pub fn split_for_operator(&mut self) -> (&HashMap<String, Table>, LogSink<'_>) {
        (&self.tables, LogSink { logs: &mut self.logs })
    }
}

/// A standalone handle onto the log buffer, split off from `ExecutionContext`
/// so it can be held mutably alongside a read-only view of the tables map.
pub struct LogSink<'a> {
    logs: &'a mut Vec<LogEntry>,
}

impl<'a> LogSink<'a> {
    pub fn log(&mut self, level: &str, message: impl Into<String>) {
        let message = message.into();
        match level {
            "error" => log::error!("{}", message),
            "warn" => log::warn!("{}", message),
            "debug" => log::debug!("{}", message),
            _ => log::info!("{}", message),
        }
        self.logs.push(LogEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.to_string(),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataflow_table::Column;

    #[test]
    fn insert_and_get_round_trip_by_node_id() {
        let mut ctx = ExecutionContext::new();
        let table = Table::from_columns(vec![Column::new("x", vec![dataflow_table::Value::Integer(1)])]);
        ctx.insert("node1", table);
        assert!(ctx.get("node1").is_some());
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn log_defaults_unknown_levels_to_info_but_records_the_given_level_text() {
        let mut ctx = ExecutionContext::new();
        ctx.log("warn", "careful");
        ctx.log("whatever", "fallback path");
        let logs = ctx.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, "warn");
        assert_eq!(logs[0].message, "careful");
        assert_eq!(logs[1].level, "whatever");
    }

    #[test]
    fn into_logs_consumes_the_context() {
        let mut ctx = ExecutionContext::new();
        ctx.log("info", "one");
        let logs = ctx.into_logs();
        assert_eq!(logs.len(), 1);
    }
}
