//! `code`: a user-authored snippet run inside a `rhai` sandbox exposing
//! `inputs`, `df`, `pd`, and `config`, expected to assign its output to
//! `result`. The sandbox is not a security boundary;
//! the boundary adapter decides whether to enable this operator at all.
//!
//! Each call gets a single shared `rhai` `Scope` rather than a split
//! globals/locals pair — there is no cross-call state to preserve.

use dataflow_engine::{DataflowError, ErrorCategory, OperatorContext, Result};
use dataflow_table::{Table, Value};
use rhai::{Array, Dynamic, Engine, Map, Module, Scope, Shared, AST};
use serde_json::Value as Json;

/// `Table` as seen from sandboxed snippets: a thin, read-mostly handle.
#[derive(Clone)]
struct ScriptTable(Table);

fn value_to_dynamic(v: &Value) -> Dynamic {
    match v {
        Value::Integer(n) => Dynamic::from(*n),
        Value::Real(n) => Dynamic::from(*n),
        Value::Text(s) => Dynamic::from(s.clone()),
        Value::Boolean(b) => Dynamic::from(*b),
        Value::Timestamp(_) | Value::Date(_) => Dynamic::from(v.display_text()),
        Value::Absent => Dynamic::UNIT,
    }
}

fn json_to_dynamic(v: &Json) -> Dynamic {
    match v {
        Json::Null => Dynamic::UNIT,
        Json::Bool(b) => Dynamic::from(*b),
        Json::Number(n) => n.as_i64().map(Dynamic::from).unwrap_or_else(|| Dynamic::from(n.as_f64().unwrap_or(0.0))),
        Json::String(s) => Dynamic::from(s.clone()),
        Json::Array(items) => Dynamic::from(items.iter().map(json_to_dynamic).collect::<Array>()),
        Json::Object(map) => {
            let mut m = Map::new();
            for (k, v) in map {
                m.insert(k.as_str().into(), json_to_dynamic(v));
            }
            Dynamic::from(m)
        }
    }
}

fn register_table_type(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptTable>("Table")
        .register_fn("num_rows", |t: &mut ScriptTable| t.0.num_rows() as i64)
        .register_fn("num_columns", |t: &mut ScriptTable| t.0.num_columns() as i64)
        .register_fn("column_names", |t: &mut ScriptTable| t.0.column_names().into_iter().map(Dynamic::from).collect::<Array>())
        .register_fn("get", |t: &mut ScriptTable, row: i64, col: &str| t.0.get(row as usize, col).map(value_to_dynamic).unwrap_or(Dynamic::UNIT))
        .register_fn("select", |t: &mut ScriptTable, names: Array| -> Result<ScriptTable, Box<rhai::EvalAltResult>> {
            let names: Vec<String> = names.into_iter().map(|d| d.to_string()).collect();
            t.0.select(&names).map(ScriptTable).map_err(|e| e.to_string().into())
        })
        .register_fn("filter", |t: &mut ScriptTable, expr: &str| -> Result<ScriptTable, Box<rhai::EvalAltResult>> {
            let parsed = dataflow_table::expr::parse_filter(expr, &t.0.column_names()).map_err(|e| e.to_string())?;
            t.0.filter_expr(&parsed, &std::collections::HashMap::new()).map(ScriptTable).map_err(|e| e.to_string().into())
        });
}

fn pd_module() -> Module {
    let mut module = Module::new();
    module.set_native_fn("concat", |tables: Array| -> Result<ScriptTable, Box<rhai::EvalAltResult>> {
        let tables: Vec<Table> = tables
            .into_iter()
            .map(|d| d.try_cast::<ScriptTable>().map(|t| t.0).ok_or_else(|| "pd.concat expects a list of tables".to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let refs: Vec<&Table> = tables.iter().collect();
        Ok(ScriptTable(Table::concat(&refs, dataflow_table::ConcatJoin::Outer, true)))
    });
    module
}

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let code = crate::config::require_str(config, "code").or_else(|_| crate::config::require_str(config, "python_code"))?;

    let mut engine = Engine::new();
    register_table_type(&mut engine);
    engine.register_static_module("pd", Shared::new(pd_module()));

    let mut scope = Scope::new();
    let input_dynamics: Array = inputs.iter().cloned().map(|t| Dynamic::from(ScriptTable(t))).collect();
    scope.push("inputs", input_dynamics);
    scope.push("df", inputs.first().cloned().map(ScriptTable).map(Dynamic::from).unwrap_or(Dynamic::UNIT));
    scope.push("config", json_to_dynamic(config));

    let ast: AST = engine
        .compile(code)
        .map_err(|e| DataflowError::new(ErrorCategory::OperatorCodeBadOutput, format!("code node failed to parse: {}", e)))?;
    engine
        .run_ast_with_scope(&mut scope, &ast)
        .map_err(|e| DataflowError::new(ErrorCategory::OperatorCodeBadOutput, format!("code node raised: {}", e)))?;

    let result = scope
        .get_value::<Dynamic>("result")
        .ok_or_else(|| DataflowError::new(ErrorCategory::OperatorCodeBadOutput, "code node did not assign a value to `result`"))?;

    result
        .try_cast::<ScriptTable>()
        .map(|t| t.0)
        .ok_or_else(|| DataflowError::new(ErrorCategory::OperatorCodeBadOutput, "code node's `result` is not a table"))
}
