//! `ai_agent`: a row-wise LLM call bounded to the first 20 rows,
//! substituting `{{column_name}}` placeholders into a prompt template.
//! Never participates in preview; the scheduler enforces that by
//! refusing the node before it ever reaches an operator.

use dataflow_engine::{OperatorContext, Result, AI_AGENT_MAX_ROWS};
use dataflow_table::{Column, Table, Value};
use regex::Regex;
use serde_json::Value as Json;

fn render_prompt(template: &str, placeholder: &Regex, row: &std::collections::HashMap<String, Value>) -> String {
    let mut has_placeholder = false;
    let rendered = placeholder.replace_all(template, |caps: &regex::Captures| {
        has_placeholder = true;
        let col = &caps[1];
        row.get(col).map(|v| v.display_text()).unwrap_or_default()
    });
    if has_placeholder {
        return rendered.into_owned();
    }
    let mut block = String::from(template);
    block.push_str("\n\n");
    for (k, v) in row {
        block.push_str(&format!("{}: {}\n", k, v.display_text()));
    }
    block
}

pub fn run(inputs: Vec<Table>, config: &Json, ctx: &mut OperatorContext) -> Result<Table> {
    let table = match inputs.into_iter().next() {
        Some(t) => t,
        None => return Ok(Table::empty()),
    };
    let prompt_template = crate::config::require_str(config, "prompt")?;
    let target_column = crate::config::require_str(config, "target_column")?;
    let placeholder = Regex::new(r"\{\{\s*([^}\s]+)\s*\}\}").expect("static pattern");

    let bound = table.num_rows().min(AI_AGENT_MAX_ROWS);
    let mut responses: Vec<Value> = Vec::with_capacity(bound);
    for r in 0..bound {
        let row = table.row_map(r);
        let prompt = render_prompt(prompt_template, &placeholder, &row);
        let response = match ctx.model_client.complete(&prompt) {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e.message),
        };
        responses.push(Value::Text(response));
    }
    for _ in bound..table.num_rows() {
        responses.push(Value::Absent);
    }

    let mut table = table;
    if table.has_column(target_column) {
        table = table.drop_columns(&[target_column.to_string()])?;
    }
    table.push_column(Column::new(target_column, responses));
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{noop_ctx, EchoModel, NoFiles};
    use dataflow_engine::{DataflowError, ErrorCategory, FileRegistry, ModelClient};

    fn sample(n: usize) -> Table {
        let names: Vec<Value> = (0..n).map(|i| Value::Text(format!("item{}", i))).collect();
        Table::from_columns(vec![Column::new("name", names)])
    }

    #[test]
    fn substitutes_placeholders_into_the_prompt() {
        let files = NoFiles;
        let model = EchoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"prompt": "hello {{name}}", "target_column": "reply"});
        let out = run(vec![sample(2)], &config, &mut ctx).unwrap();
        assert_eq!(out.get(0, "reply").unwrap().display_text(), "echo: hello item0");
        assert_eq!(out.get(1, "reply").unwrap().display_text(), "echo: hello item1");
    }

    #[test]
    fn rows_beyond_the_max_are_left_absent() {
        let files = NoFiles;
        let model = EchoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let total = AI_AGENT_MAX_ROWS + 3;
        let config = serde_json::json!({"prompt": "hi {{name}}", "target_column": "reply"});
        let out = run(vec![sample(total)], &config, &mut ctx).unwrap();
        assert_eq!(out.num_rows(), total);
        assert!(out.get(AI_AGENT_MAX_ROWS, "reply").unwrap().is_absent());
    }

    struct AlwaysFails;
    impl ModelClient for AlwaysFails {
        fn complete(&self, _prompt: &str) -> Result<String> {
            Err(DataflowError::new(ErrorCategory::RemoteUnavailable, "down"))
        }
    }

    #[test]
    fn a_failed_row_records_the_error_text_instead_of_aborting_the_whole_column() {
        let files = NoFiles;
        let model = AlwaysFails;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let config = serde_json::json!({"prompt": "hi {{name}}", "target_column": "reply"});
        let out = run(vec![sample(1)], &config, &mut ctx).unwrap();
        assert!(out.get(0, "reply").unwrap().display_text().starts_with("Error:"));
    }

    #[test]
    fn existing_target_column_is_overwritten_not_duplicated() {
        let files = NoFiles;
        let model = EchoModel;
        let mut log = |_l, _m: String| {};
        let mut ctx = noop_ctx(&files, &model, &mut log);
        let mut table = sample(1);
        table.push_column(Column::new("reply", vec![Value::Text("stale".into())]));
        let config = serde_json::json!({"prompt": "hi {{name}}", "target_column": "reply"});
        let out = run(vec![table], &config, &mut ctx).unwrap();
        assert_eq!(out.column_names().iter().filter(|n| *n == "reply").count(), 1);
        assert_eq!(out.get(0, "reply").unwrap().display_text(), "echo: hi item0");
    }
}
