//! `date_process`: parses a column to a timestamp, optionally emitting
//! derived `{年,月,日,周几,季度}` columns and/or applying an offset.

use dataflow_engine::{DataflowError, OperatorContext, Result};
use dataflow_table::dates::{apply_offset, parse_timestamp, quarter, weekday_1_monday};
use dataflow_table::{Column, Table, Value};
use serde_json::Value as Json;

pub fn run(inputs: Vec<Table>, config: &Json, _ctx: &mut OperatorContext) -> Result<Table> {
    let table = inputs.into_iter().next().ok_or_else(|| DataflowError::arity(1, 0))?;
    let column_name = config
        .get("column")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataflowError::config_missing("column"))?;
    let idx = table
        .column_index(column_name)
        .ok_or_else(|| DataflowError::column_missing(column_name, &table.column_names()))?;

    let emit: Vec<String> = config
        .get("emit")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    let offset = config.get("offset").and_then(|v| v.as_str());

    let source = &table.columns()[idx];
    let dates: Vec<Option<chrono::NaiveDate>> = source
        .values
        .iter()
        .map(|v| match v {
            Value::Text(s) => parse_timestamp(s).map(|dt| dt.date()),
            Value::Timestamp(dt) => Some(dt.date()),
            Value::Date(d) => Some(*d),
            _ => None,
        })
        .collect();

    let mut columns: Vec<Column> = table.columns().to_vec();

    let adjusted: Vec<Option<chrono::NaiveDate>> = match offset {
        Some(spec) => dates.iter().map(|d| d.and_then(|d| apply_offset(d, spec))).collect(),
        None => dates.clone(),
    };

    if offset.is_some() {
        let values: Vec<Value> = adjusted.iter().map(|d| d.map(Value::Date).unwrap_or(Value::Absent)).collect();
        columns[idx] = Column::new(column_name, values);
    }

    let basis = if offset.is_some() { &adjusted } else { &dates };

    for field in &emit {
        let values: Vec<Value> = basis
            .iter()
            .map(|d| match d {
                Some(date) => match field.as_str() {
                    "年" => Value::Integer(date.format("%Y").to_string().parse().unwrap_or(0)),
                    "月" => Value::Integer(date.format("%m").to_string().trim_start_matches('0').parse().unwrap_or(0)),
                    "日" => Value::Integer(date.format("%d").to_string().trim_start_matches('0').parse().unwrap_or(0)),
                    "周几" => Value::Integer(weekday_1_monday(*date) as i64),
                    "季度" => Value::Integer(quarter(*date) as i64),
                    _ => Value::Absent,
                },
                None => Value::Absent,
            })
            .collect();
        let col_name = format!("{}_{}", column_name, field);
        if let Some(existing) = columns.iter().position(|c| c.name == col_name) {
            columns[existing] = Column::new(&col_name, values);
        } else {
            columns.push(Column::new(&col_name, values));
        }
    }

    Ok(Table::from_columns(columns))
}
