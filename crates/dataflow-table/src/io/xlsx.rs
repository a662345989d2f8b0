//! Spreadsheet I/O: `calamine` for reading, `umya-spreadsheet` for writing
//! the open office-XML spreadsheet format.

use crate::error::{Result, TableError};
use crate::table::Table;
use crate::value::Value;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Which sheet to read: by name, or by zero-based ordinal.
#[derive(Debug, Clone)]
pub enum SheetRef {
    Name(String),
    Index(usize),
}

impl SheetRef {
    pub fn from_config(value: Option<&serde_json::Value>) -> SheetRef {
        match value {
            Some(serde_json::Value::String(s)) => SheetRef::Name(s.clone()),
            Some(serde_json::Value::Number(n)) => SheetRef::Index(n.as_u64().unwrap_or(0) as usize),
            _ => SheetRef::Index(0),
        }
    }
}

pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let wb = open_workbook_auto(path).map_err(|e| TableError::Xlsx(e.to_string()))?;
    Ok(wb.sheet_names().to_vec())
}

/// Reads a single sheet into a `Table`. `header_row` is 1-based;
/// `skip_rows` counts additional rows skipped immediately after the
/// header; `row_limit`, when set, bounds how many data rows are read
/// (used by preview execution and by `profit_table`'s row-bounded reads).
pub fn read_xlsx(
    path: &Path,
    sheet: &SheetRef,
    header_row: usize,
    skip_rows: usize,
    row_limit: Option<usize>,
) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| TableError::Xlsx(e.to_string()))?;
    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        SheetRef::Name(n) => n.clone(),
        SheetRef::Index(i) => names
            .get(*i)
            .cloned()
            .ok_or_else(|| TableError::Xlsx(format!("sheet index {} out of range (workbook has {} sheets)", i, names.len())))?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| TableError::Xlsx(format!("sheet '{}': {}", name, e)))?;

    let rows: Vec<&[Data]> = range.rows().collect();
    if rows.is_empty() {
        return Ok(Table::empty());
    }

    let header_idx = header_row.saturating_sub(1).min(rows.len() - 1);
    let header = rows[header_idx];
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let t = data_to_value(c).display_text();
            if t.is_empty() {
                format!("column_{}", i + 1)
            } else {
                t
            }
        })
        .collect();

    let data_start = header_idx + 1 + skip_rows;
    let mut data_rows: Vec<Vec<Value>> = Vec::new();
    for r in rows.iter().skip(data_start) {
        if let Some(limit) = row_limit {
            if data_rows.len() >= limit {
                break;
            }
        }
        let row_vals: Vec<Value> = (0..headers.len())
            .map(|ci| r.get(ci).map(data_to_value).unwrap_or(Value::Absent))
            .collect();
        data_rows.push(row_vals);
    }
    Ok(Table::from_rows(&headers, data_rows))
}

fn data_to_value(d: &Data) -> Value {
    match d {
        Data::Empty => Value::Absent,
        Data::String(s) => {
            if s.is_empty() {
                Value::Absent
            } else {
                Value::Text(s.clone())
            }
        }
        Data::Float(f) => Value::Real(*f),
        Data::Int(i) => Value::Integer(*i),
        Data::Bool(b) => Value::Boolean(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Value::Timestamp)
            .unwrap_or_else(|| Value::Real(dt.as_f64())),
        Data::DateTimeIso(s) => crate::dates::parse_timestamp(s)
            .map(Value::Timestamp)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(_) => Value::Absent,
    }
}

/// Writes a table to a `.xlsx` file under the given path (C5 sink).
pub fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| TableError::XlsxWrite("workbook has no default sheet".into()))?;

    for (ci, name) in table.column_names().iter().enumerate() {
        sheet
            .get_cell_mut(((ci + 1) as u32, 1u32))
            .set_value(name.clone());
    }
    for r in 0..table.num_rows() {
        for (ci, col) in table.columns().iter().enumerate() {
            let cell = sheet.get_cell_mut(((ci + 1) as u32, (r + 2) as u32));
            set_cell_value(cell, &col.values[r]);
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| TableError::XlsxWrite(e.to_string()))
}

fn set_cell_value(cell: &mut umya_spreadsheet::Cell, v: &Value) {
    match v {
        Value::Integer(i) => {
            cell.set_value_number(*i as f64);
        }
        Value::Real(r) => {
            if r.is_finite() {
                cell.set_value_number(*r);
            } else {
                cell.set_value("");
            }
        }
        Value::Text(s) => {
            cell.set_value(s.clone());
        }
        Value::Boolean(b) => {
            cell.set_value_bool(*b);
        }
        Value::Timestamp(ts) => {
            cell.set_value(ts.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        Value::Date(d) => {
            cell.set_value(d.format("%Y-%m-%d").to_string());
        }
        Value::Absent => {
            cell.set_value("");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let table = Table::from_columns(vec![
            Column::new("id", vec![Value::Integer(1), Value::Integer(2)]),
            Column::new("name", vec![Value::Text("a".into()), Value::Text("b".into())]),
        ]);
        write_xlsx(&table, &path).unwrap();
        let read_back = read_xlsx(&path, &SheetRef::Index(0), 1, 0, None).unwrap();
        assert_eq!(read_back.column_names(), vec!["id", "name"]);
        assert_eq!(read_back.num_rows(), 2);
        assert_eq!(read_back.get(1, "name").unwrap().display_text(), "b");
    }

    #[test]
    fn honors_row_limit_in_preview_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let table = Table::from_columns(vec![Column::new("n", (1..=10).map(Value::Integer).collect())]);
        write_xlsx(&table, &path).unwrap();
        let read_back = read_xlsx(&path, &SheetRef::Index(0), 1, 0, Some(3)).unwrap();
        assert_eq!(read_back.num_rows(), 3);
    }
}
