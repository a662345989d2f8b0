//! CSV I/O for `source_csv` and `output_csv`.

use crate::error::{Result, TableError};
use crate::table::Table;
use crate::value::Value;
use std::io::Cursor;
use std::path::Path;

fn infer_csv_value(s: &str) -> Value {
    if s.is_empty() {
        return Value::Absent;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Real(f);
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    Value::Text(s.to_string())
}

/// Reads a CSV file. Only `utf-8` is read natively; any other requested
/// encoding is read as raw bytes and lossily reinterpreted as UTF-8 (no
/// transcoding crate is in the dependency set — a `replace`-on-decode-failure
/// fallback, consistent with how bytes columns are handled elsewhere).
pub fn read_csv(
    path: &Path,
    delimiter: u8,
    encoding: &str,
    row_limit: Option<usize>,
) -> Result<Table> {
    let mut reader = if encoding.eq_ignore_ascii_case("utf-8") {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_path(path)
            .map_err(|e| TableError::Csv(e.to_string()))?
    } else {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(Cursor::new(text.into_bytes()))
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::Csv(e.to_string()))?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in reader.records() {
        if let Some(limit) = row_limit {
            if rows.len() >= limit {
                break;
            }
        }
        let record = result.map_err(|e| TableError::Csv(e.to_string()))?;
        let row: Vec<Value> = record.iter().map(infer_csv_value).collect();
        rows.push(row);
    }
    Ok(Table::from_rows(&headers, rows))
}

/// Writes a CSV file with a header row; the header is never omitted.
pub fn write_csv(table: &Table, path: &Path, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| TableError::Csv(e.to_string()))?;
    writer
        .write_record(table.column_names())
        .map_err(|e| TableError::Csv(e.to_string()))?;
    for r in 0..table.num_rows() {
        let record: Vec<String> = table.columns().iter().map(|c| c.values[r].display_text()).collect();
        writer
            .write_record(&record)
            .map_err(|e| TableError::Csv(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::from_columns(vec![
            Column::new("id", vec![Value::Integer(1), Value::Integer(2)]),
            Column::new("name", vec![Value::Text("a".into()), Value::Text("b".into())]),
        ]);
        write_csv(&table, &path, b',').unwrap();
        let read_back = read_csv(&path, b',', "utf-8", None).unwrap();
        assert_eq!(read_back.column_names(), vec!["id", "name"]);
        assert_eq!(read_back.num_rows(), 2);
        assert_eq!(read_back.get(0, "id").unwrap().as_f64(), Some(1.0));
    }
}
