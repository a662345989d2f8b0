//! Spreadsheet and CSV I/O backing the `source*` operators and the
//! `output`/`output_csv` sinks.

pub mod csv;
pub mod xlsx;
