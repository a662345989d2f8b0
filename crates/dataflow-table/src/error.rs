//! Table-level error type. Operators wrap these into their own
//! category-tagged errors (see `dataflow-engine::error`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{0}' not found; available columns: {1}")]
    ColumnMissing(String, String),

    #[error("expression error: {0}")]
    Expr(#[from] crate::expr::ExprError),

    #[error("evaluation error: {0}")]
    Eval(#[from] crate::expr::EvalError),

    #[error("spreadsheet read error: {0}")]
    Xlsx(String),

    #[error("spreadsheet write error: {0}")]
    XlsxWrite(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid table operation: {0}")]
    Invalid(String),
}

impl TableError {
    pub fn column_missing(name: impl Into<String>, available: &[String]) -> Self {
        TableError::ColumnMissing(name.into(), available.join(", "))
    }
}
