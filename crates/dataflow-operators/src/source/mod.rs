pub mod source;
pub mod source_csv;
pub mod source_optional;
