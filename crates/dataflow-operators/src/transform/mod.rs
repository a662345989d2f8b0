pub mod date_process;
pub mod deduplicate;
pub mod fill_na;
pub mod text_process;
pub mod transform;
pub mod type_convert;
