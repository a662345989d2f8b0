pub mod concat;
pub mod diff;
pub mod join;
pub mod reconcile;
pub mod vlookup;
