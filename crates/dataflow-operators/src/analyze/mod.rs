pub mod group_aggregate;
pub mod pivot;
pub mod unpivot;
