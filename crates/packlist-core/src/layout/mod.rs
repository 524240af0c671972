//! Layout analysis: turning positioned tokens into tables.

pub mod cluster;
pub mod table;

pub use cluster::{Band, ClusterResult, TokenAssignment, TokenClusterer};
pub use table::{merge_tables, TableAssembler};
