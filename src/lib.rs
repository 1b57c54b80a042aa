// ABOUTME: Library root for the MySQL chunk planner
// ABOUTME: Measures source tables, plans bounded-size chunks and queues their descriptors in PostgreSQL

pub mod chunking;
pub mod config;
pub mod error;
pub mod planner;
pub mod queue;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

pub use chunking::{build_descriptors, ChunkDescriptor, ChunkPlan, TableStats};
pub use config::{PlannerConfig, TableRename};
pub use error::PlannerError;
pub use planner::{prepare_data_chunks, preview_data_chunks, ChunkRequest, PlanReport, PlanStatus};
pub use queue::{enqueue_all, queue_table_name, ChunkOutcome, PostgresQueue, QueueStore};
pub use source::{probe_table_stats, MySqlSource, SourceStore};
