// ABOUTME: Chunk planning module
// ABOUTME: Turns table statistics into chunk descriptors

pub mod descriptor;
pub mod plan;

pub use descriptor::{build_descriptors, ChunkDescriptor};
pub use plan::{ChunkPlan, TableStats};
