// ABOUTME: Chunk descriptors persisted as queue payloads
// ABOUTME: Keys match the payload layout transfer workers already read

use serde::{Deserialize, Serialize};

use super::plan::ChunkPlan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    #[serde(rename = "_tableName")]
    pub table_name: String,
    #[serde(rename = "_selectFieldList")]
    pub select_field_list: String,
    #[serde(rename = "_offset")]
    pub offset: u64,
    #[serde(rename = "_rowsInChunk")]
    pub rows_in_chunk: u64,
    #[serde(rename = "_rowsCnt")]
    pub rows_cnt: u64,
    #[serde(rename = "_sizeInMb")]
    pub size_in_mb: f64,
}

impl ChunkDescriptor {
    pub fn new(table_name: &str, select_field_list: &str, plan: &ChunkPlan, offset: u64) -> Self {
        Self {
            table_name: table_name.to_string(),
            select_field_list: select_field_list.to_string(),
            offset,
            rows_in_chunk: plan.rows_per_chunk,
            rows_cnt: plan.row_count(),
            size_in_mb: plan.chunk_size_in_mb(offset),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One descriptor per offset of the plan, in offset order.
pub fn build_descriptors(
    table_name: &str,
    select_field_list: &str,
    plan: &ChunkPlan,
) -> Vec<ChunkDescriptor> {
    let mut descriptors = Vec::with_capacity(plan.descriptor_count() as usize);
    descriptors.extend(
        plan.offsets()
            .map(|offset| ChunkDescriptor::new(table_name, select_field_list, plan, offset)),
    );
    descriptors
}
