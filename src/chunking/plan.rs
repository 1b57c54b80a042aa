// ABOUTME: Chunk plan calculation from table footprint and row count
// ABOUTME: Derives chunk count, row span per chunk and the size attributed to each chunk

/// Footprint and cardinality of one source table, measured once per planning run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    pub size_in_mb: f64,
    pub row_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub chunk_count: u64,
    pub rows_per_chunk: u64,
    table_size_in_mb: f64,
    target_chunk_size_mb: f64,
    row_count: u64,
}

impl ChunkPlan {
    /// Splits a table into chunks of roughly `target_chunk_size_mb`.
    ///
    /// The chunk count is the whole number of target-sized chunks that fit in
    /// the table, never less than one. It is not rounded up: a table of 1.2x
    /// the target becomes a single oversized chunk.
    ///
    /// `target_chunk_size_mb` must be positive; config validation enforces it.
    pub fn calculate(size_in_mb: f64, target_chunk_size_mb: f64, row_count: u64) -> Self {
        let raw_chunks = size_in_mb / target_chunk_size_mb;
        let chunk_count = if raw_chunks < 1.0 || !raw_chunks.is_finite() {
            1
        } else {
            raw_chunks.floor() as u64
        };
        let rows_per_chunk = row_count.div_ceil(chunk_count);

        Self {
            chunk_count,
            rows_per_chunk,
            table_size_in_mb: size_in_mb,
            target_chunk_size_mb,
            row_count,
        }
    }

    pub fn from_stats(stats: TableStats, target_chunk_size_mb: f64) -> Self {
        Self::calculate(stats.size_in_mb, target_chunk_size_mb, stats.row_count)
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Chunk start offsets, stepping by `rows_per_chunk` up to the row count.
    pub fn offsets(&self) -> impl Iterator<Item = u64> {
        let step = self.rows_per_chunk.max(1) as usize;
        (0..self.row_count).step_by(step)
    }

    /// Number of chunks the offset loop yields, which may differ from `chunk_count`.
    pub fn descriptor_count(&self) -> u64 {
        if self.rows_per_chunk == 0 {
            return 0;
        }
        self.row_count.div_ceil(self.rows_per_chunk)
    }

    pub fn is_final_chunk(&self, offset: u64) -> bool {
        offset + self.rows_per_chunk >= self.row_count
    }

    /// Estimated size of the chunk starting at `offset`.
    ///
    /// A single chunk carries the whole table. Otherwise every chunk carries the
    /// target size, except the final one which carries `size % chunk_count`,
    /// or the target size when that remainder is zero.
    pub fn chunk_size_in_mb(&self, offset: u64) -> f64 {
        if self.chunk_count == 1 {
            return self.table_size_in_mb;
        }
        if self.is_final_chunk(offset) {
            let remainder = self.table_size_in_mb % self.chunk_count as f64;
            if remainder == 0.0 {
                return self.target_chunk_size_mb;
            }
            return remainder;
        }
        self.target_chunk_size_mb
    }
}
