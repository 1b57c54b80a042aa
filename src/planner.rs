// ABOUTME: Entry point that plans one table's chunks and fills the data pool queue
// ABOUTME: Fail-soft: every failure is logged and reported in the PlanReport, never returned as an error

use tracing::{error, info, info_span, Instrument};

use crate::chunking::{build_descriptors, ChunkDescriptor, ChunkPlan};
use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::queue::{enqueue_all, ChunkOutcome, QueueStore};
use crate::source::{probe_table_stats, SourceStore};

/// What to plan for one table.
#[derive(Debug, Clone)]
pub struct ChunkRequest {
    /// Destination table name; renames in the config map it back to MySQL.
    pub table_name: String,
    /// Column-selection clause transfer workers will use.
    pub select_field_list: String,
    /// Set when chunks for this table were already queued by an earlier run.
    pub already_planned: bool,
}

impl ChunkRequest {
    pub fn new(table_name: impl Into<String>, select_field_list: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            select_field_list: select_field_list.into(),
            already_planned: false,
        }
    }

    pub fn already_planned(mut self, already_planned: bool) -> Self {
        self.already_planned = already_planned;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanStatus {
    /// Skipped because chunks already exist.
    AlreadyPlanned,
    /// Probing the source failed; nothing was queued.
    Aborted(PlannerError),
    Planned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub table_name: String,
    pub status: PlanStatus,
    pub total_rows: u64,
    pub chunks: Vec<ChunkOutcome>,
}

impl PlanReport {
    fn without_chunks(table_name: &str, status: PlanStatus) -> Self {
        Self {
            table_name: table_name.to_string(),
            status,
            total_rows: 0,
            chunks: Vec::new(),
        }
    }

    pub fn persisted(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_persisted()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChunkOutcome> {
        self.chunks.iter().filter(|c| !c.is_persisted())
    }

    /// True when nothing went wrong: the table was skipped, or every chunk was queued.
    pub fn is_complete(&self) -> bool {
        match self.status {
            PlanStatus::AlreadyPlanned => true,
            PlanStatus::Aborted(_) => false,
            PlanStatus::Planned => self.chunks.iter().all(ChunkOutcome::is_persisted),
        }
    }
}

/// Measures a table, splits it into chunks and queues one descriptor per chunk.
pub async fn prepare_data_chunks<S, Q>(
    source: &S,
    queue: &Q,
    config: &PlannerConfig,
    request: &ChunkRequest,
) -> PlanReport
where
    S: SourceStore,
    Q: QueueStore,
{
    let span = info_span!("prepare_data_chunks", table = %request.table_name);
    plan_table(source, queue, config, request)
        .instrument(span)
        .await
}

async fn plan_table<S, Q>(
    source: &S,
    queue: &Q,
    config: &PlannerConfig,
    request: &ChunkRequest,
) -> PlanReport
where
    S: SourceStore,
    Q: QueueStore,
{
    if request.already_planned {
        return PlanReport::without_chunks(&request.table_name, PlanStatus::AlreadyPlanned);
    }

    let original_table_name = config.original_table_name(&request.table_name);
    let stats = match probe_table_stats(source, &config.source_db_name, original_table_name).await
    {
        Ok(stats) => stats,
        Err(err) => {
            error!(sql = err.sql().unwrap_or_default(), "[prepareDataChunks] {}", err);
            return PlanReport::without_chunks(&request.table_name, PlanStatus::Aborted(err));
        }
    };

    let plan = ChunkPlan::from_stats(stats, config.data_chunk_size_mb);
    info!(
        "[prepareDataChunks] Total rows to insert into \"{}\".\"{}\": {}",
        config.schema, request.table_name, stats.row_count
    );

    let descriptors = build_descriptors(&request.table_name, &request.select_field_list, &plan);
    let chunks = enqueue_all(
        queue,
        &config.schema,
        &config.source_db_name,
        config.max_concurrent_writes,
        &descriptors,
    )
    .await;

    PlanReport {
        table_name: request.table_name.clone(),
        status: PlanStatus::Planned,
        total_rows: stats.row_count,
        chunks,
    }
}

/// Computes the descriptors a table would be queued with, without writing them.
///
/// A failed probe is logged and yields no descriptors.
pub async fn preview_data_chunks<S: SourceStore>(
    source: &S,
    config: &PlannerConfig,
    request: &ChunkRequest,
) -> Vec<ChunkDescriptor> {
    let original_table_name = config.original_table_name(&request.table_name);
    match probe_table_stats(source, &config.source_db_name, original_table_name).await {
        Ok(stats) => {
            let plan = ChunkPlan::from_stats(stats, config.data_chunk_size_mb);
            build_descriptors(&request.table_name, &request.select_field_list, &plan)
        }
        Err(err) => {
            error!(
                table = %request.table_name,
                sql = err.sql().unwrap_or_default(),
                "[prepareDataChunks] {}",
                err
            );
            Vec::new()
        }
    }
}
