// ABOUTME: Writes chunk descriptors into the PostgreSQL data pool table
// ABOUTME: Every chunk is an independent best-effort insert; the fan-out waits for all of them

pub mod postgres;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::chunking::ChunkDescriptor;
use crate::error::PlannerError;

pub use postgres::PostgresQueue;

/// Hands out destination connections; pooling lives behind this trait.
#[async_trait]
pub trait QueueStore: Send + Sync {
    type Connection: QueueConnection;

    async fn acquire(&self) -> anyhow::Result<Self::Connection>;
}

/// A leased destination connection. Dropping it releases it.
#[async_trait]
pub trait QueueConnection: Send {
    async fn insert_chunk(&mut self, sql: &str, json: &str, size_in_mb: f64) -> anyhow::Result<()>;
}

/// Result of one chunk's insert attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    pub offset: u64,
    pub size_in_mb: f64,
    pub result: Result<(), PlannerError>,
}

impl ChunkOutcome {
    pub fn is_persisted(&self) -> bool {
        self.result.is_ok()
    }
}

/// Queue table consumers look up for a `(schema, source database)` pair.
pub fn queue_table_name(schema: &str, source_db_name: &str) -> String {
    format!("data_pool_{}{}", schema, source_db_name)
}

pub fn insert_query(schema: &str, source_db_name: &str) -> String {
    format!(
        "INSERT INTO \"{}\".\"{}\"(\"is_started\", \"json\", \"size_in_mb\") VALUES(FALSE, $1, $2);",
        schema,
        queue_table_name(schema, source_db_name)
    )
}

async fn insert_descriptor<Q: QueueStore>(
    store: &Q,
    sql: &str,
    descriptor: &ChunkDescriptor,
) -> Result<(), PlannerError> {
    let mut connection = store
        .acquire()
        .await
        .map_err(|e| PlannerError::DestinationConnection {
            reason: format!("{:#}", e),
        })?;

    let json = match descriptor.to_json() {
        Ok(json) => json,
        Err(e) => {
            drop(connection);
            return Err(PlannerError::DestinationWrite {
                sql: sql.to_string(),
                reason: format!("failed to serialize chunk descriptor: {}", e),
            });
        }
    };

    let inserted = connection
        .insert_chunk(sql, &json, descriptor.size_in_mb)
        .await;
    drop(connection);

    inserted.map_err(|e| PlannerError::DestinationWrite {
        sql: sql.to_string(),
        reason: format!("{:#}", e),
    })
}

/// Persists one descriptor. Failures are logged and reported, never raised.
pub async fn write_chunk<Q: QueueStore>(
    store: &Q,
    sql: &str,
    descriptor: &ChunkDescriptor,
) -> ChunkOutcome {
    let result = insert_descriptor(store, sql, descriptor).await;

    match &result {
        Ok(()) => debug!(
            offset = descriptor.offset,
            size_in_mb = descriptor.size_in_mb,
            "Chunk queued"
        ),
        Err(err) => error!(
            offset = descriptor.offset,
            sql = err.sql().unwrap_or_default(),
            "[prepareDataChunks] {}",
            err
        ),
    }

    ChunkOutcome {
        offset: descriptor.offset,
        size_in_mb: descriptor.size_in_mb,
        result,
    }
}

/// Dispatches every descriptor at once and resolves when all inserts have settled.
///
/// At most `max_concurrent_writes` chunks hold a destination connection at a time.
/// Outcomes come back in descriptor order; completion order is unspecified.
pub async fn enqueue_all<Q: QueueStore>(
    store: &Q,
    schema: &str,
    source_db_name: &str,
    max_concurrent_writes: usize,
    descriptors: &[ChunkDescriptor],
) -> Vec<ChunkOutcome> {
    let sql = insert_query(schema, source_db_name);
    let permits = Semaphore::new(max_concurrent_writes.max(1));

    let writes = descriptors.iter().map(|descriptor| {
        let sql = sql.as_str();
        let permits = &permits;
        async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = permits.acquire().await.ok();
            write_chunk(store, sql, descriptor).await
        }
    });

    join_all(writes).await
}
