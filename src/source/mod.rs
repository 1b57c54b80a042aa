// ABOUTME: Size and cardinality probing of MySQL source tables
// ABOUTME: Both statements run on one leased connection, released before errors are reported

pub mod mysql;

use async_trait::async_trait;

use crate::chunking::TableStats;
use crate::error::PlannerError;

pub use mysql::MySqlSource;

/// Hands out source connections; pooling lives behind this trait.
#[async_trait]
pub trait SourceStore: Send + Sync {
    type Connection: SourceConnection;

    async fn acquire(&self) -> anyhow::Result<Self::Connection>;
}

/// A leased source connection. Dropping it returns it to its pool.
#[async_trait]
pub trait SourceConnection: Send {
    /// Runs the footprint statement. `None` when the catalog has no row for the table.
    async fn fetch_size_in_mb(&mut self, sql: &str) -> anyhow::Result<Option<f64>>;

    async fn fetch_row_count(&mut self, sql: &str) -> anyhow::Result<i64>;
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_identifier(value: &str) -> String {
    format!("`{}`", value.replace('`', "``"))
}

pub fn size_query(source_db_name: &str, table_name: &str) -> String {
    format!(
        "SELECT (data_length / 1024 / 1024) + 0E0 AS size_in_mb \
         FROM information_schema.tables \
         WHERE table_schema = {} AND table_name = {};",
        quote_literal(source_db_name),
        quote_literal(table_name)
    )
}

pub fn count_query(table_name: &str) -> String {
    format!("SELECT COUNT(1) AS rows_count FROM {};", quote_identifier(table_name))
}

/// Measures a table's footprint in MB, then its exact row count.
pub async fn probe_table_stats<S: SourceStore>(
    store: &S,
    source_db_name: &str,
    table_name: &str,
) -> Result<TableStats, PlannerError> {
    let mut connection = store
        .acquire()
        .await
        .map_err(|e| PlannerError::SourceConnection {
            reason: format!("{:#}", e),
        })?;

    let sql = size_query(source_db_name, table_name);
    let size_in_mb = match connection.fetch_size_in_mb(&sql).await {
        Ok(Some(size)) => size,
        Ok(None) => {
            drop(connection);
            return Err(PlannerError::SourceQuery {
                sql,
                reason: format!("table {} not found in {}", table_name, source_db_name),
            });
        }
        Err(e) => {
            drop(connection);
            return Err(PlannerError::SourceQuery {
                sql,
                reason: format!("{:#}", e),
            });
        }
    };

    let sql = count_query(table_name);
    let counted = connection.fetch_row_count(&sql).await;
    drop(connection);

    let row_count = counted
        .and_then(|count| u64::try_from(count).map_err(anyhow::Error::from))
        .map_err(|e| PlannerError::SourceQuery {
            sql,
            reason: format!("{:#}", e),
        })?;

    Ok(TableStats {
        size_in_mb,
        row_count,
    })
}
