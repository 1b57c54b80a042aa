// ABOUTME: MySQL source store backed by an sqlx connection pool
// ABOUTME: Leases one pooled connection per probe

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::MySql;

use super::{SourceConnection, SourceStore};

pub struct MySqlSource {
    pool: MySqlPool,
}

impl MySqlSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Builds a pool of at most `max_connections` without connecting yet, so an
    /// unreachable server surfaces per table when a probe acquires a connection.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)
            .context("Invalid MySQL source connection string")?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SourceStore for MySqlSource {
    type Connection = PoolConnection<MySql>;

    async fn acquire(&self) -> Result<Self::Connection> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire MySQL connection from pool")
    }
}

#[async_trait]
impl SourceConnection for PoolConnection<MySql> {
    async fn fetch_size_in_mb(&mut self, sql: &str) -> Result<Option<f64>> {
        let row: Option<(Option<f64>,)> = sqlx::query_as(sql).fetch_optional(&mut **self).await?;
        // data_length is NULL for views and some storage engines.
        Ok(row.map(|(size,)| size.unwrap_or(0.0)))
    }

    async fn fetch_row_count(&mut self, sql: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(sql).fetch_one(&mut **self).await?;
        Ok(count)
    }
}
