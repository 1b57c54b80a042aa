// ABOUTME: PostgreSQL queue store backed by an sqlx connection pool
// ABOUTME: Each chunk write leases one pooled connection and returns it on drop

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;

use super::{QueueConnection, QueueStore};

pub struct PostgresQueue {
    pool: PgPool,
}

impl PostgresQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool of at most `max_connections` without connecting yet.
    ///
    /// TLS follows the `sslmode` parameter of the URL.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)
            .context("Invalid PostgreSQL target connection string")?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueueStore for PostgresQueue {
    type Connection = PoolConnection<Postgres>;

    async fn acquire(&self) -> Result<Self::Connection> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire PostgreSQL connection from pool")
    }
}

#[async_trait]
impl QueueConnection for PoolConnection<Postgres> {
    async fn insert_chunk(&mut self, sql: &str, json: &str, size_in_mb: f64) -> Result<()> {
        sqlx::query(sql)
            .bind(json)
            .bind(size_in_mb)
            .execute(&mut **self)
            .await
            .context("Failed to insert chunk descriptor")?;
        Ok(())
    }
}
