// ABOUTME: In-memory source and queue stores for tests
// ABOUTME: Count leased and released connections, inject failures and capture log output

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::chunking::ChunkDescriptor;
use crate::queue::{QueueConnection, QueueStore};
use crate::source::{SourceConnection, SourceStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFailure {
    Connect,
    Size,
    MissingTable,
    Count,
}

#[derive(Default)]
struct SourceState {
    acquired: AtomicUsize,
    released: AtomicUsize,
    statements: Mutex<Vec<String>>,
}

pub struct FakeSource {
    size_in_mb: f64,
    row_count: i64,
    failure: Option<SourceFailure>,
    state: Arc<SourceState>,
}

impl FakeSource {
    pub fn new(size_in_mb: f64, row_count: i64) -> Self {
        Self {
            size_in_mb,
            row_count,
            failure: None,
            state: Arc::new(SourceState::default()),
        }
    }

    pub fn failing(mut self, failure: SourceFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }
}

pub struct FakeSourceConnection {
    size_in_mb: f64,
    row_count: i64,
    failure: Option<SourceFailure>,
    state: Arc<SourceState>,
}

impl Drop for FakeSourceConnection {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceStore for FakeSource {
    type Connection = FakeSourceConnection;

    async fn acquire(&self) -> anyhow::Result<Self::Connection> {
        if self.failure == Some(SourceFailure::Connect) {
            anyhow::bail!("connection refused");
        }
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSourceConnection {
            size_in_mb: self.size_in_mb,
            row_count: self.row_count,
            failure: self.failure,
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl SourceConnection for FakeSourceConnection {
    async fn fetch_size_in_mb(&mut self, sql: &str) -> anyhow::Result<Option<f64>> {
        self.state.statements.lock().unwrap().push(sql.to_string());
        match self.failure {
            Some(SourceFailure::Size) => anyhow::bail!("access denied"),
            Some(SourceFailure::MissingTable) => Ok(None),
            _ => Ok(Some(self.size_in_mb)),
        }
    }

    async fn fetch_row_count(&mut self, sql: &str) -> anyhow::Result<i64> {
        self.state.statements.lock().unwrap().push(sql.to_string());
        if self.failure == Some(SourceFailure::Count) {
            anyhow::bail!("lock wait timeout exceeded");
        }
        Ok(self.row_count)
    }
}

#[derive(Debug, Clone)]
pub struct QueuedRow {
    pub sql: String,
    pub descriptor: ChunkDescriptor,
    pub size_in_mb: f64,
}

#[derive(Default)]
struct QueueState {
    attempts: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    leased: AtomicUsize,
    max_leased: AtomicUsize,
    rows: Mutex<Vec<QueuedRow>>,
}

#[derive(Default)]
pub struct FakeQueue {
    fail_connect_on: Option<usize>,
    fail_insert_offset: Option<u64>,
    state: Arc<QueueState>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the acquire attempt with this zero-based index.
    pub fn failing_connect_on(mut self, attempt: usize) -> Self {
        self.fail_connect_on = Some(attempt);
        self
    }

    pub fn failing_insert_at_offset(mut self, offset: u64) -> Self {
        self.fail_insert_offset = Some(offset);
        self
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    pub fn max_leased(&self) -> usize {
        self.state.max_leased.load(Ordering::SeqCst)
    }

    pub fn rows(&self) -> Vec<QueuedRow> {
        let mut rows = self.state.rows.lock().unwrap().clone();
        rows.sort_by_key(|row| row.descriptor.offset);
        rows
    }
}

pub struct FakeQueueConnection {
    fail_insert_offset: Option<u64>,
    state: Arc<QueueState>,
}

impl Drop for FakeQueueConnection {
    fn drop(&mut self) {
        self.state.leased.fetch_sub(1, Ordering::SeqCst);
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl QueueStore for FakeQueue {
    type Connection = FakeQueueConnection;

    async fn acquire(&self) -> anyhow::Result<Self::Connection> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect_on == Some(attempt) {
            anyhow::bail!("too many clients already");
        }
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        let leased = self.state.leased.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_leased.fetch_max(leased, Ordering::SeqCst);
        Ok(FakeQueueConnection {
            fail_insert_offset: self.fail_insert_offset,
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl QueueConnection for FakeQueueConnection {
    async fn insert_chunk(&mut self, sql: &str, json: &str, size_in_mb: f64) -> anyhow::Result<()> {
        // Suspend like a network round trip so concurrent writes interleave.
        tokio::task::yield_now().await;

        let descriptor: ChunkDescriptor = serde_json::from_str(json)?;
        if self.fail_insert_offset == Some(descriptor.offset) {
            anyhow::bail!("relation does not exist");
        }
        self.state.rows.lock().unwrap().push(QueuedRow {
            sql: sql.to_string(),
            descriptor,
            size_in_mb,
        });
        Ok(())
    }
}

/// Collects formatted tracing output from the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes events to this capture until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
