// ABOUTME: Planner configuration loaded from a TOML file
// ABOUTME: Holds target chunk size, queue naming inputs, write concurrency and table renames

use serde::Deserialize;
use std::path::Path;

use crate::error::PlannerError;

fn default_chunk_size_mb() -> f64 {
    1.0
}

fn default_max_concurrent_writes() -> usize {
    10
}

/// Maps a destination table name back to the MySQL table it came from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableRename {
    pub original: String,
    pub new: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Destination PostgreSQL schema.
    pub schema: String,
    /// Source MySQL database name.
    pub source_db_name: String,
    #[serde(default = "default_chunk_size_mb")]
    pub data_chunk_size_mb: f64,
    /// Upper bound on queue inserts in flight, sized to the destination pool.
    #[serde(default = "default_max_concurrent_writes")]
    pub max_concurrent_writes: usize,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub tables: Vec<TableRename>,
}

impl PlannerConfig {
    pub fn new(schema: impl Into<String>, source_db_name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            source_db_name: source_db_name.into(),
            data_chunk_size_mb: default_chunk_size_mb(),
            max_concurrent_writes: default_max_concurrent_writes(),
            source_url: String::new(),
            target_url: String::new(),
            tables: Vec::new(),
        }
    }

    pub fn with_chunk_size_mb(mut self, size: f64) -> Self {
        self.data_chunk_size_mb = size;
        self
    }

    pub fn with_max_concurrent_writes(mut self, writes: usize) -> Self {
        self.max_concurrent_writes = writes;
        self
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, PlannerError> {
        let config: PlannerConfig = toml::from_str(raw).map_err(|e| PlannerError::Config {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, PlannerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| PlannerError::Config {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if !self.data_chunk_size_mb.is_finite() || self.data_chunk_size_mb <= 0.0 {
            return Err(PlannerError::Config {
                reason: format!(
                    "data_chunk_size_mb must be a positive number, got {}",
                    self.data_chunk_size_mb
                ),
            });
        }
        if self.max_concurrent_writes == 0 {
            return Err(PlannerError::Config {
                reason: "max_concurrent_writes must be at least 1".to_string(),
            });
        }
        if self.schema.is_empty() || self.source_db_name.is_empty() {
            return Err(PlannerError::Config {
                reason: "schema and source_db_name are required".to_string(),
            });
        }
        Ok(())
    }

    /// Resolves the MySQL table name for a destination table name.
    pub fn original_table_name<'a>(&'a self, table_name: &'a str) -> &'a str {
        self.tables
            .iter()
            .find(|rename| rename.new == table_name)
            .map(|rename| rename.original.as_str())
            .unwrap_or(table_name)
    }
}
