// ABOUTME: Error taxonomy for chunk planning
// ABOUTME: One variant per failure point, each carrying the statement that failed where there is one

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerError {
    SourceConnection { reason: String },
    SourceQuery { sql: String, reason: String },
    DestinationConnection { reason: String },
    DestinationWrite { sql: String, reason: String },
    Config { reason: String },
}

impl PlannerError {
    /// Statement that was rejected, for query and write failures.
    pub fn sql(&self) -> Option<&str> {
        match self {
            PlannerError::SourceQuery { sql, .. } | PlannerError::DestinationWrite { sql, .. } => {
                Some(sql)
            }
            _ => None,
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlannerError::SourceConnection { reason } => {
                write!(f, "Cannot connect to MySQL server: {}", reason)
            }
            PlannerError::SourceQuery { sql, reason } => {
                write!(f, "MySQL query failed: {} (statement: {})", reason, sql)
            }
            PlannerError::DestinationConnection { reason } => {
                write!(f, "Cannot connect to PostgreSQL server: {}", reason)
            }
            PlannerError::DestinationWrite { sql, reason } => {
                write!(f, "INSERT failed: {} (statement: {})", reason, sql)
            }
            PlannerError::Config { reason } => write!(f, "Configuration error: {}", reason),
        }
    }
}

impl std::error::Error for PlannerError {}
