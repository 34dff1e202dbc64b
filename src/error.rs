use thiserror::Error;

/// Classifies snapshot integrity failures for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotErrorKind {
    /// Structural problem (odd slot array length, unreadable field, etc.)
    Malformed,
    /// Snapshot was produced with a different category bit width
    BitWidthMismatch,
    /// A head, `next` pointer or string index points past the end of its array
    IndexOutOfRange,
    /// A chain revisits a slot (cycle or two chains sharing a tail)
    Cycle,
    /// Entry count does not agree with the number of slots
    CountMismatch,
}

/// Hostname database error types
#[derive(Error, Debug)]
pub enum HostDbError {
    #[error("Corrupt snapshot: {message}")]
    CorruptSnapshot {
        kind: SnapshotErrorKind,
        message: String,
    },

    #[error("Invalid pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    #[error("Invalid retrieval modifiers: {0}")]
    InvalidModifiers(u8),

    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HostDbError {
    pub(crate) fn corrupt(kind: SnapshotErrorKind, message: impl Into<String>) -> Self {
        HostDbError::CorruptSnapshot {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HostDbError>;
