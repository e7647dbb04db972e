use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures that leave a suite without a data source.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("{0:?} is not a valid snapshot name")]
    InvalidSnapshotName(String),

    #[error("snapshot {name:?} does not exist at {}", path.display())]
    SnapshotNotFound { name: String, path: PathBuf },

    #[error("cannot read snapshot directory {}", path.display())]
    SnapshotDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot restore snapshot {from:?} into {to:?}")]
    Restore {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{} is not a readable database", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{} holds no schema, the snapshot is empty or truncated", path.display())]
    EmptySnapshot { path: PathBuf },

    /// Checked once the open has finished. A slow open is not cut short.
    #[error("opening {} took {elapsed:?}, over the {limit:?} limit", path.display())]
    OpenTimedOut {
        path: PathBuf,
        elapsed: Duration,
        limit: Duration,
    },
}

/// Failures scoped to a single query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("expected a single statement, found {count}")]
    StatementCount { count: usize },

    #[error("only read-only queries can run against a snapshot, got: {statement}")]
    NotReadOnly { statement: String },

    #[error("engine rejected query: {source}")]
    Execution {
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("expected exactly {expected} row, query returned {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("query did not finish within {limit:?}")]
    Timeout { limit: Duration },
}
