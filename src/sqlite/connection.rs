use std::{
    path::{Path, PathBuf},
    rc::Rc,
    time::{Duration, Instant},
};

use itertools::Itertools;
use rusqlite::{types::Value, ErrorCode, OpenFlags};
use tracing::{debug, warn};

use super::{
    error::{ConnectionError, QueryError},
    record::CellValue,
    row::Row,
    sql,
};

/// SQLite VM instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// A read-only handle on one snapshot file.
pub struct Connection {
    db: rusqlite::Connection,
    path: PathBuf,
    timeout: Option<Duration>,
}

impl Connection {
    /// Opens `path` read-only and reads the schema so a corrupted, foreign or
    /// empty file fails here rather than on the first query.
    ///
    /// `timeout` bounds lock waits and is compared against the total open
    /// time afterwards; it does not interrupt an open in progress.
    pub fn new(
        path: impl AsRef<Path>,
        timeout: Option<Duration>,
    ) -> Result<Connection, ConnectionError> {
        let path = path.as_ref().to_path_buf();
        let started = Instant::now();

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let db = rusqlite::Connection::open_with_flags(&path, flags).map_err(|source| {
            ConnectionError::Open {
                path: path.clone(),
                source,
            }
        })?;

        if let Some(limit) = timeout {
            db.busy_timeout(limit).map_err(|source| ConnectionError::Open {
                path: path.clone(),
                source,
            })?;
        }

        let tables = db
            .query_row("SELECT count(*) FROM sqlite_master", [], |r| r.get::<_, i64>(0))
            .map_err(|source| ConnectionError::Unreadable {
                path: path.clone(),
                source,
            })?;
        if tables == 0 {
            return Err(ConnectionError::EmptySnapshot { path });
        }

        let elapsed = started.elapsed();
        if let Some(limit) = timeout.filter(|limit| elapsed > *limit) {
            return Err(ConnectionError::OpenTimedOut {
                path,
                elapsed,
                limit,
            });
        }

        debug!(path = %path.display(), schema_entries = tables, ?elapsed, "opened snapshot");
        Ok(Connection { db, path, timeout })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs an aggregate query that must produce exactly one row.
    pub fn fetch_single_row(&self, query: impl AsRef<str>) -> Result<Row, QueryError> {
        let query = query.as_ref().trim();
        sql::inspect(query)?;

        let mut rows = self.execute_query(query)?;
        match rows.len() {
            1 => Ok(rows.remove(0)),
            actual => Err(QueryError::RowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Runs `query` and returns every row in the order the engine produced them.
    pub fn fetch_multiple_rows(&self, query: impl AsRef<str>) -> Result<Vec<Row>, QueryError> {
        let query = query.as_ref().trim();
        if let Some(shape) = sql::inspect(query)? {
            if shape.is_nondeterministic() {
                warn!(query, "LIMIT without ORDER BY, row order is not deterministic");
            }
        }

        self.execute_query(query)
    }

    /// User tables in name order.
    pub fn tables(&self) -> Result<Vec<String>, QueryError> {
        let rows = self.fetch_multiple_rows(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;

        Ok(rows
            .iter()
            .filter_map(|row| match row.get("name") {
                Some(CellValue::String(name)) => Some(name.to_owned()),
                _ => None,
            })
            .collect_vec())
    }

    fn execute_query(&self, query: &str) -> Result<Vec<Row>, QueryError> {
        let started = Instant::now();
        let _deadline = self.arm_deadline();

        let mut stmt = self.db.prepare(query).map_err(|e| self.query_error(query, e))?;
        let columns: Rc<[Rc<str>]> = stmt.column_names().into_iter().map(Rc::<str>::from).collect();

        let mut rows = stmt.query([]).map_err(|e| self.query_error(query, e))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| self.query_error(query, e))? {
            let cells: Vec<CellValue> = (0..columns.len())
                .map(|i| row.get::<_, Value>(i).map(CellValue::from))
                .try_collect()
                .map_err(|e| self.query_error(query, e))?;
            result.push(Row::new(columns.clone(), cells));
        }

        debug!(rows = result.len(), elapsed = ?started.elapsed(), "query finished");
        Ok(result)
    }

    fn arm_deadline(&self) -> Option<Deadline<'_>> {
        let limit = self.timeout?;
        let deadline = Instant::now() + limit;
        self.db
            .progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline));
        Some(Deadline { db: &self.db })
    }

    fn query_error(&self, query: &str, error: rusqlite::Error) -> QueryError {
        match (error.sqlite_error_code(), self.timeout) {
            (Some(ErrorCode::OperationInterrupted), Some(limit)) => QueryError::Timeout { limit },
            _ => QueryError::Execution {
                query: query.to_owned(),
                source: error,
            },
        }
    }
}

/// Removes the progress handler once the query it guards is done.
struct Deadline<'a> {
    db: &'a rusqlite::Connection,
}

impl Drop for Deadline<'_> {
    fn drop(&mut self) {
        self.db.progress_handler(0, None::<fn() -> bool>);
    }
}
