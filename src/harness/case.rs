use std::{fmt, time::Instant};

use tracing::{debug, info_span, warn};

use crate::sqlite::{connection::Connection, error::QueryError, record::CellValue, row::Row};

use super::report::{CaseOutcome, CaseReport};

/// The literal result a case must reproduce.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    /// Exactly one row, fetched with [`Connection::fetch_single_row`].
    SingleRow(Row),
    /// An ordered sequence, fetched with [`Connection::fetch_multiple_rows`].
    Rows(Vec<Row>),
}

/// One query paired with the result it must produce.
#[derive(Debug, Clone)]
pub struct QueryCase {
    pub name: String,
    pub query: String,
    pub expected: Expected,
}

impl QueryCase {
    pub fn single_row(name: impl Into<String>, query: impl Into<String>, expected: Row) -> Self {
        QueryCase {
            name: name.into(),
            query: query.into(),
            expected: Expected::SingleRow(expected),
        }
    }

    pub fn rows(name: impl Into<String>, query: impl Into<String>, expected: Vec<Row>) -> Self {
        QueryCase {
            name: name.into(),
            query: query.into(),
            expected: Expected::Rows(expected),
        }
    }

    pub fn run(&self, conn: &Connection) -> CaseReport {
        let span = info_span!("case", name = %self.name);
        let _enter = span.enter();
        let started = Instant::now();

        let outcome = match self.check(conn) {
            Ok(None) => CaseOutcome::Passed,
            Ok(Some(mismatch)) => {
                warn!(%mismatch, "case failed");
                CaseOutcome::Failed(mismatch)
            }
            Err(error) => {
                warn!(%error, "case errored");
                CaseOutcome::Errored(error)
            }
        };

        let elapsed = started.elapsed();
        debug!(?elapsed, "case finished");
        CaseReport {
            name: self.name.clone(),
            outcome,
            elapsed,
        }
    }

    /// Runs the query and returns the first difference from the expectation.
    pub fn check(&self, conn: &Connection) -> Result<Option<Mismatch>, QueryError> {
        Ok(match &self.expected {
            Expected::SingleRow(expected) => {
                let actual = conn.fetch_single_row(&self.query)?;
                diff_row(0, expected, &actual)
            }
            Expected::Rows(expected) => {
                let actual = conn.fetch_multiple_rows(&self.query)?;
                diff_rows(expected, &actual)
            }
        })
    }
}

/// The first point where an actual result departs from its expectation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    RowCount {
        expected: usize,
        actual: usize,
    },
    MissingColumn {
        row: usize,
        column: String,
    },
    UnexpectedColumn {
        row: usize,
        column: String,
    },
    Value {
        row: usize,
        column: String,
        expected: CellValue,
        actual: CellValue,
    },
    /// Same rows, different sequence.
    Order {
        row: usize,
        expected: Row,
        actual: Row,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mismatch::RowCount { expected, actual } => {
                write!(f, "expected {expected} rows, got {actual}")
            }
            Mismatch::MissingColumn { row, column } => {
                write!(f, "row {row}: missing column {column:?}")
            }
            Mismatch::UnexpectedColumn { row, column } => {
                write!(f, "row {row}: unexpected column {column:?}")
            }
            Mismatch::Value {
                row,
                column,
                expected,
                actual,
            } => write!(
                f,
                "row {row}, column {column:?}: expected {expected} ({}), got {actual} ({})",
                expected.type_name(),
                actual.type_name()
            ),
            Mismatch::Order {
                row,
                expected,
                actual,
            } => write!(f, "row {row} out of order: expected {expected}, got {actual}"),
        }
    }
}

pub fn diff_row(index: usize, expected: &Row, actual: &Row) -> Option<Mismatch> {
    for (column, want) in expected.iter() {
        match actual.get(column) {
            None => {
                return Some(Mismatch::MissingColumn {
                    row: index,
                    column: column.to_owned(),
                })
            }
            Some(got) if got != want => {
                return Some(Mismatch::Value {
                    row: index,
                    column: column.to_owned(),
                    expected: want.clone(),
                    actual: got.clone(),
                })
            }
            Some(_) => {}
        }
    }

    // A repeated alias is extra even when its name is expected: `get` only
    // ever sees the first occurrence.
    let columns = actual.columns();
    columns
        .iter()
        .enumerate()
        .find(|(i, c)| expected.get(c).is_none() || columns[..*i].contains(c))
        .map(|(_, c)| c)
        .map(|c| Mismatch::UnexpectedColumn {
            row: index,
            column: c.to_string(),
        })
}

pub fn diff_rows(expected: &[Row], actual: &[Row]) -> Option<Mismatch> {
    if expected.len() != actual.len() {
        return Some(Mismatch::RowCount {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    let (index, (want, got)) = expected
        .iter()
        .zip(actual)
        .enumerate()
        .find(|(_, (want, got))| want != got)?;

    if same_rows(expected, actual) {
        return Some(Mismatch::Order {
            row: index,
            expected: want.clone(),
            actual: got.clone(),
        });
    }
    diff_row(index, want, got)
}

/// Whether both slices hold the same rows, ignoring sequence.
fn same_rows(expected: &[Row], actual: &[Row]) -> bool {
    let mut pool: Vec<&Row> = actual.iter().collect();
    expected.iter().all(|want| match pool.iter().position(|got| *got == want) {
        Some(i) => {
            pool.swap_remove(i);
            true
        }
        None => false,
    })
}
