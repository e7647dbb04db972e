use std::time::{Duration, Instant};

use tracing::{error, info, info_span};

use crate::sqlite::{connection::Connection, error::QueryError, snapshot::SnapshotStore};

use super::{
    case::QueryCase,
    report::{Abort, CaseOutcome, CaseReport, SuiteReport},
};

/// A sequence of independent read-only cases sharing one connection.
///
/// The suite stages `source` into `destination`, opens the destination once,
/// and lends that connection to every case. A connection failure or a case
/// running past `case_timeout` aborts the rest of the suite.
#[derive(Debug, Clone)]
pub struct Suite {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub case_timeout: Duration,
    pub cases: Vec<QueryCase>,
}

impl Suite {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        case_timeout: Duration,
    ) -> Self {
        Suite {
            name: name.into(),
            source: source.into(),
            destination: destination.into(),
            case_timeout,
            cases: Vec::new(),
        }
    }

    pub fn case(mut self, case: QueryCase) -> Self {
        self.cases.push(case);
        self
    }

    pub fn run(&self, store: &SnapshotStore) -> SuiteReport {
        let span = info_span!("suite", name = %self.name);
        let _enter = span.enter();
        let started = Instant::now();

        let result = store.restore(&self.source, &self.destination).and_then(|_| {
            store.with_connection(&self.destination, Some(self.case_timeout), |conn| {
                self.run_cases(conn)
            })
        });

        let (cases, abort) = match result {
            Ok(run) => run,
            Err(e) => {
                error!(error = %e, "suite aborted before any case ran");
                (self.skip_all(), Some(Abort::Connection(e)))
            }
        };

        let report = SuiteReport {
            name: self.name.clone(),
            cases,
            abort,
            elapsed: started.elapsed(),
        };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            errored = report.errored(),
            skipped = report.skipped(),
            "suite finished"
        );
        report
    }

    fn run_cases(&self, conn: &Connection) -> (Vec<CaseReport>, Option<Abort>) {
        let mut reports = Vec::with_capacity(self.cases.len());
        let mut abort = None;

        for case in &self.cases {
            if abort.is_some() {
                reports.push(skipped(case));
                continue;
            }

            let report = case.run(conn);
            if let CaseOutcome::Errored(QueryError::Timeout { .. }) = report.outcome {
                error!(case = %case.name, "case timed out, aborting suite");
                abort = Some(Abort::CaseTimedOut {
                    case: case.name.clone(),
                });
            }
            reports.push(report);
        }

        (reports, abort)
    }

    fn skip_all(&self) -> Vec<CaseReport> {
        self.cases.iter().map(skipped).collect()
    }
}

fn skipped(case: &QueryCase) -> CaseReport {
    CaseReport {
        name: case.name.clone(),
        outcome: CaseOutcome::Skipped,
        elapsed: Duration::ZERO,
    }
}
