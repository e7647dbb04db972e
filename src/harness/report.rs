use std::{
    borrow::Cow,
    io::{self, Write},
    time::Duration,
};

use ptree::{print_tree_with, write_tree_with, PrintConfig, Style, TreeItem};

use crate::sqlite::error::{ConnectionError, QueryError};

use super::case::Mismatch;

#[derive(Debug)]
pub enum CaseOutcome {
    Passed,
    Failed(Mismatch),
    Errored(QueryError),
    /// Never ran because the suite aborted first.
    Skipped,
}

impl CaseOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CaseOutcome::Passed => "PASS",
            CaseOutcome::Failed(_) => "FAIL",
            CaseOutcome::Errored(_) => "ERROR",
            CaseOutcome::Skipped => "SKIP",
        }
    }
}

#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub outcome: CaseOutcome,
    pub elapsed: Duration,
}

/// Why the remaining cases of a suite did not run.
#[derive(Debug)]
pub enum Abort {
    Connection(ConnectionError),
    CaseTimedOut { case: String },
}

#[derive(Debug)]
pub struct SuiteReport {
    pub name: String,
    pub cases: Vec<CaseReport>,
    pub abort: Option<Abort>,
    pub elapsed: Duration,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed(_)))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Errored(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Skipped))
    }

    pub fn is_success(&self) -> bool {
        self.abort.is_none() && self.passed() == self.cases.len()
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    fn count(&self, f: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|c| f(&c.outcome)).count()
    }

    pub fn print(&self) -> io::Result<()> {
        print_tree_with(&self.tree(), &print_config())
    }

    pub fn write_to(&self, out: impl Write) -> io::Result<()> {
        write_tree_with(&self.tree(), out, &print_config())
    }

    fn tree(&self) -> ReportNode {
        let mut children = Vec::new();
        if let Some(abort) = &self.abort {
            children.push(ReportNode::leaf(match abort {
                Abort::Connection(e) => format!("aborted: {e}"),
                Abort::CaseTimedOut { case } => format!("aborted: {case:?} timed out"),
            }));
        }
        children.extend(self.cases.iter().map(ReportNode::from));

        ReportNode {
            label: format!(
                "{} ({} passed, {} failed, {} errored, {} skipped in {:?})",
                self.name,
                self.passed(),
                self.failed(),
                self.errored(),
                self.skipped(),
                self.elapsed
            ),
            children,
        }
    }
}

fn print_config() -> PrintConfig {
    PrintConfig {
        leaf: Style {
            bold: true,
            ..Style::default()
        },
        branch: Style { ..Style::default() },
        ..PrintConfig::default()
    }
}

#[derive(Debug, Clone)]
struct ReportNode {
    label: String,
    children: Vec<ReportNode>,
}

impl ReportNode {
    fn leaf(label: String) -> Self {
        ReportNode {
            label,
            children: Vec::new(),
        }
    }
}

impl From<&CaseReport> for ReportNode {
    fn from(case: &CaseReport) -> Self {
        let label = format!("[{}] {} ({:?})", case.outcome.label(), case.name, case.elapsed);
        let children = match &case.outcome {
            CaseOutcome::Failed(mismatch) => vec![ReportNode::leaf(mismatch.to_string())],
            CaseOutcome::Errored(error) => vec![ReportNode::leaf(error.to_string())],
            CaseOutcome::Passed | CaseOutcome::Skipped => Vec::new(),
        };
        ReportNode { label, children }
    }
}

impl TreeItem for ReportNode {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        write!(f, "{}", style.paint(&self.label))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(&self.children[..])
    }
}
