pub mod case;
pub mod catalog;
pub mod report;
pub mod suite;

pub use case::{Expected, Mismatch, QueryCase};
pub use report::{Abort, CaseOutcome, CaseReport, SuiteReport};
pub use suite::Suite;

#[cfg(test)]
mod tests;
