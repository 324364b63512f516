//! Outcome bookkeeping for batch runs

use std::path::PathBuf;
use std::time::Duration;

/// What happened to one repository of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryOutcome {
    /// A result was written to this path
    Written { path: PathBuf, entries: usize },
    /// A result already existed locally or in the bucket
    SkippedExisting { path: PathBuf },
    /// No usable tokens; nothing written
    Empty,
    /// Conversion or persistence failed
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct RepositoryReport {
    /// Location as given on input
    pub repository: String,
    pub outcome: RepositoryOutcome,
    /// Files seen during conversion, 0 when not converted
    pub files: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default, Clone)]
pub struct BatchStats {
    pub written: usize,
    pub skipped_existing: usize,
    pub empty: usize,
    pub failed: usize,
    pub elapsed: Duration,
    /// One report per input repository, in input order
    pub reports: Vec<RepositoryReport>,
}

impl BatchStats {
    pub fn record(&mut self, report: RepositoryReport) {
        match report.outcome {
            RepositoryOutcome::Written { .. } => self.written += 1,
            RepositoryOutcome::SkippedExisting { .. } => self.skipped_existing += 1,
            RepositoryOutcome::Empty => self.empty += 1,
            RepositoryOutcome::Failed { .. } => self.failed += 1,
        }
        self.reports.push(report);
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
