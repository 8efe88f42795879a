//! Scenario and suite reports.

use std::fmt;
use std::path::PathBuf;

use crate::gateway::ResourceRef;

/// Outcome of one scenario. Teardown problems never change it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Skipped { reason: String },
    Failed { step: String, error: String },
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Failed { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "PASSED"),
            Verdict::Skipped { reason } => write!(f, "SKIPPED ({})", reason),
            Verdict::Failed { step, error } => write!(f, "FAILED at step '{}': {}", step, error),
        }
    }
}

/// What a teardown record refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownTarget {
    Remote(ResourceRef),
    HostPath(PathBuf),
}

impl fmt::Display for TeardownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownTarget::Remote(reference) => write!(f, "{}", reference),
            TeardownTarget::HostPath(path) => write!(f, "hostpath {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    Deleted,
    /// Nothing to delete; counts as success
    AlreadyAbsent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownRecord {
    pub target: TeardownTarget,
    pub outcome: TeardownOutcome,
}

/// Per-entry results of one teardown, in the order they were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub records: Vec<TeardownRecord>,
}

impl TeardownReport {
    pub fn push(&mut self, target: TeardownTarget, outcome: TeardownOutcome) {
        self.records.push(TeardownRecord { target, outcome });
    }

    pub fn failures(&self) -> impl Iterator<Item = &TeardownRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TeardownOutcome::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub verdict: Verdict,
    pub teardown: TeardownReport,
    /// Informational remarks, e.g. a part of the scenario that was not run
    pub notes: Vec<String>,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {}", self.name, self.verdict)?;
        for note in &self.notes {
            writeln!(f, "    note: {}", note)?;
        }
        for record in self.teardown.failures() {
            if let TeardownOutcome::Failed(reason) = &record.outcome {
                writeln!(f, "    teardown warning: {}: {}", record.target, reason)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn push(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    pub fn has_failures(&self) -> bool {
        self.scenarios.iter().any(|s| s.verdict.is_failure())
    }

    /// `(passed, skipped, failed)` counts.
    pub fn summary(&self) -> (usize, usize, usize) {
        self.scenarios
            .iter()
            .fold((0, 0, 0), |(p, s, f), report| match report.verdict {
                Verdict::Passed => (p + 1, s, f),
                Verdict::Skipped { .. } => (p, s + 1, f),
                Verdict::Failed { .. } => (p, s, f + 1),
            })
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scenario in &self.scenarios {
            write!(f, "{}", scenario)?;
        }
        let (passed, skipped, failed) = self.summary();
        write!(
            f,
            "{} passed, {} skipped, {} failed",
            passed, skipped, failed
        )
    }
}
