//! Scenario orchestration: ledger, lifecycle, teardown and reports.

mod ledger;
mod orchestrator;
mod report;
mod state_machine;

pub use ledger::{DeletionAction, Ledger, LedgerEntry};
pub use orchestrator::{Orchestrator, Precondition, ScenarioContext};
pub use report::{
    ScenarioReport, SuiteReport, TeardownOutcome, TeardownRecord, TeardownReport, TeardownTarget,
    Verdict,
};
pub use state_machine::{InvalidTransition, ScenarioEvent, ScenarioPhase};
