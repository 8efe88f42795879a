//! Scenario lifecycle state machine.
//!
//! Every scenario moves `NotStarted → Running → {Skipped | Completed |
//! Failed} → TornDown`. Transitions are looked up in a fixed table; anything
//! not in the table is rejected with [`InvalidTransition`].

use std::fmt;

use thiserror::Error;

/// Lifecycle phase of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScenarioPhase {
    #[default]
    NotStarted,
    Running,
    Skipped,
    Completed,
    Failed,
    TornDown,
}

impl ScenarioPhase {
    /// The body has finished (or never ran) and teardown may proceed.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ScenarioPhase::Skipped | ScenarioPhase::Completed | ScenarioPhase::Failed
        )
    }
}

impl fmt::Display for ScenarioPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioPhase::NotStarted => write!(f, "NotStarted"),
            ScenarioPhase::Running => write!(f, "Running"),
            ScenarioPhase::Skipped => write!(f, "Skipped"),
            ScenarioPhase::Completed => write!(f, "Completed"),
            ScenarioPhase::Failed => write!(f, "Failed"),
            ScenarioPhase::TornDown => write!(f, "TornDown"),
        }
    }
}

/// Events that drive a scenario through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioEvent {
    /// Preconditions are about to be evaluated
    Started,
    /// A precondition did not hold
    PreconditionUnmet,
    /// Every step returned successfully
    StepsSucceeded,
    /// A step returned an error or panicked
    StepFailed,
    /// The ledger has been walked
    TeardownFinished,
}

impl fmt::Display for ScenarioEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioEvent::Started => write!(f, "Started"),
            ScenarioEvent::PreconditionUnmet => write!(f, "PreconditionUnmet"),
            ScenarioEvent::StepsSucceeded => write!(f, "StepsSucceeded"),
            ScenarioEvent::StepFailed => write!(f, "StepFailed"),
            ScenarioEvent::TeardownFinished => write!(f, "TeardownFinished"),
        }
    }
}

/// Rejected transition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Event {event} is not valid in phase {current}")]
pub struct InvalidTransition {
    pub current: ScenarioPhase,
    pub event: ScenarioEvent,
}

struct Transition {
    from: ScenarioPhase,
    to: ScenarioPhase,
    event: ScenarioEvent,
}

const fn transition(from: ScenarioPhase, event: ScenarioEvent, to: ScenarioPhase) -> Transition {
    Transition { from, to, event }
}

const TRANSITIONS: &[Transition] = &[
    transition(
        ScenarioPhase::NotStarted,
        ScenarioEvent::Started,
        ScenarioPhase::Running,
    ),
    transition(
        ScenarioPhase::Running,
        ScenarioEvent::PreconditionUnmet,
        ScenarioPhase::Skipped,
    ),
    transition(
        ScenarioPhase::Running,
        ScenarioEvent::StepsSucceeded,
        ScenarioPhase::Completed,
    ),
    transition(
        ScenarioPhase::Running,
        ScenarioEvent::StepFailed,
        ScenarioPhase::Failed,
    ),
    // === Every settled phase ends in teardown ===
    transition(
        ScenarioPhase::Skipped,
        ScenarioEvent::TeardownFinished,
        ScenarioPhase::TornDown,
    ),
    transition(
        ScenarioPhase::Completed,
        ScenarioEvent::TeardownFinished,
        ScenarioPhase::TornDown,
    ),
    transition(
        ScenarioPhase::Failed,
        ScenarioEvent::TeardownFinished,
        ScenarioPhase::TornDown,
    ),
];

impl ScenarioPhase {
    /// Phase reached from `self` on `event`.
    pub fn next(self, event: ScenarioEvent) -> Result<ScenarioPhase, InvalidTransition> {
        TRANSITIONS
            .iter()
            .find(|t| t.from == self && t.event == event)
            .map(|t| t.to)
            .ok_or(InvalidTransition {
                current: self,
                event,
            })
    }

    /// Check if `event` is accepted in this phase
    pub fn can_transition(self, event: ScenarioEvent) -> bool {
        self.next(event).is_ok()
    }

    /// Events accepted in this phase
    pub fn valid_events(self) -> Vec<ScenarioEvent> {
        TRANSITIONS
            .iter()
            .filter(|t| t.from == self)
            .map(|t| t.event)
            .collect()
    }
}
