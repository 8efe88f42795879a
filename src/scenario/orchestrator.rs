//! Scenario orchestrator.
//!
//! Owns the ledger of one scenario at a time, runs its steps, and tears down
//! whatever was created in reverse order. Teardown always runs and never
//! raises: every entry gets its own result in the [`TeardownReport`].

use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::ledger::{DeletionAction, Ledger, LedgerEntry};
use super::report::{ScenarioReport, TeardownOutcome, TeardownReport, TeardownTarget, Verdict};
use super::state_machine::{ScenarioEvent, ScenarioPhase};
use crate::diagnostics::DiagnosticCapture;
use crate::error::{Result, ScenarioError};
use crate::gateway::{Gateway, KindDescriptor, Resource, ResourceRef};

/// Condition a scenario needs before it creates anything.
#[derive(Debug, Clone)]
pub struct Precondition {
    satisfied: bool,
    reason: String,
}

impl Precondition {
    /// `reason` is reported as the skip reason when `satisfied` is false.
    pub fn require(satisfied: bool, reason: impl Into<String>) -> Self {
        Self {
            satisfied,
            reason: reason.into(),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Mutable state of a running scenario, handed to its steps.
pub struct ScenarioContext<'g, G> {
    name: String,
    gateway: &'g G,
    phase: ScenarioPhase,
    skip_reason: Option<String>,
    step: String,
    ledger: Ledger,
    notes: Vec<String>,
}

impl<'g, G: Gateway> ScenarioContext<'g, G> {
    fn new(name: &str, gateway: &'g G) -> Self {
        Self {
            name: name.to_string(),
            gateway,
            phase: ScenarioPhase::NotStarted,
            skip_reason: None,
            step: "begin".to_string(),
            ledger: Ledger::new(),
            notes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> ScenarioPhase {
        self.phase
    }

    pub fn is_skipped(&self) -> bool {
        self.phase == ScenarioPhase::Skipped
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn namespace(&self) -> &str {
        self.gateway.namespace()
    }

    /// Name the step that is about to run. A failure is reported against the
    /// most recently named step.
    pub fn step(&mut self, name: impl Into<String>) {
        self.step = name.into();
        info!(scenario = %self.name, step = %self.step, "Step");
    }

    pub fn current_step(&self) -> &str {
        &self.step
    }

    /// Add an entry to the ledger. Returns `false` for a duplicate.
    pub fn record(&mut self, reference: ResourceRef, action: DeletionAction) -> Result<bool> {
        self.ensure_running()?;
        let added = self.ledger.record(reference, action);
        if !added {
            warn!(scenario = %self.name, "Resource already recorded, ignoring duplicate");
        }
        Ok(added)
    }

    /// Remember a resource created by someone else, for diagnostics only.
    pub fn observe(&mut self, reference: ResourceRef) {
        self.ledger.observe(reference);
    }

    pub fn set_output(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.ledger.set_output(key, value.into());
    }

    pub fn get_output(&self, key: &str) -> Result<&Value> {
        self.ledger
            .get_output(key)
            .ok_or_else(|| ScenarioError::MissingOutput(key.to_string()))
    }

    /// String output; a non-string value counts as missing.
    pub fn output_str(&self, key: &str) -> Result<&str> {
        self.get_output(key)?
            .as_str()
            .ok_or_else(|| ScenarioError::MissingOutput(format!("{} (not a string)", key)))
    }

    /// Attach an informational note to the report.
    pub fn note(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!(scenario = %self.name, note = %text, "Note");
        self.notes.push(text);
    }

    /// Record `name` and then create it.
    ///
    /// The reference is recorded before the create is issued, so an object
    /// that came into existence despite a failed call is still torn down.
    /// If the object already existed it belongs to someone else and the
    /// entry is dropped again along with its host path. Creating the same reference twice is an error
    /// and leaves the first entry in place.
    pub async fn create(
        &mut self,
        kind: &KindDescriptor,
        name: &str,
        body: Value,
        action: DeletionAction,
    ) -> Result<Resource> {
        if let Err(e) = self.ensure_running() {
            remove_host_path(&action).await;
            return Err(e);
        }

        let reference = ResourceRef::new(kind.clone(), self.gateway.namespace(), name);
        if self.ledger.contains(&reference) {
            let shared = matches!(&action, DeletionAction::DeleteWithHostPath(path)
                if self.ledger.host_paths().any(|p| p == path));
            if !shared {
                remove_host_path(&action).await;
            }
            return Err(ScenarioError::AlreadyRecorded(reference.to_string()));
        }
        self.ledger.record(reference.clone(), action);

        match self.gateway.create(kind, name, body).await {
            Ok(obj) => {
                info!(scenario = %self.name, resource = %reference, "Created");
                Ok(obj)
            }
            Err(e) if e.is_already_exists() => {
                if let Some(entry) = self.ledger.forget(&reference) {
                    remove_host_path(&entry.action).await;
                }
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.phase != ScenarioPhase::Running {
            return Err(ScenarioError::NotRunning(self.phase.to_string()));
        }
        Ok(())
    }

    fn advance(&mut self, event: ScenarioEvent) {
        match self.phase.next(event) {
            Ok(next) => {
                debug!(scenario = %self.name, from = %self.phase, to = %next, "Phase transition");
                self.phase = next;
            }
            Err(e) => {
                error!(scenario = %self.name, error = %e, "Rejected phase transition");
            }
        }
    }
}

/// Runs scenarios against one gateway and tears them down.
pub struct Orchestrator<'g, G, D> {
    gateway: &'g G,
    diagnostics: D,
}

impl<'g, G: Gateway, D: DiagnosticCapture> Orchestrator<'g, G, D> {
    pub fn new(gateway: &'g G, diagnostics: D) -> Self {
        Self {
            gateway,
            diagnostics,
        }
    }

    pub fn gateway(&self) -> &'g G {
        self.gateway
    }

    /// Start a scenario. The first unmet precondition skips it; a skipped
    /// context refuses to create anything.
    pub fn begin_scenario(
        &self,
        name: &str,
        preconditions: &[Precondition],
    ) -> ScenarioContext<'g, G> {
        let mut ctx = ScenarioContext::new(name, self.gateway);
        ctx.advance(ScenarioEvent::Started);

        if let Some(unmet) = preconditions.iter().find(|p| !p.is_satisfied()) {
            info!(scenario = %name, reason = %unmet.reason(), "Skipping scenario");
            ctx.skip_reason = Some(unmet.reason().to_string());
            ctx.advance(ScenarioEvent::PreconditionUnmet);
        } else {
            info!(scenario = %name, "Starting scenario");
        }
        ctx
    }

    /// Settle the verdict, capture diagnostics and tear everything down.
    pub async fn end_scenario(
        &self,
        mut ctx: ScenarioContext<'g, G>,
        result: Result<()>,
    ) -> ScenarioReport {
        let verdict = match (ctx.phase, result) {
            (ScenarioPhase::Skipped, _) => Verdict::Skipped {
                reason: ctx.skip_reason.clone().unwrap_or_default(),
            },
            (_, Ok(())) => {
                ctx.advance(ScenarioEvent::StepsSucceeded);
                Verdict::Passed
            }
            (_, Err(e)) => {
                ctx.advance(ScenarioEvent::StepFailed);
                error!(scenario = %ctx.name, step = %ctx.step, error = %e, "Scenario failed");
                Verdict::Failed {
                    step: ctx.step.clone(),
                    error: e.to_string(),
                }
            }
        };

        if !ctx.is_skipped() {
            self.capture_diagnostics(&ctx).await;
        }

        let teardown = self.teardown(&ctx.ledger).await;
        ctx.advance(ScenarioEvent::TeardownFinished);

        info!(
            scenario = %ctx.name,
            verdict = %verdict,
            torn_down = teardown.records.len(),
            teardown_clean = teardown.is_clean(),
            "Scenario finished"
        );

        ScenarioReport {
            name: ctx.name,
            verdict,
            teardown,
            notes: ctx.notes,
        }
    }

    /// Begin, run `body` unless skipped, and end. A panic in `body` fails the
    /// scenario at the current step; teardown still runs.
    pub async fn run<F>(&self, name: &str, preconditions: &[Precondition], body: F) -> ScenarioReport
    where
        F: AsyncFnOnce(&mut ScenarioContext<'g, G>) -> Result<()>,
    {
        let mut ctx = self.begin_scenario(name, preconditions);
        if ctx.is_skipped() {
            return self.end_scenario(ctx, Ok(())).await;
        }

        let result = match AssertUnwindSafe(body(&mut ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ScenarioError::Panicked(panic_message(panic.as_ref()))),
        };
        self.end_scenario(ctx, result).await
    }

    async fn capture_diagnostics(&self, ctx: &ScenarioContext<'g, G>) {
        let capture = self.diagnostics.capture(self.gateway.namespace(), &ctx.ledger);
        match AssertUnwindSafe(capture).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(scenario = %ctx.name, error = %e, "Diagnostic capture failed");
            }
            Err(panic) => {
                warn!(
                    scenario = %ctx.name,
                    panic = %panic_message(panic.as_ref()),
                    "Diagnostic capture panicked"
                );
            }
        }
    }

    /// Walk `ledger` newest first. Every entry is attempted regardless of how
    /// the previous ones went.
    pub async fn teardown(&self, ledger: &Ledger) -> TeardownReport {
        let mut report = TeardownReport::default();

        for LedgerEntry { reference, action } in ledger.teardown_order() {
            let outcome = match self.gateway.delete(reference.kind(), reference.name()).await {
                Ok(()) => TeardownOutcome::Deleted,
                Err(e) if e.is_not_found() => TeardownOutcome::AlreadyAbsent,
                Err(e) => {
                    warn!(resource = %reference, error = %e, "Failed to delete resource");
                    TeardownOutcome::Failed(e.to_string())
                }
            };
            debug!(resource = %reference, outcome = ?outcome, "Teardown");
            report.push(TeardownTarget::Remote(reference.clone()), outcome);

            if let DeletionAction::DeleteWithHostPath(path) = action {
                let outcome = match tokio::fs::remove_dir_all(path).await {
                    Ok(()) => TeardownOutcome::Deleted,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => TeardownOutcome::AlreadyAbsent,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to remove host path");
                        TeardownOutcome::Failed(e.to_string())
                    }
                };
                report.push(TeardownTarget::HostPath(path.clone()), outcome);
            }
        }

        report
    }
}

/// Remove the directory of an entry that never made it to teardown.
async fn remove_host_path(action: &DeletionAction) {
    if let DeletionAction::DeleteWithHostPath(path) = action
        && let Err(e) = tokio::fs::remove_dir_all(path).await
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to remove host path");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
