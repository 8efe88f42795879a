//! Convergence poller.
//!
//! Bounded wait primitives that bridge sequential scenario steps to an
//! asynchronously reconciled remote system. Two strategies are exposed:
//!
//! - fixed-interval polling, bounded by `max_attempts × interval`; every
//!   attempt sleeps first and checks second
//! - a blocking watch bounded by a wall-clock deadline
//!
//! Every primitive takes its bound as an argument. A gateway error during an
//! attempt is logged and consumes that attempt; only an exhausted budget ends
//! a wait, and it always ends with [`WaitError::Timeout`], never with an
//! empty result.

mod job_pod;
mod phase;

pub use job_pod::{describe_phases, select_job_pod};
pub use phase::PodPhase;

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{GatewayError, WaitBudget, WaitError};
use crate::gateway::{Gateway, KindDescriptor, LogicalKind, Resource, ResourceRef, name_of};

/// Attempt budget and spacing for one polling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSpec {
    max_attempts: NonZeroU32,
    interval: Duration,
}

impl PollSpec {
    pub fn new(max_attempts: NonZeroU32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Convenience constructor; `None` when `max_attempts` is zero.
    pub fn try_new(max_attempts: u32, interval: Duration) -> Option<Self> {
        NonZeroU32::new(max_attempts).map(|n| Self::new(n, interval))
    }

    pub fn max_attempts(&self) -> NonZeroU32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Longest a poll with this spec can block.
    pub fn worst_case(&self) -> Duration {
        self.interval * self.max_attempts.get()
    }

    fn budget(&self) -> WaitBudget {
        WaitBudget::Attempts {
            attempts: self.max_attempts.get(),
            interval: self.interval,
        }
    }
}

/// Read-only wait primitives over a [`Gateway`].
pub struct Poller<'g, G> {
    gateway: &'g G,
}

impl<'g, G: Gateway> Poller<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &'g G {
        self.gateway
    }

    /// Poll `check` until it yields a value or the budget is spent.
    ///
    /// `target` describes what is being waited for and ends up in the
    /// timeout error.
    pub async fn poll<T, F, Fut>(
        &self,
        target: &str,
        spec: &PollSpec,
        mut check: F,
    ) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, GatewayError>>,
    {
        let started = Instant::now();
        let max_attempts = spec.max_attempts.get();

        for attempt in 1..=max_attempts {
            sleep(spec.interval).await;

            match check().await {
                Ok(Some(value)) => {
                    debug!(target = %target, attempt, "Condition satisfied");
                    return Ok(value);
                }
                Ok(None) => {
                    debug!(target = %target, attempt, max_attempts, "Condition not yet satisfied");
                }
                Err(e) => {
                    warn!(
                        target = %target,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Check failed, counting as a failed attempt"
                    );
                }
            }
        }

        Err(WaitError::Timeout {
            target: target.to_string(),
            budget: spec.budget(),
            elapsed: started.elapsed(),
        })
    }

    /// Wait until listing `kind` with `label_selector` returns something.
    ///
    /// Only the snapshot from the successful attempt is returned.
    pub async fn await_appearance(
        &self,
        kind: &KindDescriptor,
        label_selector: &str,
        spec: &PollSpec,
    ) -> Result<Vec<Resource>, WaitError> {
        let target = format!("{} with labels {}", kind, label_selector);
        let gateway = self.gateway;

        let items = self
            .poll(&target, spec, || async move {
                let items = gateway.list(kind, label_selector).await?;
                Ok::<_, GatewayError>((!items.is_empty()).then_some(items))
            })
            .await?;

        info!(target = %target, count = items.len(), "Resources appeared");
        Ok(items)
    }

    /// Wait until `reference` satisfies `predicate`.
    pub async fn await_condition<P>(
        &self,
        reference: &ResourceRef,
        description: &str,
        spec: &PollSpec,
        predicate: P,
    ) -> Result<Resource, WaitError>
    where
        P: Fn(&Resource) -> bool,
    {
        let target = format!("{} to be {}", reference, description);
        let gateway = self.gateway;
        let predicate = &predicate;

        self.poll(&target, spec, || async move {
            let obj = gateway.get(reference.kind(), reference.name()).await?;
            Ok::<_, GatewayError>(predicate(&obj).then_some(obj))
        })
        .await
    }

    /// Wait until the pod behind `reference` reaches `Succeeded` or `Failed`.
    ///
    /// Which of the two it reached is for the caller to judge.
    pub async fn await_terminal_phase(
        &self,
        reference: &ResourceRef,
        spec: &PollSpec,
    ) -> Result<Resource, WaitError> {
        let pod = self
            .await_condition(reference, "in a terminal phase", spec, |obj| {
                PodPhase::of(obj).is_terminal()
            })
            .await?;

        info!(resource = %reference, phase = %PodPhase::of(&pod), "Reached terminal phase");
        Ok(pod)
    }

    /// Block until one object matching `label_selector` is observed, in any
    /// phase, or until `deadline` elapses.
    pub async fn await_via_watch(
        &self,
        kind: &KindDescriptor,
        label_selector: &str,
        deadline: Duration,
    ) -> Result<Resource, WaitError> {
        let target = format!("{} with labels {}", kind, label_selector);
        let started = Instant::now();

        let watch = async {
            let mut stream = self.gateway.watch(kind, label_selector);
            while let Some(event) = stream.next().await {
                match event {
                    Ok(obj) => return Ok(obj),
                    Err(e) => {
                        warn!(target = %target, error = %e, "Watch error, still waiting");
                    }
                }
            }
            Err(WaitError::StreamEnded {
                target: target.clone(),
            })
        };

        let obj = timeout(deadline, watch)
            .await
            .map_err(|_| WaitError::Timeout {
                target: target.clone(),
                budget: WaitBudget::Deadline(deadline),
                elapsed: started.elapsed(),
            })??;

        info!(target = %target, name = %name_of(&obj), "Observed resource");
        Ok(obj)
    }

    /// Wait for the pod of a recurring or one-shot job and follow it to a
    /// terminal phase.
    ///
    /// Watches for the first matching pod, then takes a snapshot of every
    /// matching pod and applies [`select_job_pod`]. A pod that is not yet
    /// terminal is polled with `completion`.
    pub async fn await_job_pod(
        &self,
        label_selector: &str,
        watch_deadline: Duration,
        completion: &PollSpec,
    ) -> Result<Resource, WaitError> {
        let pods = LogicalKind::Pod.descriptor();
        let first = self.await_via_watch(&pods, label_selector, watch_deadline).await?;

        let snapshot = match self.gateway.list(&pods, label_selector).await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => vec![first],
            Err(e) => {
                warn!(selector = %label_selector, error = %e, "Snapshot of job pods failed, using watched pod");
                vec![first]
            }
        };

        let chosen = select_job_pod(&snapshot)
            .cloned()
            .ok_or_else(|| WaitError::NoUsablePod {
                selector: label_selector.to_string(),
                observed: describe_phases(&snapshot),
            })?;

        if snapshot.len() > 1 {
            debug!(
                selector = %label_selector,
                candidates = %describe_phases(&snapshot),
                chosen = %name_of(&chosen),
                "Several job pods matched"
            );
        }

        if PodPhase::of(&chosen).is_terminal() {
            return Ok(chosen);
        }

        let reference = ResourceRef::new(pods, self.gateway.namespace(), name_of(&chosen));
        self.await_terminal_phase(&reference, completion).await
    }
}
