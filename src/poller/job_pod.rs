//! Choosing which pod represents a recurring job.
//!
//! A cron-driven backup can fire more than once while the harness is
//! looking, so a selector may match several pods. Nothing in the observed
//! data identifies a specific run, so the policy is fixed: prefer any pod
//! that already finished, then any running pod, then any pending pod, and
//! give up otherwise.

use super::PodPhase;
use crate::gateway::Resource;

/// Pick the pod to follow out of a snapshot of matching pods.
pub fn select_job_pod(pods: &[Resource]) -> Option<&Resource> {
    let with_phase = |wanted: fn(PodPhase) -> bool| {
        pods.iter().find(|pod| wanted(PodPhase::of(pod)))
    };

    with_phase(PodPhase::is_terminal)
        .or_else(|| with_phase(|p| p == PodPhase::Running))
        .or_else(|| with_phase(|p| p == PodPhase::Pending))
}

/// Comma-separated `name=phase` summary for error messages.
pub fn describe_phases(pods: &[Resource]) -> String {
    if pods.is_empty() {
        return "none".to_string();
    }
    pods.iter()
        .map(|pod| format!("{}={}", crate::gateway::name_of(pod), PodPhase::of(pod)))
        .collect::<Vec<_>>()
        .join(", ")
}
