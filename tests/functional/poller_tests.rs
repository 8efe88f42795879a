//! Convergence poller behavior against the in-memory gateway.

use std::time::Duration;

use tokio::time::Instant;

use kubedr_e2e::error::{WaitBudget, WaitError};
use kubedr_e2e::gateway::{LogicalKind, ResourceRef, name_of};
use kubedr_e2e::poller::{PodPhase, PollSpec, Poller};

use crate::common::{FakeGateway, NAMESPACE, Op, pod};

const SELECTOR: &str = "kubedr.type=backuploc-init,kubedr.backuploc=tests3-100";

fn init_pod(name: &str, phase: Option<&str>) -> kube::api::DynamicObject {
    pod(
        name,
        &[("kubedr.type", "backuploc-init"), ("kubedr.backuploc", "tests3-100")],
        phase,
    )
}

fn spec(attempts: u32, secs: u64) -> PollSpec {
    PollSpec::try_new(attempts, Duration::from_secs(secs)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_appearance_times_out_after_full_budget() {
    let gateway = FakeGateway::default();
    let poller = Poller::new(&gateway);
    let pods = LogicalKind::Pod.descriptor();

    let started = Instant::now();
    let err = poller
        .await_appearance(&pods, SELECTOR, &spec(15, 1))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(15));
    assert!(elapsed < Duration::from_secs(16));
    assert_eq!(gateway.count(Op::List), 15);

    match err {
        WaitError::Timeout { target, budget, .. } => {
            assert!(target.contains(SELECTOR));
            assert_eq!(
                budget,
                WaitBudget::Attempts {
                    attempts: 15,
                    interval: Duration::from_secs(1)
                }
            );
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_appearance_returns_right_after_first_success() {
    let gateway = FakeGateway::default();
    gateway.insert(init_pod("tests3-100-init-a", Some("Pending")));
    gateway.hide_from_lists("Pod", 2);
    let poller = Poller::new(&gateway);

    let started = Instant::now();
    let pods = poller
        .await_appearance(&LogicalKind::Pod.descriptor(), SELECTOR, &spec(15, 1))
        .await
        .unwrap();

    assert_eq!(pods.len(), 1);
    assert_eq!(gateway.count(Op::List), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_sleep_comes_before_first_check() {
    let gateway = FakeGateway::default();
    gateway.insert(init_pod("tests3-100-init-a", Some("Running")));
    let poller = Poller::new(&gateway);

    let started = Instant::now();
    poller
        .await_appearance(&LogicalKind::Pod.descriptor(), SELECTOR, &spec(5, 2))
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(2));
    assert_eq!(gateway.count(Op::List), 1);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_errors_consume_attempts_without_aborting() {
    let gateway = FakeGateway::default();
    gateway.insert(init_pod("tests3-100-init-a", None));
    gateway.fail_lists(2);
    let poller = Poller::new(&gateway);

    let pods = poller
        .await_appearance(&LogicalKind::Pod.descriptor(), SELECTOR, &spec(3, 1))
        .await
        .unwrap();
    assert_eq!(pods.len(), 1);
    assert_eq!(gateway.count(Op::List), 3);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_errors_can_exhaust_budget() {
    let gateway = FakeGateway::default();
    gateway.insert(init_pod("tests3-100-init-a", None));
    gateway.fail_lists(3);
    let poller = Poller::new(&gateway);

    let err = poller
        .await_appearance(&LogicalKind::Pod.descriptor(), SELECTOR, &spec(3, 1))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_phase_followed_until_done() {
    let gateway = FakeGateway::default();
    gateway.insert(init_pod("p", Some("Pending")));
    gateway.script_phases("p", &["Pending", "Running", "Running", "Failed"]);
    let poller = Poller::new(&gateway);
    let reference = ResourceRef::new(LogicalKind::Pod.descriptor(), NAMESPACE, "p");

    let started = Instant::now();
    let pod = poller
        .await_terminal_phase(&reference, &spec(100, 3))
        .await
        .unwrap();

    // Reaching Failed ends the wait; judging it is the caller's job.
    assert_eq!(PodPhase::of(&pod), PodPhase::Failed);
    assert_eq!(gateway.count(Op::Get), 4);
    assert_eq!(started.elapsed(), Duration::from_secs(12));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_phase_on_missing_pod_times_out() {
    let gateway = FakeGateway::default();
    let poller = Poller::new(&gateway);
    let reference = ResourceRef::new(LogicalKind::Pod.descriptor(), NAMESPACE, "ghost");

    let err = poller
        .await_terminal_phase(&reference, &spec(4, 3))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().contains("ghost"));
    assert_eq!(gateway.count(Op::Get), 4);
}

#[tokio::test(start_paused = true)]
async fn test_await_condition_on_claim() {
    let gateway = FakeGateway::default();
    let claim = LogicalKind::PersistentVolumeClaim.descriptor();
    gateway.insert(crate::common::labeled(
        &claim.api_resource(),
        "pvc-1",
        &[],
        Some("Pending"),
    ));
    gateway.script_phases("pvc-1", &["Pending", "Bound"]);
    let poller = Poller::new(&gateway);
    let reference = ResourceRef::new(claim, NAMESPACE, "pvc-1");

    let obj = poller
        .await_condition(&reference, "Bound", &spec(30, 1), |obj| {
            obj.data.pointer("/status/phase").and_then(|p| p.as_str()) == Some("Bound")
        })
        .await
        .unwrap();
    assert_eq!(name_of(&obj), "pvc-1");
    assert_eq!(gateway.count(Op::Get), 2);
}

#[tokio::test(start_paused = true)]
async fn test_watch_returns_first_match_in_any_phase() {
    let gateway = FakeGateway::default();
    gateway.insert(init_pod("tests3-100-init-a", Some("Pending")));
    let poller = Poller::new(&gateway);

    let obj = poller
        .await_via_watch(
            &LogicalKind::Pod.descriptor(),
            SELECTOR,
            Duration::from_secs(75),
        )
        .await
        .unwrap();
    assert_eq!(PodPhase::of(&obj), PodPhase::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_watch_times_out_at_deadline() {
    let gateway = FakeGateway::default();
    gateway.fail_watch(2);
    let poller = Poller::new(&gateway);

    let started = Instant::now();
    let err = poller
        .await_via_watch(
            &LogicalKind::Pod.descriptor(),
            SELECTOR,
            Duration::from_secs(75),
        )
        .await
        .unwrap_err();

    assert_eq!(started.elapsed(), Duration::from_secs(75));
    match err {
        WaitError::Timeout { budget, .. } => {
            assert_eq!(budget, WaitBudget::Deadline(Duration::from_secs(75)));
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_job_pod_prefers_finished_pod() {
    let gateway = FakeGateway::default();
    let labels = [("kubedr.type", "backup"), ("kubedr.backup-policy", "backup-1")];
    gateway.insert(pod("backup-1-a", &labels, Some("Running")));
    gateway.insert(pod("backup-1-b", &labels, Some("Succeeded")));
    let poller = Poller::new(&gateway);

    let chosen = poller
        .await_job_pod(
            "kubedr.type=backup,kubedr.backup-policy=backup-1",
            Duration::from_secs(75),
            &spec(100, 3),
        )
        .await
        .unwrap();

    assert_eq!(name_of(&chosen), "backup-1-b");
    // Already terminal: no follow-up polling.
    assert_eq!(gateway.count(Op::Get), 0);
}

#[tokio::test(start_paused = true)]
async fn test_job_pod_follows_running_pod() {
    let gateway = FakeGateway::default();
    let labels = [("kubedr.type", "backup"), ("kubedr.backup-policy", "backup-1")];
    gateway.insert(pod("backup-1-a", &labels, Some("Running")));
    gateway.script_phases("backup-1-a", &["Running", "Succeeded"]);
    let poller = Poller::new(&gateway);

    let chosen = poller
        .await_job_pod(
            "kubedr.type=backup,kubedr.backup-policy=backup-1",
            Duration::from_secs(75),
            &spec(100, 3),
        )
        .await
        .unwrap();

    assert_eq!(name_of(&chosen), "backup-1-a");
    assert_eq!(PodPhase::of(&chosen), PodPhase::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn test_job_pod_without_usable_phase_fails() {
    let gateway = FakeGateway::default();
    let labels = [("kubedr.type", "restore"), ("kubedr.restore-mbr", "mbr-1")];
    gateway.insert(pod("mr-1-restore", &labels, None));
    let poller = Poller::new(&gateway);

    let err = poller
        .await_job_pod(
            "kubedr.type=restore,kubedr.restore-mbr=mbr-1",
            Duration::from_secs(120),
            &spec(100, 3),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WaitError::NoUsablePod { .. }));
}
