//! The kubedr scenarios against a live cluster and operator.

use kubedr_e2e::scenario::Verdict;
use kubedr_e2e::suites::{
    BACKUP_LOCATION, BACKUP_LOCATION_INVALID_CREDENTIALS, BACKUP_WITH_CERTIFICATES_AND_RESTORE,
    BACKUP_WITHOUT_CERTIFICATES,
};
use kubedr_e2e::{KubectlDiagnostics, Suite};

use crate::{SharedTestCluster, init_tracing};

/// Run one scenario and fail the test unless it passed or was skipped.
async fn run_scenario(name: &str) {
    init_tracing();
    let cluster = SharedTestCluster::get().await;
    let gateway = cluster.gateway().await;
    let env = cluster
        .config()
        .load_test_env()
        .expect("Invalid environment data");
    let suite = Suite::new(
        &gateway,
        KubectlDiagnostics::default(),
        cluster.config(),
        env.as_ref(),
    );

    let report = suite.run(name).await.expect("Unknown scenario");
    println!("{}", report);
    assert!(
        matches!(report.verdict, Verdict::Passed | Verdict::Skipped { .. }),
        "{}",
        report
    );
    assert!(report.teardown.is_clean(), "{}", report);
}

#[tokio::test]
#[ignore = "requires Kubernetes cluster"]
async fn test_backup_location() {
    run_scenario(BACKUP_LOCATION).await;
}

#[tokio::test]
#[ignore = "requires Kubernetes cluster"]
async fn test_backup_location_invalid_credentials() {
    run_scenario(BACKUP_LOCATION_INVALID_CREDENTIALS).await;
}

#[tokio::test]
#[ignore = "requires Kubernetes cluster"]
async fn test_metadata_backup_without_certificates() {
    run_scenario(BACKUP_WITHOUT_CERTIFICATES).await;
}

#[tokio::test]
#[ignore = "requires Kubernetes cluster"]
async fn test_metadata_backup_with_certificates_and_restore() {
    run_scenario(BACKUP_WITH_CERTIFICATES_AND_RESTORE).await;
}
