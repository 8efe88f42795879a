//! kubedr-e2e library crate
//!
//! End-to-end verification harness for the kubedr backup/restore operator.
//! Scenarios create kubedr resources through a [`gateway::Gateway`], wait for
//! the operator to converge with the [`poller`], and are torn down in reverse
//! creation order by the [`scenario`] orchestrator.

pub mod config;
pub mod crd;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod scenario;
pub mod suites;

pub use config::{HarnessConfig, TestEnv};
pub use diagnostics::{DiagnosticCapture, KubectlDiagnostics, NoDiagnostics};
pub use error::{GatewayError, Result, ScenarioError, WaitError};
pub use gateway::{Gateway, KindDescriptor, KubeGateway, LogicalKind, Resource, ResourceRef};
pub use poller::{PodPhase, PollSpec, Poller};
pub use scenario::{Orchestrator, Precondition, ScenarioContext, ScenarioReport, SuiteReport};
pub use suites::Suite;

/// Install the global tracing subscriber.
///
/// JSON lines unless `KUBEDR_E2E_LOG_FORMAT=pretty`. `RUST_LOG` directives
/// are honored on top of the harness defaults.
pub fn init_tracing() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("kubedr_e2e=info".parse()?)
        .add_directive("kube=warn".parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("KUBEDR_E2E_LOG_FORMAT").is_ok_and(|v| v == "pretty") {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    }
}
