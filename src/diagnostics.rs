//! Best-effort state capture before teardown.
//!
//! Runs once per scenario that got past its preconditions. Whatever goes
//! wrong in here is logged by the orchestrator and otherwise ignored.

use std::future::Future;
use std::path::Path;

use tokio::process::Command;
use tracing::{info, warn};

use crate::error::DiagnosticsError;
use crate::gateway::{BuiltinKind, KindDescriptor, LogicalKind};
use crate::scenario::Ledger;

/// Captures the state of the system under test.
pub trait DiagnosticCapture: Sync {
    fn capture(
        &self,
        namespace: &str,
        ledger: &Ledger,
    ) -> impl Future<Output = Result<(), DiagnosticsError>> + Send;
}

/// Captures nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl DiagnosticCapture for NoDiagnostics {
    async fn capture(&self, _namespace: &str, _ledger: &Ledger) -> Result<(), DiagnosticsError> {
        Ok(())
    }
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Shells out to `kubectl` and logs what it prints.
#[derive(Debug, Clone)]
pub struct KubectlDiagnostics {
    kubectl: String,
}

impl Default for KubectlDiagnostics {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl KubectlDiagnostics {
    pub fn new(kubectl: impl Into<String>) -> Self {
        Self {
            kubectl: kubectl.into(),
        }
    }

    /// Commands run for `ledger`, in order: describe volumes, everything in
    /// the namespace, each kubedr kind and the claims; then the logs of every
    /// observed pod; then a listing of every recorded host path.
    pub fn invocations(&self, namespace: &str, ledger: &Ledger) -> Vec<Invocation> {
        let kubectl = self.kubectl.as_str();
        let describe = |kind: &str| Invocation::new(kubectl, ["describe", kind, "-n", namespace]);

        let mut out = vec![Invocation::new(
            kubectl,
            ["describe".to_string(), BuiltinKind::PersistentVolume.api_resource().plural],
        )];
        out.push(describe("all"));
        for kind in LogicalKind::CUSTOM {
            out.push(describe(&kind.descriptor().plural()));
        }
        out.push(describe(
            &KindDescriptor::from(BuiltinKind::PersistentVolumeClaim).plural(),
        ));

        let pod_kind = LogicalKind::Pod.descriptor();
        for pod in ledger.observed().iter().filter(|r| r.kind() == &pod_kind) {
            out.push(Invocation::new(
                kubectl,
                ["logs", "--all-containers", pod.name(), "-n", namespace],
            ));
        }

        for path in ledger.host_paths() {
            out.push(host_path_listing(path));
        }
        out
    }
}

fn host_path_listing(path: &Path) -> Invocation {
    Invocation::new("ls", ["-lR".to_string(), path.display().to_string()])
}

impl DiagnosticCapture for KubectlDiagnostics {
    async fn capture(&self, namespace: &str, ledger: &Ledger) -> Result<(), DiagnosticsError> {
        let invocations = self.invocations(namespace, ledger);
        let total = invocations.len();
        let mut failed = 0;

        for invocation in &invocations {
            let command = invocation.command_line();
            let output = match Command::new(&invocation.program)
                .args(&invocation.args)
                .output()
                .await
            {
                Ok(output) => output,
                Err(e) => {
                    failed += 1;
                    warn!(command = %command, error = %e, "Failed to spawn diagnostic command");
                    continue;
                }
            };

            if output.status.success() {
                info!(
                    command = %command,
                    output = %String::from_utf8_lossy(&output.stdout),
                    "Diagnostic output"
                );
            } else {
                failed += 1;
                warn!(
                    command = %command,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "Diagnostic command failed"
                );
            }
        }

        if failed > 0 {
            return Err(DiagnosticsError::Partial { failed, total });
        }
        Ok(())
    }
}
