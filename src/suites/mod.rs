//! kubedr end-to-end scenarios.
//!
//! Each scenario owns its own ledger: it creates everything it needs, from
//! credentials up, and everything is torn down when it ends.

mod backup;
mod backup_location;
pub mod fixtures;
mod restore;

use crate::config::{EtcdData, HarnessConfig, TestEnv};
use crate::diagnostics::DiagnosticCapture;
use crate::error::{Result, ScenarioError};
use crate::gateway::{Gateway, JobSelector, JobType};
use crate::poller::Poller;
use crate::scenario::{Orchestrator, Precondition, ScenarioReport, SuiteReport};

pub use fixtures::NameGenerator;

pub const BACKUP_LOCATION: &str = "backup-location";
pub const BACKUP_LOCATION_INVALID_CREDENTIALS: &str = "backup-location-invalid-credentials";
pub const BACKUP_WITHOUT_CERTIFICATES: &str = "metadata-backup-without-certificates";
pub const BACKUP_WITH_CERTIFICATES_AND_RESTORE: &str = "metadata-backup-with-certificates-and-restore";

/// Every scenario, in the order [`Suite::run_all`] runs them.
pub const SCENARIOS: [&str; 4] = [
    BACKUP_LOCATION,
    BACKUP_LOCATION_INVALID_CREDENTIALS,
    BACKUP_WITHOUT_CERTIFICATES,
    BACKUP_WITH_CERTIFICATES_AND_RESTORE,
];

/// The kubedr scenarios wired to one gateway, configuration and
/// environment.
pub struct Suite<'a, G, D> {
    orchestrator: Orchestrator<'a, G, D>,
    poller: Poller<'a, G>,
    config: &'a HarnessConfig,
    env: Option<&'a TestEnv>,
    names: NameGenerator,
}

impl<'a, G: Gateway, D: DiagnosticCapture> Suite<'a, G, D> {
    pub fn new(
        gateway: &'a G,
        diagnostics: D,
        config: &'a HarnessConfig,
        env: Option<&'a TestEnv>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(gateway, diagnostics),
            poller: Poller::new(gateway),
            config,
            env,
            names: NameGenerator::new(),
        }
    }

    /// Run every scenario whose name contains `filter` (all when `None`).
    pub async fn run_all(&self, filter: Option<&str>) -> SuiteReport {
        let mut report = SuiteReport::default();
        for name in SCENARIOS
            .into_iter()
            .filter(|name| filter.is_none_or(|f| name.contains(f)))
        {
            if let Some(scenario) = self.run(name).await {
                report.push(scenario);
            }
        }
        report
    }

    /// Run one scenario by name; `None` if no scenario has that name.
    pub async fn run(&self, name: &str) -> Option<ScenarioReport> {
        let report = match name {
            BACKUP_LOCATION => self.backup_location().await,
            BACKUP_LOCATION_INVALID_CREDENTIALS => {
                self.backup_location_invalid_credentials().await
            }
            BACKUP_WITHOUT_CERTIFICATES => self.backup_without_certificates().await,
            BACKUP_WITH_CERTIFICATES_AND_RESTORE => {
                self.backup_with_certificates_and_restore().await
            }
            _ => return None,
        };
        Some(report)
    }

    fn selector(&self, job_type: JobType, owner: &str) -> String {
        JobSelector::new(self.config.label_prefix.as_str(), job_type, owner).to_string()
    }

    fn env_supplied(&self) -> Precondition {
        Precondition::require(
            self.env.is_some(),
            "Test environment data is not given",
        )
    }

    fn etcd_supplied(&self) -> Precondition {
        Precondition::require(
            self.env.is_some_and(|env| env.etcd_data.is_some()),
            "etcd data is not given",
        )
    }

    fn certs_dir_supplied(&self) -> Precondition {
        Precondition::require(
            self.env.is_some_and(|env| env.certs_dir.is_some()),
            "Certificates dir is not given",
        )
    }

    fn env(&self) -> Result<&'a TestEnv> {
        self.env.ok_or(ScenarioError::MissingEnv("testenv"))
    }

    fn etcd(&self) -> Result<&'a EtcdData> {
        self.env()?
            .etcd_data
            .as_ref()
            .ok_or(ScenarioError::MissingEnv("etcd_data"))
    }

    fn certs_dir(&self) -> Result<&'a str> {
        self.env()?
            .certs_dir
            .as_deref()
            .ok_or(ScenarioError::MissingEnv("certs_dir"))
    }
}
