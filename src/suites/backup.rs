//! Scheduled metadata backup scenarios.

use super::{BACKUP_WITHOUT_CERTIFICATES, Suite, fixtures};
use crate::config::EtcdData;
use crate::crd::{MetadataBackupPolicy, MetadataBackupPolicySpec, MetadataBackupPolicyStatus};
use crate::diagnostics::DiagnosticCapture;
use crate::error::{Result, ScenarioError, ensure};
use crate::gateway::{Gateway, JobType, LogicalKind, ResourceRef, name_of, parse, spec_body};
use crate::poller::PodPhase;
use crate::scenario::{DeletionAction, ScenarioContext, ScenarioReport};

impl<'a, G: Gateway, D: DiagnosticCapture> Suite<'a, G, D> {
    /// A policy without a certificates directory backs up exactly the etcd
    /// snapshot.
    pub async fn backup_without_certificates(&self) -> ScenarioReport {
        let preconditions = [self.env_supplied(), self.etcd_supplied()];
        self.orchestrator
            .run(BACKUP_WITHOUT_CERTIFICATES, &preconditions, async |ctx| {
                let env = self.env()?;
                let location = self
                    .create_initialized_location(ctx, env, &env.backuploc.secret_key)
                    .await?;

                let status = self.run_backup(ctx, &location, self.etcd()?, None).await?;
                ensure(status.files_total() == 1, || {
                    format!(
                        "expected exactly one backed up file, got {} changed and {} new",
                        status.files_changed, status.files_new
                    )
                })
            })
            .await
    }

    /// Create etcd credentials and a policy backing up into `destination`,
    /// wait for its cron job and for one of its runs to finish, and return
    /// the policy status.
    pub(super) async fn run_backup(
        &self,
        ctx: &mut ScenarioContext<'a, G>,
        destination: &str,
        etcd: &EtcdData,
        certs_dir: Option<&str>,
    ) -> Result<MetadataBackupPolicyStatus> {
        ctx.step("create etcd credentials");
        let etcd_creds = self.names.next("etcd-creds");
        let body = fixtures::etcd_credentials(etcd).await?;
        ctx.create(
            &LogicalKind::Secret.descriptor(),
            &etcd_creds,
            body,
            DeletionAction::Delete,
        )
        .await?;

        ctx.step("create backup policy");
        let policy_kind = LogicalKind::MetadataBackupPolicy.descriptor();
        let policy = self.names.next("backup");
        let mut spec = MetadataBackupPolicySpec::every_minute(destination, etcd_creds);
        if let Some(dir) = certs_dir {
            spec = spec.with_certs_dir(dir);
        }
        ctx.create(
            &policy_kind,
            &policy,
            spec_body(&spec)?,
            DeletionAction::Delete,
        )
        .await?;

        ctx.step("wait for backup cron job");
        let selector = self.selector(JobType::Backup, &policy);
        let cronjobs = self
            .poller
            .await_appearance(
                &LogicalKind::CronJob.descriptor(),
                &selector,
                &self.config.appear,
            )
            .await?;
        ensure(cronjobs.len() == 1, || {
            format!(
                "expected one cron job for {}, found: ({})",
                policy,
                cronjobs.iter().map(name_of).collect::<Vec<_>>().join(", ")
            )
        })?;

        ctx.step("wait for backup pod");
        let pod = self
            .poller
            .await_job_pod(
                &selector,
                self.config.backup_pod_watch_timeout,
                &self.config.completion,
            )
            .await?;
        ctx.observe(ResourceRef::new(
            LogicalKind::Pod.descriptor(),
            ctx.namespace(),
            name_of(&pod),
        ));
        let phase = PodPhase::of(&pod);
        ensure(phase == PodPhase::Succeeded, || {
            format!("backup pod {} finished in phase {}", name_of(&pod), phase)
        })?;

        ctx.step("read backup policy status");
        let obj = self
            .orchestrator
            .gateway()
            .get(&policy_kind, &policy)
            .await?;
        let policy_obj: MetadataBackupPolicy = parse(&obj)?;
        let status = policy_obj
            .status
            .ok_or_else(|| ScenarioError::Shape(format!("policy {} has no status", policy)))?;
        tracing::info!(
            policy = %policy,
            files_changed = status.files_changed,
            files_new = status.files_new,
            mbr = %status.mbr_name,
            "Backup finished"
        );
        Ok(status)
    }
}
