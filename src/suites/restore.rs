//! Backup with certificates followed by a restore into a hostPath volume.

use std::path::Path;

use super::{BACKUP_WITH_CERTIFICATES_AND_RESTORE, Suite, fixtures};
use crate::crd::MetadataRestoreSpec;
use crate::diagnostics::DiagnosticCapture;
use crate::error::{Result, ensure};
use crate::gateway::{Gateway, JobType, LogicalKind, ResourceRef, name_of, spec_body};
use crate::poller::PodPhase;
use crate::scenario::{DeletionAction, ScenarioContext, ScenarioReport};

/// Output key under which the backup record to restore from is kept
const MBR_WITH_CERTS: &str = "mbr_with_certs";

impl<'a, G: Gateway, D: DiagnosticCapture> Suite<'a, G, D> {
    /// A policy with a certificates directory backs up more than the etcd
    /// snapshot, and restoring its record reproduces both on disk.
    pub async fn backup_with_certificates_and_restore(&self) -> ScenarioReport {
        let preconditions = [
            self.env_supplied(),
            self.etcd_supplied(),
            self.certs_dir_supplied(),
        ];
        self.orchestrator
            .run(BACKUP_WITH_CERTIFICATES_AND_RESTORE, &preconditions, async |ctx| {
                let env = self.env()?;
                let location = self
                    .create_initialized_location(ctx, env, &env.backuploc.secret_key)
                    .await?;

                let status = self
                    .run_backup(ctx, &location, self.etcd()?, Some(self.certs_dir()?))
                    .await?;
                ensure(status.files_total() > 1, || {
                    format!(
                        "expected certificates in the backup, got {} changed and {} new files",
                        status.files_changed, status.files_new
                    )
                })?;
                ensure(!status.mbr_name.is_empty(), || {
                    "policy status does not name a backup record".to_string()
                })?;
                ctx.set_output(MBR_WITH_CERTS, status.mbr_name);

                let mbr_name = ctx.output_str(MBR_WITH_CERTS)?.to_string();
                self.restore(ctx, &mbr_name).await
            })
            .await
    }

    async fn restore(&self, ctx: &mut ScenarioContext<'a, G>, mbr_name: &str) -> Result<()> {
        ctx.step("create restore volume");
        let volume = self.names.next("pv");
        let volume_dir = fixtures::host_path_dir(&volume)?;
        ctx.create(
            &LogicalKind::PersistentVolume.descriptor(),
            &volume,
            fixtures::host_path_volume(&volume_dir),
            DeletionAction::DeleteWithHostPath(volume_dir.clone()),
        )
        .await?;

        ctx.step("create restore claim");
        let claim_kind = LogicalKind::PersistentVolumeClaim.descriptor();
        let claim = self.names.next("pvc");
        ctx.create(
            &claim_kind,
            &claim,
            fixtures::claim_for_volume(&volume),
            DeletionAction::Delete,
        )
        .await?;

        ctx.step("wait for claim to bind");
        let claim_ref = ResourceRef::new(claim_kind, ctx.namespace(), claim.as_str());
        self.poller
            .await_condition(&claim_ref, "Bound", &self.config.pvc_bound, |obj| {
                obj.data.pointer("/status/phase").and_then(|p| p.as_str()) == Some("Bound")
            })
            .await?;

        ctx.step("create metadata restore");
        let restore = self.names.next("mr");
        let spec = MetadataRestoreSpec {
            mbr_name: mbr_name.to_string(),
            pvc_name: claim,
        };
        ctx.create(
            &LogicalKind::MetadataRestore.descriptor(),
            &restore,
            spec_body(&spec)?,
            DeletionAction::Delete,
        )
        .await?;

        ctx.step("wait for restore pod");
        let selector = self.selector(JobType::Restore, mbr_name);
        let pod = self
            .poller
            .await_job_pod(
                &selector,
                self.config.restore_pod_watch_timeout,
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
            format!("restore pod {} finished in phase {}", name_of(&pod), phase)
        })?;

        ctx.step("check restored files");
        check_restored_files(&volume_dir).await
    }
}

/// The restore writes the etcd snapshot and the certificates under `data/`.
async fn check_restored_files(volume_dir: &Path) -> Result<()> {
    let data = volume_dir.join("data");
    for expected in [data.join("etcd-snapshot.db"), data.join("certificates")] {
        let exists = tokio::fs::try_exists(&expected).await?;
        ensure(exists, || format!("{} does not exist", expected.display()))?;
    }

    let mut entries = tokio::fs::read_dir(volume_dir).await?;
    ensure(entries.next_entry().await?.is_some(), || {
        format!("{} is empty", volume_dir.display())
    })
}
