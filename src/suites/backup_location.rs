//! Backup location scenarios.
//!
//! Creating a backup location makes the operator run a one-shot pod that
//! initializes the restic repository, then annotate the location with the
//! outcome.

use super::{BACKUP_LOCATION, BACKUP_LOCATION_INVALID_CREDENTIALS, Suite, fixtures};
use crate::config::TestEnv;
use crate::crd::{BackupLocationSpec, InitState};
use crate::diagnostics::DiagnosticCapture;
use crate::error::{Result, ensure};
use crate::gateway::{Gateway, JobType, LogicalKind, ResourceRef, name_of, spec_body};
use crate::poller::PodPhase;
use crate::scenario::{DeletionAction, ScenarioContext, ScenarioReport};

/// A created backup location and how its init pod ended.
pub(super) struct CreatedLocation {
    pub name: String,
    pub init_phase: PodPhase,
}

impl<'a, G: Gateway, D: DiagnosticCapture> Suite<'a, G, D> {
    /// A backup location with valid credentials initializes successfully.
    pub async fn backup_location(&self) -> ScenarioReport {
        let preconditions = [self.env_supplied()];
        self.orchestrator
            .run(BACKUP_LOCATION, &preconditions, async |ctx| {
                let env = self.env()?;
                self.create_initialized_location(ctx, env, &env.backuploc.secret_key)
                    .await?;
                Ok(())
            })
            .await
    }

    /// A backup location with a corrupted secret key: the init pod still
    /// finishes and the location is not marked initialized.
    pub async fn backup_location_invalid_credentials(&self) -> ScenarioReport {
        let preconditions = [self.env_supplied()];
        self.orchestrator
            .run(BACKUP_LOCATION_INVALID_CREDENTIALS, &preconditions, async |ctx| {
                let env = self.env()?;
                let bad_key = format!("{}s", env.backuploc.secret_key);
                let location = self.create_backup_location(ctx, env, &bad_key).await?;

                ctx.step("check init annotation");
                let obj = self
                    .orchestrator
                    .gateway()
                    .get(&LogicalKind::BackupLocation.descriptor(), &location.name)
                    .await?;
                let state = InitState::of(&obj);
                ensure(state.is_not_initialized(), || {
                    format!(
                        "backup location {} is initialized despite invalid credentials (init pod {})",
                        location.name, location.init_phase
                    )
                })
            })
            .await
    }

    /// Create a backup location and require that it initializes. Returns
    /// its name.
    pub(super) async fn create_initialized_location(
        &self,
        ctx: &mut ScenarioContext<'a, G>,
        env: &TestEnv,
        secret_key: &str,
    ) -> Result<String> {
        let location = self.create_backup_location(ctx, env, secret_key).await?;
        ensure(location.init_phase == PodPhase::Succeeded, || {
            format!(
                "init pod for {} finished in phase {}",
                location.name, location.init_phase
            )
        })?;

        ctx.step("check init annotation");
        let obj = self
            .orchestrator
            .gateway()
            .get(&LogicalKind::BackupLocation.descriptor(), &location.name)
            .await?;
        let state = InitState::of(&obj);
        ensure(state == InitState::Initialized, || {
            format!(
                "expected {} annotation on {} to be \"true\", found {}",
                crate::crd::INIT_ANNOTATION,
                location.name,
                state
            )
        })?;

        ctx.set_output("backup_location", location.name.as_str());
        Ok(location.name)
    }

    /// Create the credentials secret and the backup location, then follow
    /// the init pod to a terminal phase.
    pub(super) async fn create_backup_location(
        &self,
        ctx: &mut ScenarioContext<'a, G>,
        env: &TestEnv,
        secret_key: &str,
    ) -> Result<CreatedLocation> {
        ctx.step("create backup location credentials");
        let creds = self.names.next("s3creds");
        let body = fixtures::backup_location_credentials(
            &env.backuploc.access_key,
            secret_key,
            &env.restic_password,
        )?;
        ctx.create(
            &LogicalKind::Secret.descriptor(),
            &creds,
            body,
            DeletionAction::Delete,
        )
        .await?;

        ctx.step("create backup location");
        let name = self.names.next("tests3");
        let spec = BackupLocationSpec {
            url: env.backuploc.endpoint.clone(),
            bucket_name: self.names.next(&env.backuploc.bucket_name_prefix),
            credentials: creds,
        };
        ctx.create(
            &LogicalKind::BackupLocation.descriptor(),
            &name,
            spec_body(&spec)?,
            DeletionAction::Delete,
        )
        .await?;

        ctx.step("wait for init pod");
        let pod_kind = LogicalKind::Pod.descriptor();
        let selector = self.selector(JobType::BackupLocationInit, &name);
        let pods = self
            .poller
            .await_appearance(&pod_kind, &selector, &self.config.appear)
            .await?;
        ensure(pods.len() == 1, || {
            format!(
                "Found pods: ({})",
                pods.iter().map(name_of).collect::<Vec<_>>().join(", ")
            )
        })?;
        let pod_ref = ResourceRef::new(
            pod_kind,
            ctx.namespace(),
            pods.first().map(name_of).unwrap_or_default(),
        );
        ctx.observe(pod_ref.clone());

        ctx.step("wait for init pod to finish");
        let pod = self
            .poller
            .await_terminal_phase(&pod_ref, &self.config.completion)
            .await?;

        Ok(CreatedLocation {
            name,
            init_phase: PodPhase::of(&pod),
        })
    }
}
