//! MetadataBackupPolicy Custom Resource Definition.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// MetadataBackupPolicy schedules etcd snapshot (and optionally certificate)
/// backups into a [`BackupLocation`](super::BackupLocation).
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubedr.catalogicsoftware.com",
    version = "v1alpha1",
    kind = "MetadataBackupPolicy",
    plural = "metadatabackuppolicies",
    status = "MetadataBackupPolicyStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBackupPolicySpec {
    /// Name of the BackupLocation to back up into.
    pub destination: String,

    /// Host directory with cluster certificates to include in the backup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certs_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_endpoint: Option<String>,

    /// Name of the secret with etcd client credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_creds: Option<String>,

    /// Cron schedule.
    pub schedule: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retain_num_backups: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<bool>,
}

impl MetadataBackupPolicySpec {
    /// A policy firing every minute, which is what the suites use so the
    /// first backup pod shows up within the watch deadline.
    pub fn every_minute(destination: impl Into<String>, etcd_creds: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            certs_dir: None,
            etcd_endpoint: None,
            etcd_creds: Some(etcd_creds.into()),
            schedule: "*/1 * * * *".to_string(),
            options: None,
            retain_num_backups: None,
            suspend: None,
        }
    }

    pub fn with_certs_dir(mut self, certs_dir: impl Into<String>) -> Self {
        self.certs_dir = Some(certs_dir.into());
        self
    }
}

/// Results of the most recent backup run.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBackupPolicyStatus {
    #[serde(default)]
    pub files_changed: i64,

    #[serde(default)]
    pub files_new: i64,

    /// Name of the MetadataBackupRecord created for the run.
    #[serde(default)]
    pub mbr_name: String,
}

impl MetadataBackupPolicyStatus {
    pub fn files_total(&self) -> i64 {
        self.files_changed + self.files_new
    }
}
