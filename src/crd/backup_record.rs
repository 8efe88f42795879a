//! MetadataBackupRecord Custom Resource Definition.
//!
//! Records are created by the operator, never by the harness; the type is
//! here so diagnostics and restores can refer to it.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubedr.catalogicsoftware.com",
    version = "v1alpha1",
    kind = "MetadataBackupRecord",
    plural = "metadatabackuprecords",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBackupRecordSpec {
    pub snapshot_id: String,
    /// Policy that produced the snapshot.
    pub policy: String,
}
