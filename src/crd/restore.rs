//! MetadataRestore Custom Resource Definition.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// MetadataRestore copies a backup record's snapshot into a PVC.
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubedr.catalogicsoftware.com",
    version = "v1alpha1",
    kind = "MetadataRestore",
    plural = "metadatarestores",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRestoreSpec {
    /// MetadataBackupRecord to restore from.
    pub mbr_name: String,

    /// Claim the snapshot is written into.
    pub pvc_name: String,
}
