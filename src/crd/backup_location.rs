//! BackupLocation Custom Resource Definition.

use kube::CustomResource;
use kube::api::DynamicObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annotation the operator sets once repository initialization finishes.
pub const INIT_ANNOTATION: &str = "initialized.annotations.kubedr.catalogicsoftware.com";

/// BackupLocation points kubedr at an S3-compatible bucket.
///
/// Example:
/// ```yaml
/// apiVersion: kubedr.catalogicsoftware.com/v1alpha1
/// kind: BackupLocation
/// metadata:
///   name: tests3-1589412345
/// spec:
///   url: http://10.0.0.5:9000
///   bucketName: kubedr-1589412345
///   credentials: s3creds-1589412345
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubedr.catalogicsoftware.com",
    version = "v1alpha1",
    kind = "BackupLocation",
    plural = "backuplocations",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct BackupLocationSpec {
    /// Endpoint of the object store.
    pub url: String,

    /// Bucket to create the restic repository in.
    pub bucket_name: String,

    /// Name of the secret holding access keys and the repository password.
    pub credentials: String,
}

/// Outcome of asynchronous repository initialization, read from
/// [`INIT_ANNOTATION`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitState {
    /// Annotation absent: the operator has not recorded an outcome
    Unknown,
    Initialized,
    NotInitialized,
}

impl InitState {
    /// Read the init annotation off an observed backup location.
    pub fn of(obj: &DynamicObject) -> Self {
        let value = obj
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(INIT_ANNOTATION))
            .map(String::as_str);
        match value {
            Some("true") => InitState::Initialized,
            Some(_) => InitState::NotInitialized,
            None => InitState::Unknown,
        }
    }

    /// Initialization did not (or not yet) succeed.
    pub fn is_not_initialized(self) -> bool {
        !matches!(self, InitState::Initialized)
    }
}

impl std::fmt::Display for InitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitState::Unknown => write!(f, "absent"),
            InitState::Initialized => write!(f, "\"true\""),
            InitState::NotInitialized => write!(f, "not \"true\""),
        }
    }
}
