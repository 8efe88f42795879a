//! kubedr Custom Resource Definitions, as seen from the outside.
//!
//! Field names are the wire contract with the operator under test.
//!
//! - `BackupLocation`: S3 target plus credentials, initialized asynchronously
//! - `MetadataBackupPolicy`: scheduled etcd/certificate backups
//! - `MetadataBackupRecord`: one snapshot produced by a policy
//! - `MetadataRestore`: restore of a record into a PVC

mod backup_location;
mod backup_policy;
mod backup_record;
mod restore;

pub use backup_location::*;
pub use backup_policy::*;
pub use backup_record::*;
pub use restore::*;

/// API group of every kubedr custom resource
pub const GROUP: &str = "kubedr.catalogicsoftware.com";

/// API version of every kubedr custom resource
pub const VERSION: &str = "v1alpha1";
