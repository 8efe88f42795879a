//! Kind descriptors and resource references.

use std::fmt;

use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Pod, Secret};
use kube::Resource;
use kube::discovery::ApiResource;

use crate::crd::{BackupLocation, MetadataBackupPolicy, MetadataBackupRecord, MetadataRestore};

/// Built-in Kubernetes kinds the harness touches. A type tag is enough to
/// address them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Pod,
    Secret,
    CronJob,
    PersistentVolume,
    PersistentVolumeClaim,
}

impl BuiltinKind {
    pub fn api_resource(self) -> ApiResource {
        match self {
            BuiltinKind::Pod => ApiResource::erase::<Pod>(&()),
            BuiltinKind::Secret => ApiResource::erase::<Secret>(&()),
            BuiltinKind::CronJob => ApiResource::erase::<CronJob>(&()),
            BuiltinKind::PersistentVolume => ApiResource::erase::<PersistentVolume>(&()),
            BuiltinKind::PersistentVolumeClaim => ApiResource::erase::<PersistentVolumeClaim>(&()),
        }
    }

    pub fn is_namespaced(self) -> bool {
        !matches!(self, BuiltinKind::PersistentVolume)
    }
}

/// A custom kind: group, version, kind and plural are all data.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CustomKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl CustomKind {
    /// Descriptor for a type generated by `#[derive(CustomResource)]`.
    pub fn of<K: Resource<DynamicType = ()>>() -> Self {
        Self {
            group: K::group(&()).into_owned(),
            version: K::version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
            plural: K::plural(&()).into_owned(),
        }
    }

    fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// Identifies a remote kind: built-ins need a type tag, custom kinds their
/// group/version/kind/plural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KindDescriptor {
    Builtin(BuiltinKind),
    Custom(CustomKind),
}

impl KindDescriptor {
    pub fn api_resource(&self) -> ApiResource {
        match self {
            KindDescriptor::Builtin(kind) => kind.api_resource(),
            KindDescriptor::Custom(custom) => ApiResource {
                group: custom.group.clone(),
                version: custom.version.clone(),
                api_version: custom.api_version(),
                kind: custom.kind.clone(),
                plural: custom.plural.clone(),
            },
        }
    }

    /// Kind name, e.g. `Pod` or `BackupLocation`.
    pub fn kind(&self) -> String {
        match self {
            KindDescriptor::Builtin(kind) => kind.api_resource().kind,
            KindDescriptor::Custom(custom) => custom.kind.clone(),
        }
    }

    /// Plural resource name as `kubectl` accepts it.
    pub fn plural(&self) -> String {
        match self {
            KindDescriptor::Builtin(kind) => kind.api_resource().plural,
            KindDescriptor::Custom(custom) => format!("{}.{}", custom.plural, custom.group),
        }
    }

    /// All kubedr custom kinds are namespaced.
    pub fn is_namespaced(&self) -> bool {
        match self {
            KindDescriptor::Builtin(kind) => kind.is_namespaced(),
            KindDescriptor::Custom(_) => true,
        }
    }
}

impl From<BuiltinKind> for KindDescriptor {
    fn from(kind: BuiltinKind) -> Self {
        KindDescriptor::Builtin(kind)
    }
}

impl fmt::Display for KindDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plural())
    }
}

/// Logical names of every kind the harness works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    Pod,
    Secret,
    CronJob,
    PersistentVolume,
    PersistentVolumeClaim,
    BackupLocation,
    MetadataBackupPolicy,
    MetadataBackupRecord,
    MetadataRestore,
}

impl LogicalKind {
    pub const CUSTOM: [LogicalKind; 4] = [
        LogicalKind::BackupLocation,
        LogicalKind::MetadataBackupPolicy,
        LogicalKind::MetadataBackupRecord,
        LogicalKind::MetadataRestore,
    ];

    pub fn descriptor(self) -> KindDescriptor {
        match self {
            LogicalKind::Pod => BuiltinKind::Pod.into(),
            LogicalKind::Secret => BuiltinKind::Secret.into(),
            LogicalKind::CronJob => BuiltinKind::CronJob.into(),
            LogicalKind::PersistentVolume => BuiltinKind::PersistentVolume.into(),
            LogicalKind::PersistentVolumeClaim => BuiltinKind::PersistentVolumeClaim.into(),
            LogicalKind::BackupLocation => KindDescriptor::Custom(CustomKind::of::<BackupLocation>()),
            LogicalKind::MetadataBackupPolicy => {
                KindDescriptor::Custom(CustomKind::of::<MetadataBackupPolicy>())
            }
            LogicalKind::MetadataBackupRecord => {
                KindDescriptor::Custom(CustomKind::of::<MetadataBackupRecord>())
            }
            LogicalKind::MetadataRestore => {
                KindDescriptor::Custom(CustomKind::of::<MetadataRestore>())
            }
        }
    }
}

/// Reference to one remote object. Fixed at creation; the remote object's
/// status may change, the reference never does.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    kind: KindDescriptor,
    namespace: Option<String>,
    name: String,
}

impl ResourceRef {
    /// Reference `name` of `kind`. The namespace is dropped for
    /// cluster-scoped kinds.
    pub fn new(kind: KindDescriptor, namespace: &str, name: impl Into<String>) -> Self {
        let namespace = kind.is_namespaced().then(|| namespace.to_string());
        Self {
            kind,
            namespace,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> &KindDescriptor {
        &self.kind
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}
