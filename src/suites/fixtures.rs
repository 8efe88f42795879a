//! Names and request bodies for the resources the suites create.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use jiff::Timestamp;
use k8s_openapi::ByteString;
use serde_json::{Value, json};

use crate::config::EtcdData;
use crate::error::{GatewayError, Result, ScenarioError};

/// Capacity of the restore target volume
pub const RESTORE_VOLUME_SIZE: &str = "2Gi";

/// Storage class both the volume and its claim use
pub const STORAGE_CLASS: &str = "standard";

/// Hands out `<prefix>-<unix seconds>` names.
///
/// Two names issued within the same second get consecutive suffixes, so a
/// name is never handed out twice by one generator.
#[derive(Debug, Default)]
pub struct NameGenerator {
    last: AtomicI64,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, prefix: &str) -> String {
        let now = Timestamp::now().as_second();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return format!("{}-{}", prefix, candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

fn opaque_secret(data: BTreeMap<String, ByteString>) -> Result<Value, GatewayError> {
    Ok(json!({
        "type": "Opaque",
        "data": serde_json::to_value(data)?,
    }))
}

/// Secret the backup location reads its access keys and repository
/// password from.
pub fn backup_location_credentials(
    access_key: &str,
    secret_key: &str,
    restic_password: &str,
) -> Result<Value, GatewayError> {
    let data = [
        ("access_key", access_key),
        ("secret_key", secret_key),
        ("restic_repo_password", restic_password),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
    .collect();
    opaque_secret(data)
}

/// Secret with the etcd client certificates, read from local files.
pub async fn etcd_credentials(etcd: &EtcdData) -> Result<Value> {
    let mut data = BTreeMap::new();
    for (key, path) in [
        ("ca.crt", &etcd.ca_crt),
        ("client.crt", &etcd.client_crt),
        ("client.key", &etcd.client_key),
    ] {
        let contents = tokio::fs::read(path).await.map_err(|e| {
            ScenarioError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        data.insert(key.to_string(), ByteString(contents));
    }
    Ok(opaque_secret(data)?)
}

/// Fresh local directory to back a hostPath volume, unique per call.
///
/// The directory outlives this call; it is removed by teardown of the
/// volume that uses it.
pub fn host_path_dir(name: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(&format!("{}-", name))
        .tempdir()?;
    Ok(dir.keep())
}

/// hostPath persistent volume the restore writes into.
pub fn host_path_volume(path: &Path) -> Value {
    json!({
        "spec": {
            "accessModes": ["ReadWriteOnce"],
            "capacity": { "storage": RESTORE_VOLUME_SIZE },
            "hostPath": { "path": path.display().to_string() },
            "persistentVolumeReclaimPolicy": "Delete",
            "storageClassName": STORAGE_CLASS,
            "volumeMode": "Filesystem",
        }
    })
}

/// Claim pinned to `volume_name`.
pub fn claim_for_volume(volume_name: &str) -> Value {
    json!({
        "spec": {
            "accessModes": ["ReadWriteOnce"],
            "resources": { "requests": { "storage": RESTORE_VOLUME_SIZE } },
            "storageClassName": STORAGE_CLASS,
            "volumeMode": "Filesystem",
            "volumeName": volume_name,
        }
    })
}
