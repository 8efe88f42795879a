//! Harness configuration.
//!
//! Built once at process start from the environment and passed by reference
//! into the poller, orchestrator and suites. Every wait budget is explicit
//! here; nothing downstream falls back to a hidden default.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::poller::PollSpec;

/// Namespace the kubedr operator runs in
pub const DEFAULT_NAMESPACE: &str = "kubedr-system";

/// Prefix of the labels the operator puts on job pods and cron jobs
pub const DEFAULT_LABEL_PREFIX: &str = "kubedr.";

/// Environment variable names.
pub mod keys {
    pub const NAMESPACE: &str = "KUBEDR_E2E_NAMESPACE";
    pub const LABEL_PREFIX: &str = "KUBEDR_E2E_LABEL_PREFIX";
    pub const APPEAR_ATTEMPTS: &str = "WAIT_FOR_RES_TO_APPEAR_NUM_ATTEMPTS";
    pub const APPEAR_INTERVAL: &str = "WAIT_FOR_RES_TO_APPEAR_INTERVAL_SECS";
    pub const DONE_ATTEMPTS: &str = "WAIT_FOR_POD_TO_BE_DONE_NUM_ATTEMPTS";
    pub const DONE_INTERVAL: &str = "WAIT_FOR_POD_TO_BE_DONE_INTERVAL_SECS";
    pub const BACKUP_WATCH_TIMEOUT: &str = "BACKUP_POD_WATCH_TIMEOUT_SECS";
    pub const RESTORE_WATCH_TIMEOUT: &str = "RESTORE_POD_WATCH_TIMEOUT_SECS";
    pub const PVC_BOUND_ATTEMPTS: &str = "PVC_BOUND_NUM_ATTEMPTS";
    pub const PVC_BOUND_INTERVAL: &str = "PVC_BOUND_INTERVAL_SECS";
    pub const TESTS_ROOTDIR: &str = "TESTS_ROOTDIR";
}

/// Tuning knobs and locations for one harness run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Namespace all namespaced resources are created in
    pub namespace: String,
    /// Label prefix used when building job selectors
    pub label_prefix: String,
    /// Budget for a pod or cron job to appear
    pub appear: PollSpec,
    /// Budget for a pod to reach a terminal phase
    pub completion: PollSpec,
    /// Budget for a claim to bind to its volume
    pub pvc_bound: PollSpec,
    /// Deadline for the first scheduled backup pod to show up
    pub backup_pod_watch_timeout: Duration,
    /// Deadline for the restore pod to show up
    pub restore_pod_watch_timeout: Duration,
    /// Directory holding `config/testenv.json`
    pub tests_root: Option<PathBuf>,
}

impl HarnessConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let appear = PollSpec::new(
            attempts(&lookup, keys::APPEAR_ATTEMPTS, 15)?,
            seconds(&lookup, keys::APPEAR_INTERVAL, 1)?,
        );
        let completion = PollSpec::new(
            attempts(&lookup, keys::DONE_ATTEMPTS, 100)?,
            seconds(&lookup, keys::DONE_INTERVAL, 3)?,
        );
        let pvc_bound = PollSpec::new(
            attempts(&lookup, keys::PVC_BOUND_ATTEMPTS, 30)?,
            seconds(&lookup, keys::PVC_BOUND_INTERVAL, 1)?,
        );

        Ok(Self {
            namespace: lookup(keys::NAMESPACE).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            label_prefix: lookup(keys::LABEL_PREFIX)
                .unwrap_or_else(|| DEFAULT_LABEL_PREFIX.to_string()),
            appear,
            completion,
            pvc_bound,
            backup_pod_watch_timeout: seconds(&lookup, keys::BACKUP_WATCH_TIMEOUT, 75)?,
            restore_pod_watch_timeout: seconds(&lookup, keys::RESTORE_WATCH_TIMEOUT, 120)?,
            tests_root: lookup(keys::TESTS_ROOTDIR).map(PathBuf::from),
        })
    }

    /// Location of the environment data file, if a tests root is configured.
    pub fn testenv_path(&self) -> Option<PathBuf> {
        self.tests_root
            .as_ref()
            .map(|root| root.join("config").join("testenv.json"))
    }

    /// Load the environment data. A missing file is not an error: scenarios
    /// that need it are skipped instead.
    pub fn load_test_env(&self) -> Result<Option<TestEnv>, ConfigError> {
        match self.testenv_path() {
            Some(path) if path.exists() => TestEnv::from_file(&path).map(Some),
            Some(path) => {
                tracing::info!(path = %path.display(), "No environment data file found");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

fn attempts<F>(lookup: &F, key: &str, default: u32) -> Result<NonZeroU32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(key) {
        Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })?,
        None => default,
    };
    NonZeroU32::new(value).ok_or_else(|| ConfigError::ZeroAttempts {
        key: key.to_string(),
    })
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(Duration::from_secs(default)),
    }
}

fn default_restic_password() -> String {
    "kubedr-e2e".to_string()
}

/// Environment data describing the external systems a run talks to.
///
/// ```json
/// {
///   "backuploc": {
///     "endpoint": "http://minio:9000",
///     "bucket_name_prefix": "kubedr",
///     "access_key": "...",
///     "secret_key": "..."
///   },
///   "etcd_data": {
///     "ca.crt": "/etc/kubernetes/pki/etcd/ca.crt",
///     "client.crt": "/etc/kubernetes/pki/etcd/healthcheck-client.crt",
///     "client.key": "/etc/kubernetes/pki/etcd/healthcheck-client.key"
///   },
///   "certs_dir": "/etc/kubernetes/pki"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TestEnv {
    pub backuploc: BackupLocEnv,
    #[serde(default)]
    pub etcd_data: Option<EtcdData>,
    #[serde(default)]
    pub certs_dir: Option<String>,
    #[serde(default = "default_restic_password")]
    pub restic_password: String,
}

/// S3-compatible target for backup locations.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupLocEnv {
    pub endpoint: String,
    pub bucket_name_prefix: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Local paths of the etcd client credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct EtcdData {
    #[serde(rename = "ca.crt")]
    pub ca_crt: PathBuf,
    #[serde(rename = "client.crt")]
    pub client_crt: PathBuf,
    #[serde(rename = "client.key")]
    pub client_key: PathBuf,
}

impl TestEnv {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
