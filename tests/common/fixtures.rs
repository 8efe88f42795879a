//! Test fixtures: object builders, environment data and a scripted stand-in
//! for the kubedr operator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Pod;
use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use serde_json::{Value, json};

use kubedr_e2e::config::{BackupLocEnv, EtcdData, HarnessConfig, TestEnv};
use kubedr_e2e::crd::INIT_ANNOTATION;
use kubedr_e2e::gateway::Resource;

use super::fake_gateway::{FakeGateway, FakeState};

pub const NAMESPACE: &str = "kubedr-system";
pub const GOOD_SECRET_KEY: &str = "minio123";

/// Pod `name` with `labels`, reporting `phase` if given.
pub fn pod(name: &str, labels: &[(&str, &str)], phase: Option<&str>) -> Resource {
    labeled(&ApiResource::erase::<Pod>(&()), name, labels, phase)
}

/// Namespaced object of any kind with labels and an optional phase.
pub fn labeled(
    ar: &ApiResource,
    name: &str,
    labels: &[(&str, &str)],
    phase: Option<&str>,
) -> Resource {
    let mut obj = DynamicObject::new(name, ar).within(NAMESPACE);
    obj.metadata.labels = Some(
        labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    );
    if let Some(phase) = phase {
        obj.data = json!({ "status": { "phase": phase } });
    }
    obj
}

/// Default budgets: 15 × 1 s to appear, 100 × 3 s to finish.
pub fn default_config() -> HarnessConfig {
    HarnessConfig::from_lookup(|_| None).unwrap()
}

pub fn test_env() -> TestEnv {
    TestEnv {
        backuploc: BackupLocEnv {
            endpoint: "http://10.0.0.5:9000".to_string(),
            bucket_name_prefix: "kubedr".to_string(),
            access_key: "minio".to_string(),
            secret_key: GOOD_SECRET_KEY.to_string(),
        },
        etcd_data: None,
        certs_dir: None,
        restic_password: "kubedr-e2e".to_string(),
    }
}

/// Scratch directory unique to this process and `name`, created empty.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kubedr-e2e-test-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Environment data with etcd credentials written to `dir`.
pub fn test_env_with_etcd(dir: &Path, certs_dir: Option<&str>) -> TestEnv {
    let mut paths = Vec::new();
    for file in ["ca.crt", "client.crt", "client.key"] {
        let path = dir.join(file);
        std::fs::write(&path, format!("-----BEGIN {}-----", file)).unwrap();
        paths.push(path);
    }
    let mut env = test_env();
    env.etcd_data = Some(EtcdData {
        ca_crt: paths[0].clone(),
        client_crt: paths[1].clone(),
        client_key: paths[2].clone(),
    });
    env.certs_dir = certs_dir.map(str::to_string);
    env
}

fn str_at<'a>(obj: &'a Resource, pointer: &str) -> &'a str {
    obj.data.pointer(pointer).and_then(Value::as_str).unwrap_or_default()
}

fn name(obj: &Resource) -> String {
    obj.metadata.name.clone().unwrap_or_default()
}

/// Wire the reactions of a well-behaved kubedr operator into `gateway`.
///
/// - a backup location gets an init pod that succeeds and an init
///   annotation of `"true"` if its secret carries [`GOOD_SECRET_KEY`];
///   otherwise the pod fails and the annotation is `"false"`
/// - a backup policy gets a cron job and one running backup pod that
///   then succeeds; its status counts one file, more with a certs dir
/// - a claim binds immediately
/// - a restore gets a pod that succeeds after writing the snapshot and
///   certificates into the claim's hostPath volume
pub fn install_fake_operator(gateway: &FakeGateway) {
    gateway.on_create("BackupLocation", |state: &mut FakeState, obj: &Resource| {
        let location = name(obj);
        let secret = str_at(obj, "/spec/credentials").to_string();
        let expected = serde_json::to_value(ByteString(GOOD_SECRET_KEY.as_bytes().to_vec())).unwrap();
        let valid = state
            .get("Secret", &secret)
            .and_then(|s| s.data.pointer("/data/secret_key"))
            == Some(&expected);

        let pod_name = format!("{}-init-x7k2p", location);
        state.insert(pod(
            &pod_name,
            &[("kubedr.type", "backuploc-init"), ("kubedr.backuploc", location.as_str())],
            Some("Pending"),
        ));
        if valid {
            state.script_phases(&pod_name, &["Pending", "Running", "Succeeded"]);
        } else {
            state.script_phases(&pod_name, &["Running", "Failed"]);
        }
        state.annotate(
            "BackupLocation",
            &location,
            INIT_ANNOTATION,
            if valid { "true" } else { "false" },
        );
    });

    gateway.on_create("MetadataBackupPolicy", |state: &mut FakeState, obj: &Resource| {
        let policy = name(obj);
        let labels = [("kubedr.type", "backup"), ("kubedr.backup-policy", policy.as_str())];
        state.insert(labeled(
            &kubedr_e2e::gateway::BuiltinKind::CronJob.api_resource(),
            &format!("{}-cronjob", policy),
            &labels,
            None,
        ));

        let pod_name = format!("{}-cronjob-28001", policy);
        state.insert(pod(&pod_name, &labels, Some("Running")));
        state.script_phases(&pod_name, &["Running", "Succeeded"]);

        let files_new = if str_at(obj, "/spec/certsDir").is_empty() { 1 } else { 12 };
        state.set_status(
            "MetadataBackupPolicy",
            &policy,
            json!({ "filesChanged": 0, "filesNew": files_new, "mbrName": format!("mbr-{}", policy) }),
        );
    });

    gateway.on_create("PersistentVolumeClaim", |state: &mut FakeState, obj: &Resource| {
        state.set_status("PersistentVolumeClaim", &name(obj), json!({ "phase": "Bound" }));
    });

    gateway.on_create("MetadataRestore", |state: &mut FakeState, obj: &Resource| {
        let restore = name(obj);
        let mbr = str_at(obj, "/spec/mbrName").to_string();
        let claim = str_at(obj, "/spec/pvcName").to_string();

        let volume = state
            .get("PersistentVolumeClaim", &claim)
            .map(|c| str_at(c, "/spec/volumeName").to_string())
            .unwrap_or_default();
        let host_path = state
            .get("PersistentVolume", &volume)
            .map(|v| str_at(v, "/spec/hostPath/path").to_string())
            .unwrap_or_default();
        if !host_path.is_empty() {
            let data = Path::new(&host_path).join("data");
            std::fs::create_dir_all(data.join("certificates")).unwrap();
            std::fs::write(data.join("etcd-snapshot.db"), b"snapshot").unwrap();
        }

        let pod_name = format!("{}-restore", restore);
        state.insert(pod(
            &pod_name,
            &[("kubedr.type", "restore"), ("kubedr.restore-mbr", mbr.as_str())],
            Some("Pending"),
        ));
        state.script_phases(&pod_name, &["Running", "Succeeded"]);
    });
}
