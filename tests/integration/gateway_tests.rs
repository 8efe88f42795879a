//! Gateway round trips against a live API server.

use std::time::Duration;

use serde_json::json;

use kubedr_e2e::gateway::{LogicalKind, ResourceRef, name_of};
use kubedr_e2e::suites::{NameGenerator, fixtures};
use kubedr_e2e::{Gateway, PollSpec, Poller};

use crate::{SharedTestCluster, init_tracing};

#[tokio::test]
#[ignore = "requires Kubernetes cluster"]
async fn test_gateway_secret_round_trip() {
    init_tracing();
    let cluster = SharedTestCluster::get().await;
    let gateway = cluster.gateway().await;
    let secret = LogicalKind::Secret.descriptor();
    let name = NameGenerator::new().next("e2e-gateway");

    let created = gateway
        .create(
            &secret,
            &name,
            json!({ "type": "Opaque", "data": { "token": "b2s=" } }),
        )
        .await
        .unwrap();
    assert_eq!(name_of(&created), name);

    let again = gateway.create(&secret, &name, json!({ "type": "Opaque" })).await;
    assert!(again.unwrap_err().is_already_exists());

    let fetched = gateway.get(&secret, &name).await.unwrap();
    assert_eq!(fetched.data["data"]["token"], "b2s=");

    gateway.delete(&secret, &name).await.unwrap();
    let gone = gateway.delete(&secret, &name).await.unwrap_err();
    assert!(gone.is_not_found());
}

#[tokio::test]
#[ignore = "requires Kubernetes cluster"]
async fn test_cluster_scoped_volume_becomes_available() {
    init_tracing();
    let cluster = SharedTestCluster::get().await;
    let gateway = cluster.gateway().await;
    let volume = LogicalKind::PersistentVolume.descriptor();
    let name = NameGenerator::new().next("e2e-pv");
    let dir = fixtures::host_path_dir(&name).unwrap();

    gateway
        .create(&volume, &name, fixtures::host_path_volume(&dir))
        .await
        .unwrap();

    let poller = Poller::new(&gateway);
    let spec = PollSpec::try_new(30, Duration::from_secs(1)).unwrap();
    let reference = ResourceRef::new(volume.clone(), gateway.namespace(), name.as_str());
    assert_eq!(reference.namespace(), None);
    let obj = poller
        .await_condition(&reference, "Available", &spec, |obj| {
            obj.data.pointer("/status/phase").and_then(|p| p.as_str()) == Some("Available")
        })
        .await
        .unwrap();
    assert_eq!(name_of(&obj), name);

    gateway.delete(&volume, &name).await.unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
}
