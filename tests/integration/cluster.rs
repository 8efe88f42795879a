//! Shared test cluster singleton.
//!
//! Provides a Kubernetes cluster connection for all integration tests.
//! Each test builds its own gateway from a fresh client.

use std::sync::Arc;
use std::sync::OnceLock;

use kube::{Client, Config};
use tokio::sync::OnceCell;

use kubedr_e2e::{HarnessConfig, KubeGateway};

/// Global shared test cluster instance.
static SHARED_CLUSTER: OnceCell<Arc<SharedTestCluster>> = OnceCell::const_new();

/// Shared test cluster providing Kubernetes connectivity.
///
/// Connectivity and harness configuration are validated once; every test
/// then creates its own client via [`SharedTestCluster::gateway`].
pub struct SharedTestCluster {
    config: HarnessConfig,
}

impl SharedTestCluster {
    /// Get or create the shared test cluster.
    ///
    /// Safe to call from multiple tests concurrently. The first call
    /// validates connectivity, subsequent calls return the cached instance.
    pub async fn get() -> Arc<SharedTestCluster> {
        SHARED_CLUSTER
            .get_or_init(|| async {
                let cluster = Self::connect().await.expect(
                    "Failed to connect to Kubernetes cluster. Is your kubeconfig configured?",
                );
                Arc::new(cluster)
            })
            .await
            .clone()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Create a new Kubernetes client.
    pub async fn new_client(&self) -> Client {
        let config = Config::infer().await.expect("Failed to infer kube config");
        Client::try_from(config).expect("Failed to create kube client")
    }

    /// Gateway over the operator namespace, on its own client.
    pub async fn gateway(&self) -> KubeGateway {
        KubeGateway::new(self.new_client().await, &self.config.namespace)
    }

    /// Connect to the cluster using kubeconfig
    async fn connect() -> Result<Self, kube::Error> {
        let config = Config::infer()
            .await
            .map_err(|e| kube::Error::Service(std::io::Error::other(e.to_string()).into()))?;
        let client = Client::try_from(config)?;

        // Quick health check
        let version = client.apiserver_version().await?;
        tracing::info!(
            "Connected to Kubernetes cluster: {} {}",
            version.platform,
            version.git_version
        );

        let config = HarnessConfig::from_env().expect("Invalid harness configuration");
        Ok(Self { config })
    }
}

/// Initialize tracing for tests (optional, call once).
static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}
