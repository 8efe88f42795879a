//! kubedr-e2e: runs the kubedr end-to-end scenarios against the current
//! cluster.
//!
//! ```text
//! kubedr-e2e [--list] [SCENARIO_FILTER]
//! ```
//!
//! Configuration comes from the environment (see [`HarnessConfig`]); the
//! process exits non-zero if any scenario failed.

use std::process::ExitCode;

use clap::Parser;
use kube::Client;
use tracing::{error, info};

use kubedr_e2e::suites::SCENARIOS;
use kubedr_e2e::{HarnessConfig, KubeGateway, KubectlDiagnostics, Suite, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "kubedr-e2e", version, about, long_about = None)]
struct Args {
    /// List scenario names and exit
    #[arg(long)]
    list: bool,

    /// Run only scenarios whose name contains this
    filter: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.list {
        for name in SCENARIOS {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }

    match run(args.filter.as_deref()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Harness could not run");
            eprintln!("kubedr-e2e: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every scenario passed or was skipped.
async fn run(filter: Option<&str>) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    init_tracing()?;

    let config = HarnessConfig::from_env()?;
    let env = config.load_test_env()?;
    info!(
        namespace = %config.namespace,
        testenv = env.is_some(),
        filter = filter.unwrap_or("*"),
        "Starting kubedr-e2e"
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let gateway = KubeGateway::new(client, config.namespace.clone());
    let suite = Suite::new(&gateway, KubectlDiagnostics::default(), &config, env.as_ref());
    let report = suite.run_all(filter).await;

    println!("{}", report);
    let (passed, skipped, failed) = report.summary();
    info!(passed, skipped, failed, "kubedr-e2e finished");
    Ok(!report.has_failures())
}
