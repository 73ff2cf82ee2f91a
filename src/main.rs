// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use eks_runner_bootstrap::aws::AwsCloud;
use eks_runner_bootstrap::command::ProcessRunner;
use eks_runner_bootstrap::config::Config;
use eks_runner_bootstrap::pipeline::Provisioner;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting GitLab Runner bootstrap");

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;
    info!(
        "Configuration loaded: region={}, role={}, service_account={}, release={}/{}",
        config.region,
        config.role_name,
        config.service_account,
        config.namespace,
        config.release_name
    );

    // Open the AWS session, failing early on missing credentials
    let cloud = AwsCloud::connect(&config).await?;

    // Same kubeconfig context kubectl and helm will use
    let cluster = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let runner = ProcessRunner::new(config.command_timeout());
    let provisioner = Provisioner::new(config, cloud, cluster, runner);

    let report = provisioner.run().await?;
    info!(
        "Account {}: service account annotated with {}, release {}",
        report.account_id, report.annotation_value, report.release
    );

    Ok(())
}
