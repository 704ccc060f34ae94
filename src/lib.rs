// Copyright 2025 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::admin::GarageAdmin;
use crate::admin::client::HttpResourceClient;
use crate::bootstrap::run_bootstrap;
use crate::config::ClusterConfiguration;
use crate::context::Context;
use clap::ValueEnum;
use kube::Client;
use std::path::Path;
use std::pin::Pin;
use strum::Display;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod admin;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod types;
pub mod utils;


/// Where the Kubernetes credentials come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum ExecutionMode {
    /// In-cluster service account.
    Cluster,

    /// Local kubeconfig or environment.
    Testing,
}

impl ExecutionMode {
    async fn kube_config(self) -> Result<kube::Config, Box<dyn std::error::Error>> {
        Ok(match self {
            ExecutionMode::Cluster => kube::Config::incluster()?,
            ExecutionMode::Testing => kube::Config::infer().await?,
        })
    }
}

pub async fn run(
    config_path: &Path,
    mode: ExecutionMode,
    admin_token: String,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = ClusterConfiguration::load(config_path).await?;
    info!(
        "loaded configuration from {}: statefulset {}/{}, {} replicas, {} GB per node, {} buckets, {} access keys",
        config_path.display(),
        config.namespace,
        config.cluster_name,
        config.desired_replicas,
        config.storage_per_node_gbs,
        config.buckets.len(),
        config.access_keys.len()
    );

    info!("connecting to Kubernetes in {} mode", mode);
    let client = Client::try_from(mode.kube_config().await?)?;
    let context = Context::new(client);

    let admin = GarageAdmin::new(HttpResourceClient::new(
        &config.admin_api_url,
        admin_token,
    )?);

    let report = run_bootstrap(&config, &context, &admin, &context).await?;

    info!(
        "bootstrap finished: layout version {}, buckets [{}], access keys [{}], {} grants, {} secrets",
        report.layout_version,
        report
            .buckets
            .iter()
            .map(|(alias, bucket)| format!("{}={}", alias, bucket.id))
            .collect::<Vec<_>>()
            .join(", "),
        report
            .keys
            .iter()
            .map(|(name, key)| format!("{}={}", name, key.access_key_id))
            .collect::<Vec<_>>()
            .join(", "),
        report.grants,
        report.secrets.len()
    );

    Ok(())
}

/// Write the effective configuration, with every default filled in, as YAML.
pub async fn print_config(
    config_path: &Path,
    file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClusterConfiguration::load(config_path).await?;

    let mut writer: Pin<Box<dyn AsyncWrite + Send>> = if let Some(file) = file {
        Box::pin(
            tokio::fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(file)
                .await?,
        )
    } else {
        Box::pin(tokio::io::stdout())
    };

    writer
        .write_all(serde_yaml_ng::to_string(&config)?.as_bytes())
        .await?;
    writer.flush().await?;

    Ok(())
}
