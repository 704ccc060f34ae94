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

use crate::admin::AdminApi;
use crate::bootstrap::provision::Provisioned;
use crate::config::ClusterConfiguration;
use crate::context::{SecretStore, WorkloadApi};
use crate::types::v2::bucket::BucketInfo;
use crate::types::v2::key::KeyInfo;
use snafu::Snafu;
use std::collections::BTreeMap;
use tracing::info;

pub mod layout;
pub mod permissions;
pub mod provision;
pub mod readiness;
pub mod secrets;

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(transparent)]
    Readiness { source: readiness::Error },

    #[snafu(transparent)]
    Layout { source: layout::Error },

    #[snafu(transparent)]
    Provision { source: provision::Error },

    #[snafu(transparent)]
    Permissions { source: permissions::Error },

    #[snafu(transparent)]
    Secrets { source: secrets::Error },
}

/// What a successful run left in the cluster.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BootstrapReport {
    pub layout_version: u64,
    pub buckets: BTreeMap<String, BucketInfo>,
    pub keys: BTreeMap<String, KeyInfo>,
    pub grants: usize,
    pub secrets: BTreeMap<String, Provisioned>,
}

/// Run the whole pipeline once, stopping at the first failing step.
pub async fn run_bootstrap<W, A, S>(
    config: &ClusterConfiguration,
    workloads: &W,
    api: &A,
    secret_store: &S,
) -> Result<BootstrapReport, Error>
where
    W: WorkloadApi + ?Sized,
    A: AdminApi + ?Sized,
    S: SecretStore + ?Sized,
{
    // 1. Wait for the StatefulSet, then for Garage itself
    readiness::wait_until_ready(workloads, api, config).await?;

    // 2. Assign roles to the discovered nodes and commit the layout
    let layout_version = layout::reconcile_layout(api, config).await?;

    // 3. Buckets, then access keys
    let buckets = provision::provision_buckets(api, config).await?;
    let keys = provision::provision_keys(api, config).await?;

    // 4. Bucket permissions of the keys
    let grants = permissions::grant_permissions(api, config, &buckets, &keys).await?;

    // 5. Credentials for workloads
    let secrets = if config.create_secrets {
        secrets::ensure_credentials_secrets(secret_store, config, &keys).await?
    } else {
        info!("secret creation disabled, skipping credentials Secrets");
        BTreeMap::new()
    };

    Ok(BootstrapReport {
        layout_version,
        buckets,
        keys,
        grants,
        secrets,
    })
}
