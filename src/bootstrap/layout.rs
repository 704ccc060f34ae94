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

//! Cluster layout reconciliation.
//!
//! The layout is committed in two calls: `UpdateClusterLayout` stages a role
//! for every discovered node, then `ApplyClusterLayout` commits the staged
//! roles as version `current + 1`. Garage rejects the apply if the layout
//! moved in between, and that rejection is surfaced as-is.

use crate::admin::{self, AdminApi, ApiResponse};
use crate::config::ClusterConfiguration;
use crate::types::v2::cluster::{ClusterStatus, NodeRoleChange, UpdateClusterLayoutRequest};
use crate::utils::zone::ZoneAllocator;
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, info};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot fetch Garage cluster status: {}", source))]
    FetchStatus { source: admin::Error },

    #[snafu(display("Garage cluster status request failed: {}", response))]
    StatusRejected { response: String },

    #[snafu(display("Garage cluster reports no nodes"))]
    NoNodes,

    #[snafu(display("Garage cluster node #{} has no id: {}", index, node))]
    MissingNodeId { index: usize, node: String },

    #[snafu(display("cannot stage Garage layout: {}", source))]
    Propose { source: admin::Error },

    #[snafu(display("Garage layout update rejected: {}", response))]
    ProposeRejected { response: String },

    #[snafu(display("cannot apply Garage layout version {}: {}", version, source))]
    Apply { version: u64, source: admin::Error },

    #[snafu(display("Garage layout version {} rejected: {}", version, response))]
    ApplyRejected { version: u64, response: String },

    #[snafu(display("Garage layout version {} has no successor", version))]
    VersionOverflow { version: u64 },
}

/// Roles to stage, computed against a known layout version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutPlan {
    pub current_version: u64,
    pub roles: Vec<NodeRoleChange>,
}

impl LayoutPlan {
    /// The only version an apply may carry for this plan.
    pub fn next_version(&self) -> Result<u64, Error> {
        self.current_version
            .checked_add(1)
            .context(VersionOverflowSnafu {
                version: self.current_version,
            })
    }
}

/// Assign capacity, zone and tags to every discovered node.
///
/// Nodes that already hold a zone keep it; others get one derived from their
/// id. Fails on the first node without an id.
pub fn plan_layout(
    status: &ClusterStatus,
    config: &ClusterConfiguration,
) -> Result<LayoutPlan, Error> {
    ensure!(!status.nodes.is_empty(), NoNodesSnafu);

    let mut zones = ZoneAllocator::new();
    for node in &status.nodes {
        if let Some(role) = &node.role {
            zones.reserve(&role.zone);
        }
    }

    let mut roles = Vec::with_capacity(status.nodes.len());
    for (index, node) in status.nodes.iter().enumerate() {
        let id = node.id.as_deref().context(MissingNodeIdSnafu {
            index,
            node: format!("{:?}", node),
        })?;

        let zone = match &node.role {
            Some(role) => role.zone.clone(),
            None => zones.allocate(id),
        };

        info!("discovered Garage node {} (zone {})", id, zone);
        roles.push(NodeRoleChange {
            id: id.to_owned(),
            zone,
            capacity: config.capacity_per_node(),
            tags: config.node_tags.clone(),
        });
    }

    Ok(LayoutPlan {
        current_version: status.layout_version,
        roles,
    })
}

/// Read the cluster status, stage roles and apply them.
///
/// Returns the applied layout version. Nothing here is retried.
pub async fn reconcile_layout<A>(api: &A, config: &ClusterConfiguration) -> Result<u64, Error>
where
    A: AdminApi + ?Sized,
{
    let status = match api.get_cluster_status().await.context(FetchStatusSnafu)? {
        ApiResponse::Success(status) => status,
        other => {
            return StatusRejectedSnafu {
                response: other.to_string(),
            }
            .fail();
        }
    };

    let plan = plan_layout(&status, config)?;
    let version = plan.next_version()?;
    debug!("staging Garage layout: {:?}", plan.roles);

    let request = UpdateClusterLayoutRequest {
        roles: plan.roles.clone(),
    };
    match api
        .update_cluster_layout(&request)
        .await
        .context(ProposeSnafu)?
    {
        ApiResponse::Success(layout) => info!(
            "staged roles for {} nodes ({} staged changes), applying layout",
            plan.roles.len(),
            layout.staged_role_changes.len()
        ),
        other => {
            return ProposeRejectedSnafu {
                response: other.to_string(),
            }
            .fail();
        }
    }

    match api
        .apply_cluster_layout(version)
        .await
        .context(ApplySnafu { version })?
    {
        ApiResponse::Success(applied) => {
            for line in &applied.message {
                debug!("{}", line);
            }
            info!("applied Garage layout version {}", version);
            Ok(version)
        }
        other => ApplyRejectedSnafu {
            version,
            response: other.to_string(),
        }
        .fail(),
    }
}
