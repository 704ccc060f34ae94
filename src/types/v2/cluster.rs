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

use serde::{Deserialize, Serialize};
use strum::Display;

/// Overall health reported by `GetClusterHealth`.
#[derive(Deserialize, Serialize, Clone, Debug, Display, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[strum(to_string = "healthy")]
    Healthy,

    #[strum(to_string = "degraded")]
    Degraded,

    #[strum(to_string = "unavailable")]
    Unavailable,

    #[strum(to_string = "unknown")]
    #[serde(other)]
    #[default]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealth {
    pub status: HealthStatus,

    #[serde(default)]
    pub known_nodes: u64,

    #[serde(default)]
    pub connected_nodes: u64,

    #[serde(default)]
    pub storage_nodes: u64,

    #[serde(default)]
    pub storage_nodes_up: u64,

    #[serde(default)]
    pub partitions: u64,

    #[serde(default)]
    pub partitions_quorum: u64,

    #[serde(default)]
    pub partitions_all_ok: u64,
}

impl ClusterHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Role a node currently holds in the applied layout.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeAssignedRole {
    pub zone: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
}

/// A node entry of `GetClusterStatus`.
///
/// `id` stays optional on the wire so that a node reported without an
/// identifier surfaces as a configuration error instead of a decode error.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeResp {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub is_up: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<NodeAssignedRole>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub layout_version: u64,

    #[serde(default)]
    pub nodes: Vec<NodeResp>,
}

/// Role assignment staged for a single node.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRoleChange {
    pub id: String,
    pub zone: String,
    pub capacity: u64,
    pub tags: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterLayoutRequest {
    pub roles: Vec<NodeRoleChange>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLayout {
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub staged_role_changes: Vec<serde_json::Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyClusterLayoutRequest {
    pub version: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyClusterLayoutResponse {
    #[serde(default)]
    pub message: Vec<String>,
}
