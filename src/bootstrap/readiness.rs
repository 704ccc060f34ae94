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

//! Readiness gates.
//!
//! Two bounded-retry loops run back to back: the Garage StatefulSet must have
//! the desired number of ready replicas, then the admin API must report a
//! healthy cluster. Each gate owns its attempt budget.

use crate::admin::{AdminApi, ApiResponse};
use crate::config::{ClusterConfiguration, RetryPolicy};
use crate::context::WorkloadApi;
use snafu::Snafu;
use std::future::Future;
use tracing::{info, warn};

pub const STATEFUL_SET_GATE: &str = "Garage StatefulSet";
pub const CLUSTER_GATE: &str = "Garage cluster";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("{} not ready after {} attempts, last check: {}", gate, attempts, last))]
    Exhausted {
        gate: String,
        attempts: u32,
        last: String,
    },

    #[snafu(display("{} check failed on attempt {}: {}", gate, attempt, message))]
    Fatal {
        gate: String,
        attempt: u32,
        message: String,
    },
}

/// Result of a single readiness check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Ready,
    NotReady(String),
    Fatal(String),
}

/// Run `check` until it reports ready, at most `policy.max_attempts` times.
///
/// Returns the attempt on which the check succeeded. There is no sleep after
/// the last attempt.
pub async fn poll_until_ready<F, Fut>(
    gate: &str,
    policy: &RetryPolicy,
    mut check: F,
) -> Result<u32, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PollOutcome>,
{
    let mut last = String::from("never checked");

    for attempt in 1..=policy.max_attempts {
        match check().await {
            PollOutcome::Ready => {
                info!("{} is ready (attempt {}/{})", gate, attempt, policy.max_attempts);
                return Ok(attempt);
            }
            PollOutcome::Fatal(message) => {
                return FatalSnafu {
                    gate,
                    attempt,
                    message,
                }
                .fail();
            }
            PollOutcome::NotReady(reason) => {
                if attempt < policy.max_attempts {
                    info!(
                        "{} is not ready: {}, checking again in {}s (attempt {}/{})",
                        gate, reason, policy.interval_secs, attempt, policy.max_attempts
                    );
                    tokio::time::sleep(policy.interval()).await;
                } else {
                    warn!(
                        "{} is not ready: {} (attempt {}/{})",
                        gate, reason, attempt, policy.max_attempts
                    );
                }
                last = reason;
            }
        }
    }

    ExhaustedSnafu {
        gate,
        attempts: policy.max_attempts,
        last,
    }
    .fail()
}

pub async fn check_stateful_set<W>(workloads: &W, config: &ClusterConfiguration) -> PollOutcome
where
    W: WorkloadApi + ?Sized,
{
    match workloads
        .ready_replicas(&config.cluster_name, &config.namespace)
        .await
    {
        Ok(ready) if i64::from(ready) == i64::from(config.desired_replicas) => PollOutcome::Ready,
        Ok(ready) => PollOutcome::NotReady(format!(
            "{}/{} replicas ready",
            ready, config.desired_replicas
        )),
        Err(e) => PollOutcome::NotReady(e.to_string()),
    }
}

pub async fn check_cluster_health<A>(api: &A) -> PollOutcome
where
    A: AdminApi + ?Sized,
{
    match api.get_cluster_health().await {
        Ok(ApiResponse::Success(health)) if health.is_healthy() => PollOutcome::Ready,
        Ok(ApiResponse::Success(health)) => PollOutcome::NotReady(format!(
            "cluster is {} ({}/{} storage nodes up)",
            health.status, health.storage_nodes_up, health.storage_nodes
        )),
        Ok(ApiResponse::NotFound) => PollOutcome::NotReady("health endpoint not found".to_string()),
        Ok(ApiResponse::Error(e)) if e.is_unauthorized() => PollOutcome::Fatal(e.to_string()),
        Ok(ApiResponse::Error(e)) => PollOutcome::NotReady(e.to_string()),
        Err(e) => PollOutcome::NotReady(e.to_string()),
    }
}

pub async fn wait_for_stateful_set<W>(
    workloads: &W,
    config: &ClusterConfiguration,
) -> Result<u32, Error>
where
    W: WorkloadApi + ?Sized,
{
    info!(
        "waiting for StatefulSet {}/{} to have {} ready replicas",
        config.namespace, config.cluster_name, config.desired_replicas
    );
    poll_until_ready(STATEFUL_SET_GATE, &config.readiness.stateful_set, || {
        check_stateful_set(workloads, config)
    })
    .await
}

pub async fn wait_for_cluster<A>(api: &A, config: &ClusterConfiguration) -> Result<u32, Error>
where
    A: AdminApi + ?Sized,
{
    info!("waiting for Garage at {} to report healthy", config.admin_api_url);
    poll_until_ready(CLUSTER_GATE, &config.readiness.cluster, || {
        check_cluster_health(api)
    })
    .await
}

/// Both gates in order, each with its own budget.
pub async fn wait_until_ready<W, A>(
    workloads: &W,
    api: &A,
    config: &ClusterConfiguration,
) -> Result<(), Error>
where
    W: WorkloadApi + ?Sized,
    A: AdminApi + ?Sized,
{
    wait_for_stateful_set(workloads, config).await?;
    wait_for_cluster(api, config).await?;
    Ok(())
}
