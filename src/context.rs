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

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::{Resource, ResourceExt};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::Snafu;
use snafu::futures::TryFutureExt;
use std::fmt::Debug;
use tracing::debug;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Kubernetes API error: {}", source))]
    Kube { source: kube::Error },

    #[snafu(display("StatefulSet {}/{} not found", namespace, name))]
    StatefulSetNotFound { name: String, namespace: String },
}

/// Read access to the Garage workload.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkloadApi: Send + Sync {
    /// Number of ready replicas of the named StatefulSet.
    async fn ready_replicas(&self, name: &str, namespace: &str) -> Result<i32, Error>;
}

/// Storage for materialized access-key credentials.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `None` when the Secret does not exist.
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error>;

    async fn create_secret(&self, secret: &Secret, namespace: &str) -> Result<Secret, Error>;
}

pub struct Context {
    pub(crate) client: kube::Client,
}

impl Context {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    pub async fn get_opt<T>(&self, name: &str, namespace: &str) -> Result<Option<T>, Error>
    where
        T: Clone + DeserializeOwned + Debug + Resource<Scope = NamespaceResourceScope>,
        <T as kube::Resource>::DynamicType: Default,
    {
        let api: Api<T> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).context(KubeSnafu).await
    }

    pub async fn create<T>(&self, resource: &T, namespace: &str) -> Result<T, Error>
    where
        T: Clone + Serialize + DeserializeOwned + Debug + Resource<Scope = NamespaceResourceScope>,
        <T as kube::Resource>::DynamicType: Default,
    {
        let api: Api<T> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), resource)
            .context(KubeSnafu)
            .await
    }
}

#[async_trait]
impl WorkloadApi for Context {
    async fn ready_replicas(&self, name: &str, namespace: &str) -> Result<i32, Error> {
        let stateful_set = self
            .get_opt::<appsv1::StatefulSet>(name, namespace)
            .await?
            .ok_or_else(|| Error::StatefulSetNotFound {
                name: name.to_owned(),
                namespace: namespace.to_owned(),
            })?;

        let ready = ready_replicas_of(&stateful_set);
        debug!(
            "statefulset {}/{} has {} ready replicas",
            namespace,
            stateful_set.name_any(),
            ready
        );
        Ok(ready)
    }
}

#[async_trait]
impl SecretStore for Context {
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error> {
        self.get_opt(name, namespace).await
    }

    async fn create_secret(&self, secret: &Secret, namespace: &str) -> Result<Secret, Error> {
        self.create(secret, namespace).await
    }
}

/// A StatefulSet that has not reported status yet has no ready replicas.
pub fn ready_replicas_of(stateful_set: &appsv1::StatefulSet) -> i32 {
    stateful_set
        .status
        .as_ref()
        .and_then(|status| status.ready_replicas)
        .unwrap_or(0)
}
