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

//! Configurator document.
//!
//! The document is read once at startup into an immutable
//! [`ClusterConfiguration`] that every pipeline step borrows. Absent fields
//! fall back to built-in defaults; present but invalid fields fail the run
//! before any cluster call is made.

use crate::types::v2::bucket::BucketKeyPermission;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "example-configuration.json";

/// Layout capacities are expressed in bytes; the document uses gigabytes.
pub const BYTES_PER_GB: u64 = 1_000_000_000;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot read configuration file {}: {}", path.display(), source))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("malformed JSON configuration: {}", source))]
    ParseJson { source: serde_json::Error },

    #[snafu(display("malformed YAML configuration: {}", source))]
    ParseYaml { source: serde_yaml_ng::Error },

    #[snafu(display("adminApiUrl '{}' is not a valid URL: {}", url, source))]
    InvalidAdminUrl {
        url: String,
        source: http::uri::InvalidUri,
    },

    #[snafu(display("adminApiUrl '{}' must be an absolute http(s) URL", url))]
    UnsupportedAdminUrl { url: String },

    #[snafu(display("invalid value for '{}': {}", field, message))]
    InvalidValue { field: String, message: String },

    #[snafu(display("{} name must not be empty", kind))]
    EmptyName { kind: String },

    #[snafu(display("{} '{}' is configured more than once", kind, name))]
    DuplicateName { kind: String, name: String },

    #[snafu(display(
        "access key '{}' grants permissions on bucket '{}' which is not in 'buckets'",
        key,
        bucket
    ))]
    UnknownGrantBucket { key: String, bucket: String },

    #[snafu(display("'{}' is not a valid Kubernetes secret name", name))]
    InvalidSecretName { name: String },
}

/// Document encoding, chosen from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Bounded-retry budget of one readiness gate.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// StatefulSet readiness propagates slowly through the control plane.
    pub fn stateful_set() -> Self {
        Self {
            interval_secs: 30,
            max_attempts: 10,
        }
    }

    pub fn cluster() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 10,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Gate budgets. A field left out of the document keeps the gate's default.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "ReadinessDocument")]
pub struct ReadinessConfig {
    pub stateful_set: RetryPolicy,
    pub cluster: RetryPolicy,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RetryPolicyDocument {
    interval_secs: Option<u64>,
    max_attempts: Option<u32>,
}

impl RetryPolicyDocument {
    fn or(self, defaults: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            interval_secs: self.interval_secs.unwrap_or(defaults.interval_secs),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ReadinessDocument {
    stateful_set: RetryPolicyDocument,
    cluster: RetryPolicyDocument,
}

impl From<ReadinessDocument> for ReadinessConfig {
    fn from(document: ReadinessDocument) -> Self {
        Self {
            stateful_set: document.stateful_set.or(RetryPolicy::stateful_set()),
            cluster: document.cluster.or(RetryPolicy::cluster()),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            stateful_set: RetryPolicy::stateful_set(),
            cluster: RetryPolicy::cluster(),
        }
    }
}

/// Permission grant of an access key on one configured bucket.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BucketGrant {
    pub bucket: String,

    #[serde(default = "default_true")]
    pub read: bool,

    #[serde(default = "default_true")]
    pub write: bool,

    #[serde(default)]
    pub owner: bool,
}

impl BucketGrant {
    pub fn permission(&self) -> BucketKeyPermission {
        BucketKeyPermission {
            read: self.read,
            write: self.write,
            owner: self.owner,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeySpec {
    pub name: String,

    /// Allow the key to create buckets on its own.
    #[serde(default)]
    pub create_bucket: bool,

    /// Name of the credentials Secret; defaults to the key name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buckets: Vec<BucketGrant>,
}

impl AccessKeySpec {
    pub fn new(name: impl Into<String>, create_bucket: bool) -> Self {
        Self {
            name: name.into(),
            create_bucket,
            secret_name: None,
            buckets: Vec::new(),
        }
    }

    pub fn secret_name(&self) -> &str {
        self.secret_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfiguration {
    pub admin_api_url: String,

    /// Name of the Garage StatefulSet.
    #[serde(rename = "k8sClusterName")]
    pub cluster_name: String,

    #[serde(rename = "k8sClusterNamespace")]
    pub namespace: String,

    pub desired_replicas: u32,

    #[serde(rename = "storagePerNodeInGBs")]
    pub storage_per_node_gbs: u64,

    pub node_tags: Vec<String>,

    pub buckets: Vec<String>,

    pub access_keys: Vec<AccessKeySpec>,

    pub access_keys_secret_labels: BTreeMap<String, String>,

    pub access_keys_secret_annotations: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_keys_secret_namespace: Option<String>,

    pub create_secrets: bool,

    pub readiness: ReadinessConfig,
}

impl Default for ClusterConfiguration {
    fn default() -> Self {
        Self {
            admin_api_url: "http://localhost:3903".to_string(),
            cluster_name: "garage".to_string(),
            namespace: "garage".to_string(),
            desired_replicas: 1,
            storage_per_node_gbs: 1,
            node_tags: Vec::new(),
            buckets: Vec::new(),
            access_keys: Vec::new(),
            access_keys_secret_labels: BTreeMap::new(),
            access_keys_secret_annotations: BTreeMap::new(),
            access_keys_secret_namespace: None,
            create_secrets: true,
            readiness: ReadinessConfig::default(),
        }
    }
}

impl ClusterConfiguration {
    /// Read, parse and validate the document at `path`.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let content = tokio::fs::read_to_string(path)
            .await
            .context(ReadSnafu { path })?;

        Self::parse(&content, ConfigFormat::from_path(path))
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, Error> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(content).context(ParseJsonSnafu)?,
            ConfigFormat::Yaml => serde_yaml_ng::from_str(content).context(ParseYamlSnafu)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.validate_admin_url()?;

        ensure!(
            self.desired_replicas >= 1,
            InvalidValueSnafu {
                field: "desiredReplicas",
                message: "at least one replica is required",
            }
        );
        ensure!(
            i32::try_from(self.desired_replicas).is_ok(),
            InvalidValueSnafu {
                field: "desiredReplicas",
                message: format!("{} is out of range", self.desired_replicas),
            }
        );
        ensure!(
            self.storage_per_node_gbs >= 1,
            InvalidValueSnafu {
                field: "storagePerNodeInGBs",
                message: "capacity must be at least 1 GB",
            }
        );
        ensure!(
            self.storage_per_node_gbs.checked_mul(BYTES_PER_GB).is_some(),
            InvalidValueSnafu {
                field: "storagePerNodeInGBs",
                message: format!("{} GB overflows the byte capacity", self.storage_per_node_gbs),
            }
        );

        for (field, policy) in [
            ("readiness.statefulSet.maxAttempts", &self.readiness.stateful_set),
            ("readiness.cluster.maxAttempts", &self.readiness.cluster),
        ] {
            ensure!(
                policy.max_attempts >= 1,
                InvalidValueSnafu {
                    field,
                    message: "at least one attempt is required",
                }
            );
        }

        ensure_unique_names("bucket", self.buckets.iter().map(String::as_str))?;
        ensure_unique_names(
            "access key",
            self.access_keys.iter().map(|key| key.name.as_str()),
        )?;

        for key in &self.access_keys {
            for grant in &key.buckets {
                ensure!(
                    self.buckets.contains(&grant.bucket),
                    UnknownGrantBucketSnafu {
                        key: &key.name,
                        bucket: &grant.bucket,
                    }
                );
            }
        }

        if self.create_secrets {
            for key in &self.access_keys {
                ensure!(
                    is_dns_subdomain(key.secret_name()),
                    InvalidSecretNameSnafu {
                        name: key.secret_name(),
                    }
                );
            }
            ensure_unique_names(
                "secret",
                self.access_keys.iter().map(AccessKeySpec::secret_name),
            )?;
        }

        Ok(())
    }

    fn validate_admin_url(&self) -> Result<(), Error> {
        let uri: http::Uri = self
            .admin_api_url
            .parse()
            .context(InvalidAdminUrlSnafu {
                url: &self.admin_api_url,
            })?;

        let scheme_ok = matches!(uri.scheme_str(), Some("http") | Some("https"));
        ensure!(
            scheme_ok && uri.authority().is_some(),
            UnsupportedAdminUrlSnafu {
                url: &self.admin_api_url,
            }
        );
        Ok(())
    }

    /// Capacity assigned to every storage node, in bytes.
    pub fn capacity_per_node(&self) -> u64 {
        self.storage_per_node_gbs.saturating_mul(BYTES_PER_GB)
    }

    /// Namespace the credential Secrets are written to.
    pub fn secret_namespace(&self) -> &str {
        self.access_keys_secret_namespace
            .as_deref()
            .unwrap_or(&self.namespace)
    }
}

fn ensure_unique_names<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), Error> {
    let mut seen = BTreeSet::new();
    for name in names {
        ensure!(!name.trim().is_empty(), EmptyNameSnafu { kind });
        ensure!(seen.insert(name), DuplicateNameSnafu { kind, name });
    }
    Ok(())
}

// RFC 1123 subdomain, the rule Kubernetes applies to Secret names.
fn is_dns_subdomain(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.';
    let alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();

    name.chars().all(valid_char)
        && name.chars().next().is_some_and(alnum)
        && name.chars().last().is_some_and(alnum)
}
