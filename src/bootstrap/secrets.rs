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

//! Access-key credentials as Kubernetes Secrets.
//!
//! A Secret is only ever created. An existing one is left as it is, even if
//! the key behind it changed.

use crate::bootstrap::provision::Provisioned;
use crate::config::{AccessKeySpec, ClusterConfiguration};
use crate::context::{self, SecretStore};
use crate::types::v2::key::KeyInfo;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use snafu::{OptionExt, ResultExt, Snafu};
use std::collections::BTreeMap;
use tracing::info;

pub const ACCESS_KEY_ID: &str = "accessKeyId";
pub const SECRET_ACCESS_KEY: &str = "secretAccessKey";
pub const KEY_NAME: &str = "keyName";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("access key '{}' was not provisioned", key))]
    UnknownKey { key: String },

    #[snafu(display(
        "admin API did not return the secret of access key '{}', cannot write Secret '{}'",
        key,
        secret
    ))]
    MissingSecretKey { key: String, secret: String },

    #[snafu(display("cannot read Secret {}/{}: {}", namespace, name, source))]
    Lookup {
        name: String,
        namespace: String,
        source: context::Error,
    },

    #[snafu(display("cannot create Secret {}/{}: {}", namespace, name, source))]
    Create {
        name: String,
        namespace: String,
        source: context::Error,
    },
}

/// Opaque Secret holding the credentials of one access key.
pub fn new_credentials_secret(
    spec: &AccessKeySpec,
    key: &KeyInfo,
    config: &ClusterConfiguration,
) -> Result<Secret, Error> {
    let secret_access_key = key
        .secret_access_key
        .as_deref()
        .context(MissingSecretKeySnafu {
            key: &spec.name,
            secret: spec.secret_name(),
        })?;

    let data = BTreeMap::from([
        (
            ACCESS_KEY_ID.to_owned(),
            ByteString(key.access_key_id.clone().into_bytes()),
        ),
        (
            SECRET_ACCESS_KEY.to_owned(),
            ByteString(secret_access_key.as_bytes().to_vec()),
        ),
        (KEY_NAME.to_owned(), ByteString(spec.name.clone().into_bytes())),
    ]);

    Ok(Secret {
        metadata: metav1::ObjectMeta {
            name: Some(spec.secret_name().to_owned()),
            namespace: Some(config.secret_namespace().to_owned()),
            labels: non_empty(&config.access_keys_secret_labels),
            annotations: non_empty(&config.access_keys_secret_annotations),
            ..Default::default()
        },
        data: Some(data),
        type_: Some("Opaque".to_owned()),
        ..Default::default()
    })
}

fn non_empty(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then(|| map.clone())
}

/// Create the credentials Secret of every configured key that lacks one.
pub async fn ensure_credentials_secrets<S>(
    store: &S,
    config: &ClusterConfiguration,
    keys: &BTreeMap<String, KeyInfo>,
) -> Result<BTreeMap<String, Provisioned>, Error>
where
    S: SecretStore + ?Sized,
{
    let namespace = config.secret_namespace();
    let mut outcomes = BTreeMap::new();

    for spec in &config.access_keys {
        let name = spec.secret_name();
        let key = keys
            .get(&spec.name)
            .context(UnknownKeySnafu { key: &spec.name })?;

        let existing = store
            .get_secret(name, namespace)
            .await
            .context(LookupSnafu { name, namespace })?;

        let outcome = if existing.is_some() {
            info!("Secret {}/{} already exists, leaving it untouched", namespace, name);
            Provisioned::Existing
        } else {
            let secret = new_credentials_secret(spec, key, config)?;
            store
                .create_secret(&secret, namespace)
                .await
                .context(CreateSnafu { name, namespace })?;
            info!(
                "created Secret {}/{} for access key '{}'",
                namespace, name, spec.name
            );
            Provisioned::Created
        };

        outcomes.insert(spec.name.clone(), outcome);
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MockSecretStore;
    use crate::tests::{FakeSecretStore, create_test_config, key};
    use mockall::predicate::eq;

    fn config_with_keys() -> ClusterConfiguration {
        let mut config = create_test_config();
        let mut admin = AccessKeySpec::new("admin", true);
        admin.secret_name = Some("garage-admin-credentials".to_string());
        config.access_keys = vec![AccessKeySpec::new("app", false), admin];
        config.access_keys_secret_labels =
            BTreeMap::from([("app.kubernetes.io/part-of".to_string(), "garage".to_string())]);
        config
    }

    fn keys() -> BTreeMap<String, KeyInfo> {
        BTreeMap::from([
            ("app".to_string(), key("GK1", "app")),
            ("admin".to_string(), key("GK2", "admin")),
        ])
    }

    #[test]
    fn test_new_credentials_secret_structure() {
        let config = config_with_keys();
        let secret =
            new_credentials_secret(&config.access_keys[1], &key("GK2", "admin"), &config).unwrap();

        assert_eq!(
            secret.metadata.name,
            Some("garage-admin-credentials".to_string())
        );
        assert_eq!(secret.metadata.namespace, Some("garage".to_string()));
        assert_eq!(secret.type_, Some("Opaque".to_string()));
        assert_eq!(
            secret.metadata.labels.as_ref().and_then(|l| l.get("app.kubernetes.io/part-of")),
            Some(&"garage".to_string())
        );
        assert_eq!(secret.metadata.annotations, None);

        let data = secret.data.expect("Secret should have data");
        assert_eq!(data[ACCESS_KEY_ID].0, b"GK2".to_vec());
        assert_eq!(data[SECRET_ACCESS_KEY].0, b"secret-of-GK2".to_vec());
        assert_eq!(data[KEY_NAME].0, b"admin".to_vec());
    }

    #[test]
    fn test_secret_requires_secret_key() {
        let config = config_with_keys();
        let mut without_secret = key("GK1", "app");
        without_secret.secret_access_key = None;

        let err = new_credentials_secret(&config.access_keys[0], &without_secret, &config)
            .unwrap_err();
        assert!(matches!(err, Error::MissingSecretKey { .. }));
    }

    #[tokio::test]
    async fn test_existing_secret_is_untouched() {
        let mut config = config_with_keys();
        config.access_keys.truncate(1);

        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .with(eq("app"), eq("garage"))
            .times(1)
            .returning(|_, _| Ok(Some(Secret::default())));
        store.expect_create_secret().never();

        let outcomes = ensure_credentials_secrets(&store, &config, &keys())
            .await
            .unwrap();
        assert_eq!(outcomes["app"], Provisioned::Existing);
    }

    #[tokio::test]
    async fn test_secrets_created_once_across_runs() {
        let mut config = config_with_keys();
        config.access_keys_secret_namespace = Some("apps".to_string());
        let store = FakeSecretStore::default();

        let first = ensure_credentials_secrets(&store, &config, &keys())
            .await
            .unwrap();
        assert!(first.values().all(|o| *o == Provisioned::Created));
        assert_eq!(store.len(), 2);
        assert!(store.get("garage-admin-credentials", "apps").is_some());

        let second = ensure_credentials_secrets(&store, &config, &keys())
            .await
            .unwrap();
        assert!(second.values().all(|o| *o == Provisioned::Existing));
        assert_eq!(store.len(), 2);
    }
}
