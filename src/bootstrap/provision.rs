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

//! Idempotent provisioning of buckets and access keys.
//!
//! Every named resource is looked up first. A hit is recorded untouched, a
//! miss is created exactly once, and any other answer aborts the run.

use crate::admin::{self, AdminApi, ApiResponse};
use crate::config::ClusterConfiguration;
use crate::types::v2::bucket::BucketInfo;
use crate::types::v2::key::{CreateKeyRequest, KeyInfo};
use snafu::{ResultExt, Snafu};
use std::collections::BTreeMap;
use std::future::Future;
use strum::Display;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum ResourceKind {
    #[strum(to_string = "bucket")]
    Bucket,

    #[strum(to_string = "access key")]
    AccessKey,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot look up {} '{}': {}", kind, name, source))]
    Lookup {
        kind: ResourceKind,
        name: String,
        source: admin::Error,
    },

    #[snafu(display("lookup of {} '{}' failed: {}", kind, name, response))]
    LookupRejected {
        kind: ResourceKind,
        name: String,
        response: String,
    },

    #[snafu(display("cannot create {} '{}': {}", kind, name, source))]
    Create {
        kind: ResourceKind,
        name: String,
        source: admin::Error,
    },

    #[snafu(display("creation of {} '{}' failed: {}", kind, name, response))]
    CreateRejected {
        kind: ResourceKind,
        name: String,
        response: String,
    },
}

/// How a resource came to exist in this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Provisioned {
    #[strum(to_string = "already exists")]
    Existing,

    #[strum(to_string = "created")]
    Created,
}

/// Look `name` up and create it only when the lookup reports not-found.
pub async fn ensure_resource<T, L, LFut, C, CFut>(
    kind: ResourceKind,
    name: &str,
    lookup: L,
    create: C,
) -> Result<(T, Provisioned), Error>
where
    L: FnOnce() -> LFut,
    LFut: Future<Output = Result<ApiResponse<T>, admin::Error>>,
    C: FnOnce() -> CFut,
    CFut: Future<Output = Result<ApiResponse<T>, admin::Error>>,
{
    info!("checking if {} '{}' exists", kind, name);

    match lookup().await.context(LookupSnafu { kind, name })? {
        ApiResponse::Success(descriptor) => {
            info!("{} '{}' already exists", kind, name);
            Ok((descriptor, Provisioned::Existing))
        }
        ApiResponse::NotFound => {
            info!("{} '{}' does not exist, creating it", kind, name);
            match create().await.context(CreateSnafu { kind, name })? {
                ApiResponse::Success(descriptor) => {
                    info!("{} '{}' created", kind, name);
                    Ok((descriptor, Provisioned::Created))
                }
                other => CreateRejectedSnafu {
                    kind,
                    name,
                    response: other.to_string(),
                }
                .fail(),
            }
        }
        other @ ApiResponse::Error(_) => LookupRejectedSnafu {
            kind,
            name,
            response: other.to_string(),
        }
        .fail(),
    }
}

/// Ensure every configured bucket exists, keyed by global alias.
pub async fn provision_buckets<A>(
    api: &A,
    config: &ClusterConfiguration,
) -> Result<BTreeMap<String, BucketInfo>, Error>
where
    A: AdminApi + ?Sized,
{
    let mut buckets = BTreeMap::new();

    for alias in &config.buckets {
        let (bucket, _) = ensure_resource(
            ResourceKind::Bucket,
            alias,
            || api.get_bucket_info(alias),
            || api.create_bucket(alias),
        )
        .await?;
        buckets.insert(alias.clone(), bucket);
    }

    Ok(buckets)
}

/// Ensure every configured access key exists, keyed by key name.
pub async fn provision_keys<A>(
    api: &A,
    config: &ClusterConfiguration,
) -> Result<BTreeMap<String, KeyInfo>, Error>
where
    A: AdminApi + ?Sized,
{
    let mut keys = BTreeMap::new();

    for spec in &config.access_keys {
        let request = CreateKeyRequest::new(&spec.name, spec.create_bucket);
        let (key, _) = ensure_resource(
            ResourceKind::AccessKey,
            &spec.name,
            || api.get_key_info(&spec.name),
            || api.create_key(&request),
        )
        .await?;
        keys.insert(spec.name.clone(), key);
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{ApiError, MockAdminApi};
    use crate::config::AccessKeySpec;
    use crate::tests::{FakeGarage, bucket, create_test_config, key};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_existing_bucket_is_not_created() {
        let mut config = create_test_config();
        config.buckets = vec!["media".to_string()];

        let mut api = MockAdminApi::new();
        api.expect_get_bucket_info()
            .with(eq("media"))
            .times(1)
            .returning(|alias| Ok(ApiResponse::Success(bucket("b-1", alias))));
        api.expect_create_bucket().never();

        let buckets = provision_buckets(&api, &config).await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets["media"].id, "b-1");
    }

    #[tokio::test]
    async fn test_missing_bucket_is_created_once() {
        let mut config = create_test_config();
        config.buckets = vec!["media".to_string()];

        let mut api = MockAdminApi::new();
        api.expect_get_bucket_info()
            .returning(|_| Ok(ApiResponse::NotFound));
        api.expect_create_bucket()
            .with(eq("media"))
            .times(1)
            .returning(|alias| Ok(ApiResponse::Success(bucket("b-new", alias))));

        let buckets = provision_buckets(&api, &config).await.unwrap();
        assert_eq!(buckets["media"].id, "b-new");
    }

    #[tokio::test]
    async fn test_failed_creation_aborts() {
        let mut config = create_test_config();
        config.buckets = vec!["media".to_string(), "logs".to_string()];

        let mut api = MockAdminApi::new();
        api.expect_get_bucket_info()
            .with(eq("media"))
            .times(1)
            .returning(|_| Ok(ApiResponse::NotFound));
        api.expect_get_bucket_info().with(eq("logs")).never();
        api.expect_create_bucket().times(1).returning(|_| {
            Ok(ApiResponse::Error(ApiError {
                status: 409,
                message: "bucket alias already taken".to_string(),
            }))
        });

        let err = provision_buckets(&api, &config).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "creation of bucket 'media' failed: HTTP 409: bucket alias already taken"
        );
    }

    #[tokio::test]
    async fn test_lookup_error_is_fatal_without_create() {
        let mut config = create_test_config();
        config.access_keys = vec![AccessKeySpec::new("app", false)];

        let mut api = MockAdminApi::new();
        api.expect_get_key_info().times(1).returning(|_| {
            Ok(ApiResponse::Error(ApiError {
                status: 500,
                message: "db error".to_string(),
            }))
        });
        api.expect_create_key().never();

        let err = provision_keys(&api, &config).await.unwrap_err();
        assert!(matches!(
            err,
            Error::LookupRejected {
                kind: ResourceKind::AccessKey,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_key_is_created_with_flags() {
        let mut config = create_test_config();
        config.access_keys = vec![AccessKeySpec::new("app", true)];

        let mut api = MockAdminApi::new();
        api.expect_get_key_info()
            .with(eq("app"))
            .returning(|_| Ok(ApiResponse::NotFound));
        api.expect_create_key()
            .withf(|request| {
                *request == CreateKeyRequest::new("app", true) && request.never_expires
            })
            .times(1)
            .returning(|request| Ok(ApiResponse::Success(key("GK1", &request.name))));

        let keys = provision_keys(&api, &config).await.unwrap();
        assert_eq!(keys["app"].access_key_id, "GK1");
    }

    #[tokio::test]
    async fn test_ensure_resource_reports_outcome() {
        let (value, outcome) = ensure_resource(
            ResourceKind::Bucket,
            "media",
            || async { Ok(ApiResponse::NotFound) },
            || async { Ok(ApiResponse::Success(7u8)) },
        )
        .await
        .unwrap();
        assert_eq!((value, outcome), (7, Provisioned::Created));

        let (value, outcome) = ensure_resource(
            ResourceKind::Bucket,
            "media",
            || async { Ok(ApiResponse::Success(3u8)) },
            || async { Ok(ApiResponse::Success(99u8)) },
        )
        .await
        .unwrap();
        assert_eq!((value, outcome), (3, Provisioned::Existing));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let mut config = create_test_config();
        config.buckets = vec!["media".to_string(), "backups".to_string()];
        config.access_keys = vec![AccessKeySpec::new("app", false), AccessKeySpec::new("ci", true)];

        let garage = FakeGarage::default();

        let first_buckets = provision_buckets(&garage, &config).await.unwrap();
        let first_keys = provision_keys(&garage, &config).await.unwrap();
        assert_eq!(garage.bucket_creations(), 2);
        assert_eq!(garage.key_creations(), 2);

        let second_buckets = provision_buckets(&garage, &config).await.unwrap();
        let second_keys = provision_keys(&garage, &config).await.unwrap();
        assert_eq!(garage.bucket_creations(), 2);
        assert_eq!(garage.key_creations(), 2);

        assert_eq!(first_buckets, second_buckets);
        assert_eq!(first_keys, second_keys);
    }
}
