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

use crate::admin::{self, AdminApi, ApiResponse};
use crate::config::ClusterConfiguration;
use crate::types::v2::bucket::{AllowBucketKeyRequest, BucketInfo};
use crate::types::v2::key::KeyInfo;
use snafu::{OptionExt, ResultExt, Snafu};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("access key '{}' was not provisioned", key))]
    UnknownKey { key: String },

    #[snafu(display("bucket '{}' was not provisioned", bucket))]
    UnknownBucket { bucket: String },

    #[snafu(display("cannot grant '{}' access to bucket '{}': {}", key, bucket, source))]
    Grant {
        key: String,
        bucket: String,
        source: admin::Error,
    },

    #[snafu(display("granting '{}' access to bucket '{}' failed: {}", key, bucket, response))]
    GrantRejected {
        key: String,
        bucket: String,
        response: String,
    },
}

/// Issue one `AllowBucketKey` per configured grant. Returns the number of grants.
pub async fn grant_permissions<A>(
    api: &A,
    config: &ClusterConfiguration,
    buckets: &BTreeMap<String, BucketInfo>,
    keys: &BTreeMap<String, KeyInfo>,
) -> Result<usize, Error>
where
    A: AdminApi + ?Sized,
{
    let mut granted = 0;

    for spec in &config.access_keys {
        if spec.buckets.is_empty() {
            continue;
        }
        let key = keys
            .get(&spec.name)
            .context(UnknownKeySnafu { key: &spec.name })?;

        for grant in &spec.buckets {
            let bucket = buckets.get(&grant.bucket).context(UnknownBucketSnafu {
                bucket: &grant.bucket,
            })?;

            let request = AllowBucketKeyRequest {
                bucket_id: bucket.id.clone(),
                access_key_id: key.access_key_id.clone(),
                permissions: grant.permission(),
            };

            match api.allow_bucket_key(&request).await.context(GrantSnafu {
                key: &spec.name,
                bucket: &grant.bucket,
            })? {
                ApiResponse::Success(_) => {
                    info!(
                        "granted '{}' read={} write={} owner={} on bucket '{}'",
                        spec.name, grant.read, grant.write, grant.owner, grant.bucket
                    );
                    granted += 1;
                }
                other => {
                    return GrantRejectedSnafu {
                        key: &spec.name,
                        bucket: &grant.bucket,
                        response: other.to_string(),
                    }
                    .fail();
                }
            }
        }
    }

    Ok(granted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{ApiError, MockAdminApi};
    use crate::config::{AccessKeySpec, BucketGrant};
    use crate::tests::{bucket, create_test_config, key};
    use crate::types::v2::bucket::BucketKeyPermission;

    fn config_with_grant(owner: bool) -> ClusterConfiguration {
        let mut config = create_test_config();
        config.buckets = vec!["media".to_string()];
        let mut app = AccessKeySpec::new("app", false);
        app.buckets = vec![BucketGrant {
            bucket: "media".to_string(),
            read: true,
            write: false,
            owner,
        }];
        config.access_keys = vec![app, AccessKeySpec::new("idle", false)];
        config
    }

    fn provisioned() -> (BTreeMap<String, BucketInfo>, BTreeMap<String, KeyInfo>) {
        let buckets = BTreeMap::from([("media".to_string(), bucket("b-1", "media"))]);
        let keys = BTreeMap::from([
            ("app".to_string(), key("GK1", "app")),
            ("idle".to_string(), key("GK2", "idle")),
        ]);
        (buckets, keys)
    }

    #[tokio::test]
    async fn test_grants_use_provisioned_ids() {
        let config = config_with_grant(true);
        let (buckets, keys) = provisioned();

        let mut api = MockAdminApi::new();
        api.expect_allow_bucket_key()
            .withf(|request| {
                *request
                    == AllowBucketKeyRequest {
                        bucket_id: "b-1".to_string(),
                        access_key_id: "GK1".to_string(),
                        permissions: BucketKeyPermission {
                            read: true,
                            write: false,
                            owner: true,
                        },
                    }
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::Success(bucket("b-1", "media"))));

        let granted = grant_permissions(&api, &config, &buckets, &keys).await.unwrap();
        assert_eq!(granted, 1);
    }

    #[tokio::test]
    async fn test_rejected_grant_is_fatal() {
        let config = config_with_grant(false);
        let (buckets, keys) = provisioned();

        let mut api = MockAdminApi::new();
        api.expect_allow_bucket_key().times(1).returning(|_| {
            Ok(ApiResponse::Error(ApiError {
                status: 400,
                message: "invalid permissions".to_string(),
            }))
        });

        let err = grant_permissions(&api, &config, &buckets, &keys)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GrantRejected { .. }));
    }

    #[tokio::test]
    async fn test_unprovisioned_key_is_reported() {
        let config = config_with_grant(false);
        let (buckets, _) = provisioned();

        let mut api = MockAdminApi::new();
        api.expect_allow_bucket_key().never();

        let err = grant_permissions(&api, &config, &buckets, &BTreeMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "access key 'app' was not provisioned");
    }
}
