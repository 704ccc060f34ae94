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

/// Bucket descriptor returned by `GetBucketInfo`, `CreateBucket` and `AllowBucketKey`.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub id: String,

    #[serde(default)]
    pub global_aliases: Vec<String>,

    #[serde(default)]
    pub website_access: bool,

    #[serde(default)]
    pub objects: u64,

    #[serde(default)]
    pub bytes: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    pub global_alias: String,
}

/// Permissions granted to an access key on a bucket.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BucketKeyPermission {
    pub read: bool,
    pub write: bool,
    pub owner: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AllowBucketKeyRequest {
    pub bucket_id: String,
    pub access_key_id: String,
    pub permissions: BucketKeyPermission,
}
