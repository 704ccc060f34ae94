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
use std::fmt;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyPermissions {
    #[serde(default)]
    pub create_bucket: bool,
}

/// Access key descriptor returned by `GetKeyInfo` and `CreateKey`.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub access_key_id: String,

    #[serde(default)]
    pub name: String,

    /// Only present when requested with `showSecretKey=true` or on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default)]
    pub expired: bool,

    #[serde(default)]
    pub permissions: KeyPermissions,
}

// Secret material must never end up in logs.
impl fmt::Debug for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyInfo")
            .field("access_key_id", &self.access_key_id)
            .field("name", &self.name)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("expired", &self.expired)
            .field("permissions", &self.permissions)
            .finish()
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    pub name: String,
    pub never_expires: bool,
    pub allow: KeyPermissions,
}

impl CreateKeyRequest {
    /// Request for a key that never expires.
    pub fn new(name: impl Into<String>, create_bucket: bool) -> Self {
        Self {
            name: name.into(),
            never_expires: true,
            allow: KeyPermissions { create_bucket },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let key = KeyInfo {
            access_key_id: "GK123".to_string(),
            name: "app".to_string(),
            secret_access_key: Some("super-secret".to_string()),
            ..Default::default()
        };

        let rendered = format!("{:?}", key);
        assert!(rendered.contains("GK123"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_create_key_request_never_expires() {
        let value = serde_json::to_value(CreateKeyRequest::new("app", true)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "app",
                "neverExpires": true,
                "allow": {"createBucket": true}
            })
        );
    }
}
