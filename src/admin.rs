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

//! Garage admin API access.
//!
//! Two layers live here:
//! - [`ResourceClient`] issues one authenticated call and classifies the HTTP
//!   outcome into an [`ApiResponse`]. This classification is the only thing
//!   the pipeline steps branch on.
//! - [`AdminApi`] is the typed `/v2/` surface on top of it, implemented by
//!   [`GarageAdmin`] for any [`ResourceClient`].

use crate::types::v2::bucket::{AllowBucketKeyRequest, BucketInfo, CreateBucketRequest};
use crate::types::v2::cluster::{
    ApplyClusterLayoutRequest, ApplyClusterLayoutResponse, ClusterHealth, ClusterLayout,
    ClusterStatus, UpdateClusterLayoutRequest,
};
use crate::types::v2::key::{CreateKeyRequest, KeyInfo};
use async_trait::async_trait;
use http::{Method, StatusCode};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use snafu::{ResultExt, Snafu};
use std::fmt;

pub mod client;

pub use client::HttpResourceClient;

pub const GET_CLUSTER_HEALTH: &str = "/v2/GetClusterHealth";
pub const GET_CLUSTER_STATUS: &str = "/v2/GetClusterStatus";
pub const UPDATE_CLUSTER_LAYOUT: &str = "/v2/UpdateClusterLayout";
pub const APPLY_CLUSTER_LAYOUT: &str = "/v2/ApplyClusterLayout";
pub const GET_BUCKET_INFO: &str = "/v2/GetBucketInfo";
pub const CREATE_BUCKET: &str = "/v2/CreateBucket";
pub const GET_KEY_INFO: &str = "/v2/GetKeyInfo";
pub const CREATE_KEY: &str = "/v2/CreateKey";
pub const ALLOW_BUCKET_KEY: &str = "/v2/AllowBucketKey";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("admin API request to {} failed: {}", endpoint, source))]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[snafu(display("unexpected admin API payload from {}: {}", endpoint, source))]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },

    #[snafu(display("cannot encode request body for {}: {}", endpoint, source))]
    Encode {
        endpoint: String,
        source: serde_json::Error,
    },
}

/// A non-2xx answer of the admin API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    /// Authentication failures cannot be fixed by retrying.
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
            || self.status == StatusCode::FORBIDDEN.as_u16()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

/// Classified outcome of an admin API call.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    NotFound,
    Error(ApiError),
}

impl ApiResponse<Value> {
    /// Decode a success payload into its typed form.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, serde_json::Error> {
        Ok(match self {
            ApiResponse::Success(payload) => ApiResponse::Success(serde_json::from_value(payload)?),
            ApiResponse::NotFound => ApiResponse::NotFound,
            ApiResponse::Error(e) => ApiResponse::Error(e),
        })
    }
}

impl<T> fmt::Display for ApiResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiResponse::Success(_) => write!(f, "success"),
            ApiResponse::NotFound => write!(f, "not found"),
            ApiResponse::Error(e) => write!(f, "{}", e),
        }
    }
}

/// One admin API call: verb, endpoint path, query and optional JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_owned(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(path: &str, body: &B) -> Result<Self, Error> {
        let body = serde_json::to_value(body).context(EncodeSnafu { endpoint: path })?;
        Ok(Self {
            method: Method::POST,
            path: path.to_owned(),
            query: Vec::new(),
            body: Some(body),
        })
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_owned(), value.to_owned()));
        self
    }
}

/// Classify a raw HTTP answer.
///
/// 2xx is `Success`, 404 is `NotFound` only for reads (GET), every other
/// status is `Error`. A success body that is not JSON is a decode error.
///
/// Key lookups follow the same rule: `GetKeyInfo?search=` answering 400 for
/// an unknown name is an `Error`, not `NotFound`.
pub fn classify(
    method: &Method,
    status: StatusCode,
    body: &str,
) -> Result<ApiResponse<Value>, serde_json::Error> {
    if status.is_success() {
        let payload = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body)?
        };
        return Ok(ApiResponse::Success(payload));
    }

    if status == StatusCode::NOT_FOUND && *method == Method::GET {
        return Ok(ApiResponse::NotFound);
    }

    Ok(ApiResponse::Error(ApiError {
        status: status.as_u16(),
        message: error_message(status, body),
    }))
}

// Garage error bodies look like {"code": "...", "message": "...", ...}.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body)
        && let Some(Value::String(message)) = map.get("message")
    {
        return message.clone();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Transport for admin API calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse<Value>, Error>;
}

/// Typed Garage admin API v2.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn get_cluster_health(&self) -> Result<ApiResponse<ClusterHealth>, Error>;

    async fn get_cluster_status(&self) -> Result<ApiResponse<ClusterStatus>, Error>;

    /// Stage role changes. Does not touch the running layout.
    async fn update_cluster_layout(
        &self,
        request: &UpdateClusterLayoutRequest,
    ) -> Result<ApiResponse<ClusterLayout>, Error>;

    /// Apply staged changes as layout `version`.
    async fn apply_cluster_layout(
        &self,
        version: u64,
    ) -> Result<ApiResponse<ApplyClusterLayoutResponse>, Error>;

    async fn get_bucket_info(&self, global_alias: &str) -> Result<ApiResponse<BucketInfo>, Error>;

    async fn create_bucket(&self, global_alias: &str) -> Result<ApiResponse<BucketInfo>, Error>;

    async fn get_key_info(&self, name: &str) -> Result<ApiResponse<KeyInfo>, Error>;

    async fn create_key(&self, request: &CreateKeyRequest) -> Result<ApiResponse<KeyInfo>, Error>;

    async fn allow_bucket_key(
        &self,
        request: &AllowBucketKeyRequest,
    ) -> Result<ApiResponse<BucketInfo>, Error>;
}

pub struct GarageAdmin<C> {
    client: C,
}

impl<C: ResourceClient> GarageAdmin<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse<T>, Error> {
        let endpoint = request.path.clone();
        self.client
            .call(request)
            .await?
            .decode()
            .context(DecodeSnafu { endpoint })
    }
}

#[async_trait]
impl<C: ResourceClient> AdminApi for GarageAdmin<C> {
    async fn get_cluster_health(&self) -> Result<ApiResponse<ClusterHealth>, Error> {
        self.send(ApiRequest::get(GET_CLUSTER_HEALTH)).await
    }

    async fn get_cluster_status(&self) -> Result<ApiResponse<ClusterStatus>, Error> {
        self.send(ApiRequest::get(GET_CLUSTER_STATUS)).await
    }

    async fn update_cluster_layout(
        &self,
        request: &UpdateClusterLayoutRequest,
    ) -> Result<ApiResponse<ClusterLayout>, Error> {
        self.send(ApiRequest::post(UPDATE_CLUSTER_LAYOUT, request)?).await
    }

    async fn apply_cluster_layout(
        &self,
        version: u64,
    ) -> Result<ApiResponse<ApplyClusterLayoutResponse>, Error> {
        let body = ApplyClusterLayoutRequest { version };
        self.send(ApiRequest::post(APPLY_CLUSTER_LAYOUT, &body)?).await
    }

    async fn get_bucket_info(&self, global_alias: &str) -> Result<ApiResponse<BucketInfo>, Error> {
        self.send(ApiRequest::get(GET_BUCKET_INFO).with_query("globalAlias", global_alias))
            .await
    }

    async fn create_bucket(&self, global_alias: &str) -> Result<ApiResponse<BucketInfo>, Error> {
        let body = CreateBucketRequest {
            global_alias: global_alias.to_owned(),
        };
        self.send(ApiRequest::post(CREATE_BUCKET, &body)?).await
    }

    async fn get_key_info(&self, name: &str) -> Result<ApiResponse<KeyInfo>, Error> {
        self.send(
            ApiRequest::get(GET_KEY_INFO)
                .with_query("search", name)
                .with_query("showSecretKey", "true"),
        )
        .await
    }

    async fn create_key(&self, request: &CreateKeyRequest) -> Result<ApiResponse<KeyInfo>, Error> {
        self.send(ApiRequest::post(CREATE_KEY, request)?).await
    }

    async fn allow_bucket_key(
        &self,
        request: &AllowBucketKeyRequest,
    ) -> Result<ApiResponse<BucketInfo>, Error> {
        self.send(ApiRequest::post(ALLOW_BUCKET_KEY, request)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_success() {
        let response = classify(&Method::GET, StatusCode::OK, r#"{"status":"healthy"}"#).unwrap();
        assert_eq!(response, ApiResponse::Success(json!({"status": "healthy"})));

        let empty = classify(&Method::POST, StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(empty, ApiResponse::Success(Value::Null));
    }

    #[test]
    fn test_classify_not_found_only_for_reads() {
        let read = classify(&Method::GET, StatusCode::NOT_FOUND, "").unwrap();
        assert_eq!(read, ApiResponse::NotFound);

        let write = classify(
            &Method::POST,
            StatusCode::NOT_FOUND,
            r#"{"code":"NoSuchBucket","message":"Bucket not found"}"#,
        )
        .unwrap();
        assert_eq!(
            write,
            ApiResponse::Error(ApiError {
                status: 404,
                message: "Bucket not found".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_error_message() {
        let json_body = classify(
            &Method::POST,
            StatusCode::BAD_REQUEST,
            r#"{"code":"InvalidRequest","message":"layout version mismatch"}"#,
        )
        .unwrap();
        assert_eq!(json_body.to_string(), "HTTP 400: layout version mismatch");

        let text_body = classify(&Method::GET, StatusCode::BAD_GATEWAY, "upstream down\n").unwrap();
        assert_eq!(text_body.to_string(), "HTTP 502: upstream down");

        let no_body = classify(&Method::GET, StatusCode::SERVICE_UNAVAILABLE, "").unwrap();
        assert_eq!(no_body.to_string(), "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_classify_success_with_garbage_body() {
        assert!(classify(&Method::GET, StatusCode::OK, "<html>").is_err());
    }

    #[test]
    fn test_api_error_unauthorized() {
        let forbidden = ApiError {
            status: 403,
            message: "Forbidden".to_string(),
        };
        let server = ApiError {
            status: 500,
            message: "Internal Server Error".to_string(),
        };
        assert!(forbidden.is_unauthorized());
        assert!(!server.is_unauthorized());
    }

    #[tokio::test]
    async fn test_apply_layout_sends_version() {
        let mut client = MockResourceClient::new();
        client
            .expect_call()
            .withf(|req| {
                req.method == Method::POST
                    && req.path == APPLY_CLUSTER_LAYOUT
                    && req.body == Some(json!({"version": 4}))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::Success(json!({"message": ["applied"]}))));

        let admin = GarageAdmin::new(client);
        let response = admin.apply_cluster_layout(4).await.unwrap();
        assert_eq!(
            response,
            ApiResponse::Success(ApplyClusterLayoutResponse {
                message: vec!["applied".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn test_get_key_info_requests_secret() {
        let mut client = MockResourceClient::new();
        client
            .expect_call()
            .withf(|req| {
                req.method == Method::GET
                    && req.path == GET_KEY_INFO
                    && req.query
                        == vec![
                            ("search".to_string(), "app".to_string()),
                            ("showSecretKey".to_string(), "true".to_string()),
                        ]
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::NotFound));

        let admin = GarageAdmin::new(client);
        let response = admin.get_key_info("app").await.unwrap();
        assert_eq!(response, ApiResponse::NotFound);
    }

    #[tokio::test]
    async fn test_get_bucket_info_decodes_payload() {
        let mut client = MockResourceClient::new();
        client
            .expect_call()
            .withf(|req| {
                req.path == GET_BUCKET_INFO
                    && req.query == vec![("globalAlias".to_string(), "media".to_string())]
            })
            .returning(|_| {
                Ok(ApiResponse::Success(json!({
                    "id": "b-1",
                    "globalAliases": ["media"],
                    "websiteAccess": false,
                    "keys": []
                })))
            });

        let admin = GarageAdmin::new(client);
        match admin.get_bucket_info("media").await.unwrap() {
            ApiResponse::Success(bucket) => {
                assert_eq!(bucket.id, "b-1");
                assert_eq!(bucket.global_aliases, vec!["media".to_string()]);
            }
            other => panic!("unexpected response: {}", other),
        }
    }

    #[tokio::test]
    async fn test_undecodable_success_is_error() {
        let mut client = MockResourceClient::new();
        client
            .expect_call()
            .returning(|_| Ok(ApiResponse::Success(json!({"unexpected": true}))));

        let admin = GarageAdmin::new(client);
        let err = admin.get_cluster_status().await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(err.to_string().contains(GET_CLUSTER_STATUS));
    }
}
