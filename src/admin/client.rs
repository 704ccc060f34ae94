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

use super::{ApiRequest, ApiResponse, DecodeSnafu, Error, ResourceClient, TransportSnafu, classify};
use async_trait::async_trait;
use serde_json::Value;
use snafu::ResultExt;
use tracing::debug;

/// [`ResourceClient`] speaking HTTP to the admin endpoint with a bearer token.
pub struct HttpResourceClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(TransportSnafu { endpoint: base_url })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse<Value>, Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .bearer_auth(&self.token);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.context(TransportSnafu {
            endpoint: &request.path,
        })?;
        let status = response.status();
        let body = response.text().await.context(TransportSnafu {
            endpoint: &request.path,
        })?;

        debug!(
            method = %request.method,
            endpoint = %request.path,
            status = %status,
            "admin API call"
        );

        classify(&request.method, status, &body).context(DecodeSnafu {
            endpoint: &request.path,
        })
    }
}
