use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::store::backend::{KvBackend, StoreError};

/// Connection parameters for a Redis REST endpoint (Upstash / Vercel KV).
#[derive(Debug, Clone)]
pub struct KvCredentials {
    pub url: String,
    pub token: String,
}

pub struct UpstashBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RestResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashBackend {
    pub fn new(credentials: &KvCredentials, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: credentials.url.trim_end_matches('/').to_string(),
            token: credentials.token.clone(),
        }
    }

    fn command_url(&self, command: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, command, urlencode(key))
    }

    async fn decode(resp: reqwest::Response) -> Result<RestResponse, StoreError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: RestResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if let Some(msg) = body.error {
            return Err(StoreError::BadResponse(msg));
        }
        Ok(body)
    }
}

fn urlencode(key: &str) -> String {
    url::form_urlencoded::byte_serialize(key.as_bytes()).collect()
}

#[async_trait]
impl KvBackend for UpstashBackend {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let resp = self
            .client
            .get(self.command_url("get", key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        match Self::decode(resp).await?.result {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(text)) => Ok(Some(text)),
            // Some clients store documents without string-encoding them
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.command_url("set", key))
            .bearer_auth(&self.token)
            .body(value)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        match Self::decode(resp).await?.result {
            Some(serde_json::Value::String(s)) if s == "OK" => Ok(()),
            other => Err(StoreError::Rejected(format!("unexpected SET result: {:?}", other))),
        }
    }

    fn name(&self) -> &'static str {
        "upstash-rest"
    }
}
