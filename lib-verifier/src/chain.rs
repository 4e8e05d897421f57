//! Chain collaborator: fetches the code currently deployed at an address

use crate::error::{VerifyError, VerifyResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default local JSON-RPC endpoint
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Source of deployed contract code
#[async_trait]
pub trait Chain: Send + Sync {
    /// `0x`-prefixed hex of the code stored at `address`
    async fn get_code(&self, address: &str) -> VerifyResult<String>;
}

/// Ethereum JSON-RPC client using `eth_getCode` at the latest block
pub struct JsonRpcChain {
    rpc_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: [&'a str; 2],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcChain {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> VerifyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::chain("*", format!("HTTP client setup failed: {}", e)))?;
        Ok(self.with_client(client))
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl Chain for JsonRpcChain {
    async fn get_code(&self, address: &str) -> VerifyResult<String> {
        validate_address(address)?;

        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "eth_getCode",
            params: [address, "latest"],
            id: 1,
        };
        debug!("eth_getCode {} via {}", address, self.rpc_url);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VerifyError::chain(address, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VerifyError::chain(
                address,
                format!("HTTP {} from {}", response.status(), self.rpc_url),
            ));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::chain(address, format!("invalid JSON-RPC response: {}", e)))?;

        extract_code(address, body)
    }
}

fn extract_code(address: &str, body: RpcResponse) -> VerifyResult<String> {
    if let Some(err) = body.error {
        return Err(VerifyError::chain(
            address,
            format!("RPC error {}: {}", err.code, err.message),
        ));
    }
    match body.result {
        Some(Value::String(code)) => Ok(code),
        Some(other) => Err(VerifyError::chain(
            address,
            format!("unexpected result type: {}", other),
        )),
        None => Err(VerifyError::chain(address, "response carries no result")),
    }
}

/// Addresses must be `0x` followed by 40 hex digits
pub fn validate_address(address: &str) -> VerifyResult<()> {
    let valid = address
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(VerifyError::chain(address, "malformed address"))
    }
}
