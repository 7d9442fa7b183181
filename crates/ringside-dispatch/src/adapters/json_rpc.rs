//! # JSON-RPC Ledger Adapter
//!
//! Live `LedgerClient` speaking Ethereum JSON-RPC over HTTP.
//!
//! | Operation | RPC methods |
//! |-----------|-------------|
//! | `submit` | `eth_getTransactionCount`, `eth_sendRawTransaction` |
//! | `await_confirmation` | `eth_getTransactionReceipt` (polled) |
//! | `probe` | `eth_call` of `owner()` |

use crate::adapters::encoding::{
    encode_log_action, encode_mint_trophy, parse_address, parse_quantity, selector,
    DynamicFeeTx,
};
use crate::adapters::identity::SigningIdentity;
use crate::config::DispatcherConfig;
use crate::ports::outbound::{
    FeeParams, LedgerClient, LedgerConnector, LedgerError, LedgerTarget, PendingHandle, Receipt,
    SubmissionPayload,
};
use async_trait::async_trait;
use ringside_types::{Address, BlockRef};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds `JsonRpcLedgerClient`s that share one HTTP connection pool.
///
/// Every RPC call is bounded by the request timeout, so an endpoint that
/// accepts connections but never answers surfaces as `LedgerError::Timeout`.
#[derive(Debug, Clone)]
pub struct JsonRpcConnector {
    http: reqwest::Client,
    request_timeout: Duration,
    poll_interval: Duration,
}

impl JsonRpcConnector {
    pub fn new() -> Self {
        Self::with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Connector whose RPC calls give up after `request_timeout`.
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            request_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Connector using the dispatcher's RPC timeout.
    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self::with_request_timeout(config.rpc_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Interval between receipt polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for JsonRpcConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerConnector for JsonRpcConnector {
    async fn connect(&self, target: &LedgerTarget) -> Result<Arc<dyn LedgerClient>, LedgerError> {
        let contract = parse_address(&target.contract_address).ok_or_else(|| {
            LedgerError::Rejected(format!(
                "invalid contract address: {}",
                target.contract_address
            ))
        })?;

        Ok(Arc::new(JsonRpcLedgerClient {
            http: self.http.clone(),
            endpoint: target.endpoint_url.clone(),
            contract,
            chain_id: target.chain_id,
            identity: target.identity.clone(),
            request_timeout: self.request_timeout,
            poll_interval: self.poll_interval,
            next_id: AtomicU64::new(1),
        }))
    }
}

/// Live client bound to one endpoint, contract and signing identity.
pub struct JsonRpcLedgerClient {
    http: reqwest::Client,
    endpoint: String,
    contract: Address,
    chain_id: u64,
    identity: SigningIdentity,
    request_timeout: Duration,
    poll_interval: Duration,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

impl JsonRpcLedgerClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Network(format!(
                "{} returned HTTP {}: {}",
                method,
                status.as_u16(),
                body
            )));
        }

        let body: RpcResponse = resp.json().await.map_err(transport_error)?;
        if let Some(error) = body.error {
            debug!(method, code = error.code, message = %error.message, "JSON-RPC error");
            return Err(classify_rpc_error(&error.message));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    fn calldata(payload: &SubmissionPayload) -> Result<Vec<u8>, LedgerError> {
        match payload {
            SubmissionPayload::LogAction { data } => Ok(encode_log_action(data)),
            SubmissionPayload::MintTrophy { recipient } => parse_address(recipient)
                .map(|address| encode_mint_trophy(&address))
                .ok_or_else(|| {
                    LedgerError::Rejected(format!("invalid trophy recipient: {}", recipient))
                }),
        }
    }

    fn contract_hex(&self) -> String {
        format!("0x{}", hex::encode(self.contract))
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedgerClient {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
        fees: &FeeParams,
    ) -> Result<PendingHandle, LedgerError> {
        if !self.identity.can_sign() {
            return Err(LedgerError::Rejected("no signing key configured".to_string()));
        }

        let data = Self::calldata(payload)?;
        let nonce_value = self
            .call(
                "eth_getTransactionCount",
                json!([self.identity.address_hex(), "pending"]),
            )
            .await?;
        let nonce = nonce_value
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| LedgerError::Chain(format!("malformed nonce: {}", nonce_value)))?;

        let tx = DynamicFeeTx {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee: fees.priority_fee,
            max_fee: fees.fee_ceiling,
            gas_limit: fees.gas_budget,
            to: self.contract,
            data,
        };
        let signature = self
            .identity
            .sign_prehash(&tx.signing_hash())
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        let raw = tx.encode_signed(&signature);

        let hash = self
            .call(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        let id = hash
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LedgerError::Chain(format!("malformed tx hash: {}", hash)))?;

        debug!(tx_id = %id, nonce, "Transaction sent");
        Ok(PendingHandle { id })
    }

    async fn await_confirmation(&self, handle: &PendingHandle) -> Result<Receipt, LedgerError> {
        loop {
            match self
                .call("eth_getTransactionReceipt", json!([handle.id]))
                .await
            {
                Ok(value) => {
                    if let Some(receipt) = parse_receipt(&value)? {
                        return Ok(receipt);
                    }
                }
                // A dropped poll is not a verdict on the transaction.
                Err(LedgerError::Network(msg)) | Err(LedgerError::Timeout(msg)) => {
                    warn!(tx_id = %handle.id, error = %msg, "Receipt poll failed");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn probe(&self) -> Result<(), LedgerError> {
        let data = format!("0x{}", hex::encode(selector("owner()")));
        let result = self
            .call(
                "eth_call",
                json!([{ "to": self.contract_hex(), "data": data }, "latest"]),
            )
            .await?;

        match result.as_str() {
            Some(s) if s.len() > 2 => Ok(()),
            _ => Err(LedgerError::Chain(format!(
                "no contract code at {}",
                self.contract_hex()
            ))),
        }
    }
}

fn transport_error(err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout(err.to_string())
    } else {
        LedgerError::Network(err.to_string())
    }
}

/// Map a JSON-RPC error message onto the ledger error taxonomy.
pub fn classify_rpc_error(message: &str) -> LedgerError {
    if message.to_lowercase().contains("insufficient funds") {
        LedgerError::InsufficientFunds(message.to_string())
    } else {
        LedgerError::Rejected(message.to_string())
    }
}

/// `Ok(None)` while the transaction is not yet included.
pub fn parse_receipt(value: &Value) -> Result<Option<Receipt>, LedgerError> {
    if value.is_null() {
        return Ok(None);
    }

    let field = |name: &str| value.get(name).and_then(Value::as_str);

    if field("status") == Some("0x0") {
        return Err(LedgerError::Chain("transaction reverted".to_string()));
    }

    let number = field("blockNumber")
        .and_then(parse_quantity)
        .ok_or_else(|| LedgerError::Chain(format!("receipt without block number: {}", value)))?;
    let hash = field("blockHash").unwrap_or_default().to_string();
    let gas_used = field("gasUsed").and_then(parse_quantity);

    Ok(Some(Receipt {
        block_ref: BlockRef { number, hash },
        gas_used,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts connections and never writes a byte back.
    async fn silent_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    fn target(endpoint_url: String, identity: SigningIdentity) -> LedgerTarget {
        LedgerTarget {
            endpoint_url,
            contract_address: "0x0000000000000000000000000000000000000042".to_string(),
            chain_id: 1,
            identity,
        }
    }

    #[test]
    fn test_classify_insufficient_funds() {
        assert_eq!(
            classify_rpc_error("Insufficient funds for gas * price + value"),
            LedgerError::InsufficientFunds("Insufficient funds for gas * price + value".into())
        );
        assert_eq!(
            classify_rpc_error("nonce too low"),
            LedgerError::Rejected("nonce too low".into())
        );
    }

    #[test]
    fn test_parse_pending_receipt() {
        assert_eq!(parse_receipt(&Value::Null).unwrap(), None);
    }

    #[test]
    fn test_parse_confirmed_receipt() {
        let value = json!({
            "status": "0x1",
            "blockNumber": "0x10",
            "blockHash": "0xabc",
            "gasUsed": "0x5208",
        });
        let receipt = parse_receipt(&value).unwrap().unwrap();
        assert_eq!(receipt.block_ref.number, 16);
        assert_eq!(receipt.block_ref.hash, "0xabc");
        assert_eq!(receipt.gas_used, Some(21_000));
    }

    #[test]
    fn test_parse_reverted_receipt() {
        let value = json!({ "status": "0x0", "blockNumber": "0x1" });
        assert!(matches!(parse_receipt(&value), Err(LedgerError::Chain(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_contract() {
        let target = LedgerTarget {
            endpoint_url: "http://127.0.0.1:1".to_string(),
            contract_address: "not-an-address".to_string(),
            chain_id: 1,
            identity: SigningIdentity::read_only(),
        };
        let result = JsonRpcConnector::new().connect(&target).await;
        assert!(matches!(result, Err(LedgerError::Rejected(_))));
    }

    #[test]
    fn test_request_timeout_follows_config() {
        let config = DispatcherConfig {
            rpc_timeout: Duration::from_millis(750),
            ..Default::default()
        };
        let connector = JsonRpcConnector::from_config(&config);
        assert_eq!(connector.request_timeout(), Duration::from_millis(750));
        assert_eq!(JsonRpcConnector::new().request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out_contract_check() {
        let endpoint = silent_endpoint().await;
        let client = JsonRpcConnector::with_request_timeout(Duration::from_millis(200))
            .connect(&target(endpoint, SigningIdentity::read_only()))
            .await
            .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), client.probe())
            .await
            .expect("contract check should give up on its own");
        assert!(matches!(result, Err(LedgerError::Timeout(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out_submit() {
        let endpoint = silent_endpoint().await;
        let identity = SigningIdentity::from_secret_hex(&"11".repeat(32)).unwrap();
        let client = JsonRpcConnector::with_request_timeout(Duration::from_millis(200))
            .connect(&target(endpoint, identity))
            .await
            .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.submit(
                &SubmissionPayload::LogAction { data: "{}".into() },
                &FeeParams::default(),
            ),
        )
        .await
        .expect("submit should give up on its own");
        assert!(matches!(result, Err(LedgerError::Timeout(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_read_only_submit_is_rejected() {
        let target = LedgerTarget {
            endpoint_url: "http://127.0.0.1:1".to_string(),
            contract_address: "0x0000000000000000000000000000000000000042".to_string(),
            chain_id: 1,
            identity: SigningIdentity::read_only(),
        };
        let client = JsonRpcConnector::new().connect(&target).await.unwrap();
        let err = client
            .submit(
                &SubmissionPayload::LogAction { data: "{}".into() },
                &FeeParams::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Rejected("no signing key configured".into()));
    }
}
