//! JSON-RPC client for the chain node.
//!
//! [`RpcClient`] is built once at process start and passed by reference to
//! everything that talks to the chain. Accounts are either managed by the node
//! (unlocked dev accounts, `eth_sendTransaction`, `eth_sign`) or registered
//! locally with [`RpcClient::with_signer`], in which case transactions and
//! signatures are produced in-process.

use std::time::Duration;

use alloy_consensus::{transaction::RlpEcdsaEncodableTx, TxLegacy};
use alloy_network::TxSignerSync;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256, U64};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::RpcConfig;
use crate::signing::TypedData;
use crate::{Error, Result};

/// Raw JSON-RPC request/response exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send one request and return its `result` (`null` when absent).
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// JSON-RPC over HTTP.
pub struct HttpTransport {
    rpc_url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 0,
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc {
                code: i64::from(response.status().as_u16()),
                message: format!("RPC request failed: {}", response.status()),
            });
        }

        let response: JsonRpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Transaction or call parameters in node JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    #[serde(skip_serializing_if = "U256::is_zero")]
    pub value: U256,
    pub data: Bytes,
}

impl TransactionRequest {
    /// Call `to` with `data`.
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            data: data.into(),
            ..Default::default()
        }
    }

    /// Contract creation with init code `data`.
    pub fn deploy(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = Some(U64::from(gas));
        self
    }
}

/// Mined transaction receipt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub gas_used: U256,
    #[serde(default)]
    pub logs: Vec<Value>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status and count as successful.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| status == U64::from(1))
    }
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    timestamp: U64,
}

/// JSON-RPC client for the chain node.
pub struct RpcClient {
    transport: Box<dyn RpcTransport>,
    signers: Vec<PrivateKeySigner>,
    receipt_poll_interval: Duration,
    receipt_attempts: u32,
}

impl RpcClient {
    /// Default interval between receipt polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
    /// Default number of receipt polls before giving up.
    pub const DEFAULT_RECEIPT_ATTEMPTS: u32 = 240;

    pub fn new(transport: impl RpcTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            signers: Vec::new(),
            receipt_poll_interval: Self::DEFAULT_POLL_INTERVAL,
            receipt_attempts: Self::DEFAULT_RECEIPT_ATTEMPTS,
        }
    }

    /// Client for an HTTP endpoint such as `http://localhost:8545`.
    pub fn http(rpc_url: impl Into<String>) -> Self {
        Self::new(HttpTransport::new(rpc_url))
    }

    /// Client configured from [`RpcConfig`], registering the deployer key if set.
    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        let mut client = Self::http(config.url.clone()).with_receipt_polling(
            Duration::from_millis(config.receipt_poll_interval_ms),
            config.receipt_attempts(),
        );

        if let Some(key) = &config.private_key {
            let signer: PrivateKeySigner =
                key.trim().trim_start_matches("0x").parse().map_err(|_| Error::Config {
                    message: "Invalid private key format - expected 64 hex characters"
                        .to_string(),
                })?;
            client = client.with_signer(signer);
        }

        Ok(client)
    }

    /// Register a locally held key; its address signs and sends in-process.
    pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn with_receipt_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_attempts = attempts.max(1);
        self
    }

    pub fn local_signer(&self, address: Address) -> Option<&PrivateKeySigner> {
        self.signers.iter().find(|signer| signer.address() == address)
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        debug!(method = method, "RPC request");
        let value = self.transport.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    /// Local signer addresses followed by node-managed accounts, each listed once.
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let mut accounts: Vec<Address> = self.signers.iter().map(|s| s.address()).collect();
        let remote: Vec<Address> = self.request("eth_accounts", json!([])).await?;
        for address in remote {
            if !accounts.contains(&address) {
                accounts.push(address);
            }
        }
        Ok(accounts)
    }

    /// Sender used when a transaction names none.
    pub async fn default_account(&self) -> Result<Address> {
        self.accounts()
            .await?
            .first()
            .copied()
            .ok_or_else(|| Error::Config {
                message: "No accounts available on node and no local signer registered"
                    .to_string(),
            })
    }

    pub async fn block_number(&self) -> Result<u64> {
        let number: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.to::<u64>())
    }

    /// Timestamp of the latest block (unix seconds).
    pub async fn block_timestamp(&self) -> Result<u64> {
        let block: Option<BlockHeader> = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let block = block.ok_or_else(|| Error::response("latest block not found"))?;
        Ok(block.timestamp.to::<u64>())
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.request("eth_getCode", json!([address, "latest"])).await
    }

    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"])).await
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        self.request("eth_call", json!([tx, "latest"])).await
    }

    /// Submit a transaction and return its hash.
    ///
    /// A missing `from` is filled with [`RpcClient::default_account`].
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256> {
        let mut tx = tx.clone();
        let from = match tx.from {
            Some(from) => from,
            None => self.default_account().await?,
        };
        tx.from = Some(from);

        match self.local_signer(from) {
            Some(signer) => self.send_signed_legacy(signer, &tx).await,
            None => self.request("eth_sendTransaction", json!([tx])).await,
        }
    }

    /// Sign a legacy transaction locally and submit it raw.
    async fn send_signed_legacy(
        &self,
        signer: &PrivateKeySigner,
        request: &TransactionRequest,
    ) -> Result<B256> {
        let address = signer.address();
        let nonce: U64 = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        let gas_price: U256 = self.request("eth_gasPrice", json!([])).await?;
        let gas_limit: U64 = match request.gas {
            Some(gas) => gas,
            None => self.request("eth_estimateGas", json!([request])).await?,
        };
        let chain_id = self.chain_id().await?;

        let mut tx = TxLegacy {
            chain_id: Some(chain_id),
            nonce: nonce.to::<u64>(),
            gas_price: gas_price.to::<u128>(),
            gas_limit: gas_limit.to::<u64>(),
            to: request.to.map_or(TxKind::Create, TxKind::Call),
            value: request.value,
            input: request.data.clone(),
        };

        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| Error::Signing {
                message: format!("Failed to sign transaction: {e}"),
            })?;

        let mut encoded = Vec::new();
        tx.rlp_encode_signed(&signature, &mut encoded);

        debug!(from = %address, nonce = tx.nonce, "Sending locally signed transaction");
        self.request(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(&encoded))]),
        )
        .await
    }

    pub async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    /// Poll until the transaction is mined; a failed status is an error.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt> {
        for attempt in 0..self.receipt_attempts {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                if !receipt.succeeded() {
                    warn!(tx_hash = %tx_hash, "Transaction reverted");
                    return Err(Error::Reverted {
                        tx_hash: tx_hash.to_string(),
                    });
                }
                return Ok(receipt);
            }

            if attempt + 1 < self.receipt_attempts {
                tokio::time::sleep(self.receipt_poll_interval).await;
            }
        }

        Err(Error::response(format!(
            "Transaction {} not mined after {} polls",
            tx_hash, self.receipt_attempts
        )))
    }

    /// Send and wait for the receipt.
    pub async fn transact(&self, tx: &TransactionRequest) -> Result<TransactionReceipt> {
        let tx_hash = self.send_transaction(tx).await?;
        debug!(tx_hash = %tx_hash, "Transaction sent");
        self.wait_for_receipt(tx_hash).await
    }

    /// Sign typed data as `account`.
    ///
    /// Node accounts go through `eth_signTypedData`; local keys sign the
    /// digest directly. Returns the 65-byte `r ‖ s ‖ v` signature.
    pub async fn sign_typed_data(&self, account: Address, data: &TypedData) -> Result<Bytes> {
        if let Some(signer) = self.local_signer(account) {
            let digest = data.digest(None)?;
            let signature = signer
                .sign_hash(&digest)
                .await
                .map_err(|e| Error::Signing {
                    message: format!("Failed to sign typed data: {e}"),
                })?;
            return Ok(Bytes::copy_from_slice(&signature.as_bytes()));
        }

        let signature: String = self
            .request("eth_signTypedData", json!([account, data.to_json()]))
            .await?;
        decode_hex(&signature)
    }

    /// EIP-191 personal signature over a raw 32-byte hash as `account`.
    pub async fn sign_hash_message(&self, account: Address, hash: B256) -> Result<Bytes> {
        if let Some(signer) = self.local_signer(account) {
            let signature = signer
                .sign_message(hash.as_slice())
                .await
                .map_err(|e| Error::Signing {
                    message: format!("Failed to sign message: {e}"),
                })?;
            return Ok(Bytes::copy_from_slice(&signature.as_bytes()));
        }

        let signature: String = self.request("eth_sign", json!([account, hash])).await?;
        decode_hex(&signature)
    }

    /// Advance the dev chain clock by `seconds` (`evm_increaseTime`).
    ///
    /// Takes effect on the next mined block.
    pub async fn increase_time(&self, seconds: u64) -> Result<()> {
        info!(seconds = seconds, "Increasing chain time");
        self.transport
            .request("evm_increaseTime", json!([seconds]))
            .await?;
        Ok(())
    }

    /// Mine one block on the dev chain (`evm_mine`).
    pub async fn mine(&self) -> Result<()> {
        self.transport.request("evm_mine", json!([])).await?;
        Ok(())
    }
}

fn decode_hex(value: &str) -> Result<Bytes> {
    hex::decode(value.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|e| Error::response(format!("invalid hex in RPC response: {e}")))
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose private keys in debug output
        let signers: Vec<String> = self
            .signers
            .iter()
            .map(|s| format!("{:?}", s.address()))
            .collect();
        f.debug_struct("RpcClient")
            .field("local_signers", &signers)
            .field("receipt_attempts", &self.receipt_attempts)
            .finish()
    }
}
