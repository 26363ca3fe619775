use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{Amount, BlockHash, Txid};
use reqwest::header;
use tracing::{debug, trace};

use crate::error::{CoreError, RpcError};
use crate::types::{BlockHeight, BlockSummary, RawBlock, RawTransaction};

use super::super::types::{AddressValidation, ChainInfo, MempoolEntry, MempoolSummary, Utxo, UtxoScan};
use super::super::NodeRpc;
use super::connection::NodeConfig;
use super::parsing::{
    parse_block, parse_block_summary, parse_btc_amount, parse_list_unspent, parse_mempool_entry,
    parse_raw_mempool, parse_raw_transaction, parse_scan_result,
};
use super::protocol::{parse_jsonrpc_error, JsonRpcRequest, JsonRpcResponse};

/// Bitcoin Core JSON-RPC client over HTTP(S).
///
/// The underlying `reqwest` client keeps no idle connections, so every call
/// opens its own connection and releases it once the response (or error)
/// has been read. No retries and no client-side timeouts are applied.
pub struct HttpRpcClient {
    client: reqwest::Client,
    config: NodeConfig,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: NodeConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(initial_request_id()),
        })
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            "rpc call"
        );
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let mut builder = self
            .client
            .post(&self.config.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&req);
        if let Some((ref user, ref pass)) = self.config.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await.map_err(RpcError::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(RpcError::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        // Bitcoin Core answers auth failures with an empty body, so the
        // status is the only useful detail there.
        let decoded: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!(
                "decode JSON-RPC response (HTTP {status}): {e}; body={body}"
            ))
        })?;

        if let Some(err) = decoded.error.filter(|err| !err.is_null()) {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl NodeRpc for HttpRpcClient {
    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        let raw = self
            .rpc_call("getblockhash", vec![serde_json::json!(*height)])
            .await
            .map_err(|err| normalize_block_error(&format!("height {height}"), err))?;
        serde_json::from_value(raw)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid getblockhash result: {e}")))
    }

    async fn get_block(&self, hash: &BlockHash) -> Result<RawBlock, CoreError> {
        let raw = self
            .rpc_call(
                "getblock",
                vec![serde_json::json!(hash.to_string()), serde_json::json!(2)],
            )
            .await
            .map_err(|err| normalize_block_error(&format!("hash {hash}"), err))?;
        parse_block(&raw)
    }

    async fn get_block_summary(&self, hash: &BlockHash) -> Result<BlockSummary, CoreError> {
        let raw = self
            .rpc_call(
                "getblockheader",
                vec![serde_json::json!(hash.to_string()), serde_json::json!(true)],
            )
            .await
            .map_err(|err| normalize_block_error(&format!("hash {hash}"), err))?;
        parse_block_summary(&raw)
    }

    async fn get_transaction(&self, txid: &Txid) -> Result<RawTransaction, CoreError> {
        let raw = self
            .rpc_call(
                "getrawtransaction",
                vec![serde_json::json!(txid.to_string()), serde_json::json!(1)],
            )
            .await
            .map_err(|err| normalize_getrawtransaction_error(txid, err))?;
        parse_raw_transaction(&raw)
    }

    async fn get_mempool_entry(&self, txid: &Txid) -> Result<MempoolEntry, CoreError> {
        let raw = self
            .rpc_call("getmempoolentry", vec![serde_json::json!(txid.to_string())])
            .await
            .map_err(|err| match err {
                CoreError::Rpc(RpcError::ServerError { code: -5, .. }) => {
                    CoreError::NotInMempool(*txid)
                }
                other => other,
            })?;
        parse_mempool_entry(*txid, &raw)
    }

    async fn get_raw_mempool(&self) -> Result<Vec<MempoolEntry>, CoreError> {
        let raw = self
            .rpc_call("getrawmempool", vec![serde_json::json!(true)])
            .await?;
        parse_raw_mempool(&raw)
    }

    async fn get_mempool_info(&self) -> Result<MempoolSummary, CoreError> {
        let raw = self.rpc_call("getmempoolinfo", Vec::new()).await?;
        serde_json::from_value(raw)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid getmempoolinfo result: {e}")))
    }

    async fn get_blockchain_info(&self) -> Result<ChainInfo, CoreError> {
        let raw = self.rpc_call("getblockchaininfo", Vec::new()).await?;
        serde_json::from_value(raw).map_err(|e| {
            CoreError::InvalidTxData(format!("invalid getblockchaininfo result: {e}"))
        })
    }

    async fn validate_address(&self, address: &str) -> Result<AddressValidation, CoreError> {
        let raw = self
            .rpc_call("validateaddress", vec![serde_json::json!(address)])
            .await?;
        serde_json::from_value(raw)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid validateaddress result: {e}")))
    }

    async fn get_received_by_address(&self, address: &str) -> Result<Amount, CoreError> {
        let raw = self
            .rpc_call(
                "getreceivedbyaddress",
                vec![serde_json::json!(address), serde_json::json!(0)],
            )
            .await?;
        parse_btc_amount(&raw)
    }

    async fn list_unspent(&self, address: &str) -> Result<Vec<Utxo>, CoreError> {
        let raw = self
            .rpc_call(
                "listunspent",
                vec![
                    serde_json::json!(0),
                    serde_json::json!(9_999_999),
                    serde_json::json!([address]),
                ],
            )
            .await?;
        parse_list_unspent(&raw)
    }

    async fn scan_unspent_outputs(&self, address: &str) -> Result<UtxoScan, CoreError> {
        let raw = self
            .rpc_call(
                "scantxoutset",
                vec![
                    serde_json::json!("start"),
                    serde_json::json!([format!("addr({address})")]),
                ],
            )
            .await?;
        parse_scan_result(&raw)
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

// ==============================================================================
// RPC Error Normalization
// ==============================================================================

/// Convert Bitcoin Core "missing tx" JSON-RPC responses into `TxNotFound`.
///
/// Core reports an unknown txid as `-5` (`RPC_INVALID_ADDRESS_OR_KEY`) with
/// a message that depends on txindex state, so only the code is matched.
fn normalize_getrawtransaction_error(txid: &Txid, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc(RpcError::ServerError { code: -5, .. }) => CoreError::TxNotFound(*txid),
        other => other,
    }
}

/// `-8` is "Block height out of range"; `-5` is "Block not found".
fn normalize_block_error(block: &str, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc(RpcError::ServerError { code: -8 | -5, .. }) => {
            CoreError::BlockNotFound(block.to_owned())
        }
        other => other,
    }
}
