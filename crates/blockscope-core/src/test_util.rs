//! Shared test helpers for `blockscope-core` unit tests.
//!
//! Builders for node records (`make_raw_tx`, `make_block`, outputs paying to
//! named addresses) and enrichment results (`resolved`, `unresolved`) so
//! every module constructs dummy data the same way.

use bitcoin::hashes::Hash;
use bitcoin::{Amount, BlockHash, Txid};

use crate::types::{
    BlockHeight, BlockTransaction, EnrichedInput, InputProvenance, RawBlock, RawTransaction,
    ScriptSig, ScriptType, TxInput, TxOutput,
};

// ==============================================================================
// Hash Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

pub fn block_hash_from_byte(b: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    BlockHash::from_byte_array(bytes)
}

// ==============================================================================
// Transaction Builders
// ==============================================================================

/// Build an unconfirmed `RawTransaction` with sane defaults. Output indexes
/// are renumbered to match their position.
pub fn make_raw_tx(txid: Txid, inputs: Vec<TxInput>, mut outputs: Vec<TxOutput>) -> RawTransaction {
    for (n, output) in outputs.iter_mut().enumerate() {
        output.n = n as u32;
    }
    RawTransaction {
        txid,
        version: 2,
        locktime: 0,
        size: 250,
        vsize: 140,
        weight: 560,
        block_hash: None,
        confirmations: 0,
        time: None,
        inputs,
        outputs,
    }
}

/// A coinbase input (no prevout).
pub fn coinbase_input() -> TxInput {
    TxInput {
        prevout: None,
        sequence: 0xFFFFFFFF,
        script_sig: None,
    }
}

/// A spending input referencing `funding_txid:vout`.
pub fn spending_input(funding_txid: Txid, vout: u32) -> TxInput {
    TxInput {
        prevout: Some(bitcoin::OutPoint::new(funding_txid, vout)),
        sequence: 0xFFFFFFFE,
        script_sig: Some(ScriptSig::default()),
    }
}

fn p2wpkh_script() -> bitcoin::ScriptBuf {
    // OP_0 PUSH20 <20-byte-hash>
    bitcoin::ScriptBuf::from_bytes(vec![
        0x00, 0x14, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
        0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14,
    ])
}

/// A P2WPKH output paying `sats` to a single named address.
pub fn output_to(address: &str, sats: u64) -> TxOutput {
    output_to_many(&[address], sats)
}

/// An output whose script decodes to several addresses (bare multisig style).
pub fn output_to_many(addresses: &[&str], sats: u64) -> TxOutput {
    TxOutput {
        n: 0,
        value: Amount::from_sat(sats),
        addresses: addresses.iter().map(|a| (*a).to_owned()).collect(),
        script_type: ScriptType::P2wpkh,
        script_pub_key: p2wpkh_script(),
    }
}

// ==============================================================================
// Enrichment Builders
// ==============================================================================

pub fn resolved(input: TxInput, addresses: &[&str], sats: u64) -> EnrichedInput {
    EnrichedInput {
        input,
        provenance: InputProvenance::Resolved {
            value: Amount::from_sat(sats),
            addresses: addresses.iter().map(|a| (*a).to_owned()).collect(),
            script_type: ScriptType::P2wpkh,
        },
    }
}

pub fn unresolved(input: TxInput) -> EnrichedInput {
    EnrichedInput {
        input,
        provenance: InputProvenance::Unresolved {
            reason: "prior output cannot be resolved".into(),
        },
    }
}

// ==============================================================================
// Block Builders
// ==============================================================================

/// Build a block at `height` whose hash is derived from the height.
pub fn make_block(height: u32, transactions: Vec<BlockTransaction>) -> RawBlock {
    let mut bytes = [0u8; 32];
    bytes[..4].copy_from_slice(&height.to_le_bytes());
    bytes[31] = 0xb1;
    RawBlock {
        hash: BlockHash::from_byte_array(bytes),
        height: BlockHeight(height),
        time: 1_700_000_000 + u64::from(height) * 600,
        nonce: 42,
        difficulty: 4.656542373906925e-10,
        size: 285,
        weight: 1140,
        merkle_root: "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b".into(),
        transactions,
    }
}

/// A block transaction summary. `fee_sats` is `None` for a coinbase.
pub fn block_tx(txid: Txid, fee_sats: Option<u64>, total_output_sats: u64) -> BlockTransaction {
    BlockTransaction {
        txid,
        size: 250,
        vsize: 140,
        fee: fee_sats.map(Amount::from_sat),
        input_count: 1,
        output_count: 2,
        total_output: Amount::from_sat(total_output_sats),
    }
}

// ==============================================================================
// HTTP Node
// ==============================================================================

/// Bitcoin Core's answer to `getrawtransaction` for an unknown txid on a
/// node running without `-txindex`.
pub const NO_TXINDEX_MESSAGE: &str = "No such mempool transaction. Use -txindex or provide a block hash to enable blockchain transaction queries. Use gettransaction for wallet transactions.";

/// The same answer while the index is still being built.
pub const TXINDEX_SYNCING_MESSAGE: &str =
    "No such mempool transaction. Blockchain transactions are still in the process of being indexed.";

#[derive(Clone)]
pub enum NodeReply {
    Result(serde_json::Value),
    Error(i64, &'static str),
}

/// Serve JSON-RPC over plain HTTP on a loopback port and return its URL.
///
/// Replies are keyed by `(method, first param)`; anything else gets `-32601`.
/// Errors are sent with HTTP 500 like Bitcoin Core does.
pub async fn spawn_http_node(replies: Vec<(&'static str, String, NodeReply)>) -> String {
    use std::collections::HashMap;
    use std::sync::Arc;

    let replies: Arc<HashMap<(String, String), NodeReply>> = Arc::new(
        replies
            .into_iter()
            .map(|(method, param, reply)| ((method.to_owned(), param), reply))
            .collect(),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let url = format!("http://{}", listener.local_addr().expect("listener address"));

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let replies = Arc::clone(&replies);
            tokio::spawn(answer_http_request(stream, replies));
        }
    });
    url
}

async fn answer_http_request(
    mut stream: tokio::net::TcpStream,
    replies: std::sync::Arc<std::collections::HashMap<(String, String), NodeReply>>,
) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let body = loop {
        let read = stream.read(&mut chunk).await.expect("read request");
        if read == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..read]);
        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + content_length {
            break buf[body_start..body_start + content_length].to_vec();
        }
    };

    let request: serde_json::Value = serde_json::from_slice(&body).expect("JSON-RPC request");
    let method = request["method"].as_str().unwrap_or_default().to_owned();
    let param = request["params"][0].as_str().unwrap_or_default().to_owned();
    let reply = replies
        .get(&(method, param))
        .cloned()
        .unwrap_or(NodeReply::Error(-32601, "Method not found"));

    let (status, payload) = match reply {
        NodeReply::Result(result) => (
            "200 OK",
            serde_json::json!({ "result": result, "error": null, "id": request["id"] }),
        ),
        NodeReply::Error(code, message) => (
            "500 Internal Server Error",
            serde_json::json!({
                "result": null,
                "error": { "code": code, "message": message },
                "id": request["id"],
            }),
        ),
    };
    let payload = payload.to_string();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .expect("write response");
}
