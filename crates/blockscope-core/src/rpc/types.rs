//! RPC-specific types that do not belong to the shared domain model.
//!
//! Decoded transactions and blocks are represented directly as
//! [`RawTransaction`](crate::types::RawTransaction) /
//! [`RawBlock`](crate::types::RawBlock); this module only defines structures
//! specific to chain, mempool, and wallet/UTXO methods.

use bitcoin::{Amount, BlockHash, Txid};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Chain Info
// ==============================================================================

/// Basic chain information from `getblockchaininfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainInfo {
    pub chain: String,
    pub blocks: u64,
    #[serde(rename = "bestblockhash")]
    pub best_block_hash: BlockHash,
    #[serde(default)]
    pub pruned: bool,
}

// ==============================================================================
// Mempool
// ==============================================================================

/// Aggregate mempool state from `getmempoolinfo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MempoolSummary {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub usage: u64,
}

/// One transaction's mempool record (`getmempoolentry` or a value of
/// `getrawmempool true`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolEntry {
    pub txid: Txid,
    pub size: u64,
    pub fee: Amount,
    pub time: u64,
}

// ==============================================================================
// Addresses and UTXOs
// ==============================================================================

/// Result of `validateaddress`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressValidation {
    #[serde(rename = "isvalid")]
    pub is_valid: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// An unspent output owned by an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub amount: Amount,
    pub confirmations: u64,
    /// Known for UTXO-set scans; wallet listings only report confirmations.
    pub height: Option<u32>,
}

/// Result of `scantxoutset start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoScan {
    /// Chain height at which the scan was taken.
    pub height: u64,
    pub total_amount: Amount,
    pub unspents: Vec<Utxo>,
}
