//! Bitcoin Core RPC abstraction layer.
//!
//! Defines the [`NodeRpc`] trait and provides an HTTP JSON-RPC
//! implementation ([`HttpRpcClient`]) plus a test mock (`mock::MockNode`).

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::{HttpRpcClient, NodeConfig};
pub use types::{AddressValidation, ChainInfo, MempoolEntry, MempoolSummary, Utxo, UtxoScan};

use async_trait::async_trait;
use bitcoin::{Amount, BlockHash, Txid};

use crate::error::CoreError;
use crate::types::{BlockHeight, BlockRef, BlockSummary, RawBlock, RawTransaction};

/// The node operations blockscope reads from.
///
/// Each method performs exactly one logical node operation. Implementations
/// handle authentication, connection management, and response decoding
/// internally, and must not retry.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Resolve a height on the active chain to its block hash.
    /// Fails with `BlockNotFound` beyond the tip.
    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError>;

    /// Fetch a block with fully decoded transactions.
    async fn get_block(&self, hash: &BlockHash) -> Result<RawBlock, CoreError>;

    /// Fetch the hash/height/time summary of a block.
    async fn get_block_summary(&self, hash: &BlockHash) -> Result<BlockSummary, CoreError>;

    /// Fetch a decoded transaction by txid. Fails with `TxNotFound`.
    async fn get_transaction(&self, txid: &Txid) -> Result<RawTransaction, CoreError>;

    /// Fetch a transaction's mempool record. Fails with `NotInMempool`.
    async fn get_mempool_entry(&self, txid: &Txid) -> Result<MempoolEntry, CoreError>;

    /// Fetch every mempool record.
    async fn get_raw_mempool(&self) -> Result<Vec<MempoolEntry>, CoreError>;

    async fn get_mempool_info(&self) -> Result<MempoolSummary, CoreError>;

    /// Fetch basic chain info (network, block count, pruning status).
    async fn get_blockchain_info(&self) -> Result<ChainInfo, CoreError>;

    async fn validate_address(&self, address: &str) -> Result<AddressValidation, CoreError>;

    /// Total received by a wallet-tracked address, including unconfirmed.
    async fn get_received_by_address(&self, address: &str) -> Result<Amount, CoreError>;

    /// Wallet-tracked unspent outputs of an address.
    async fn list_unspent(&self, address: &str) -> Result<Vec<Utxo>, CoreError>;

    /// Scan the full UTXO set for outputs matching the address descriptor.
    /// Works without a wallet.
    async fn scan_unspent_outputs(&self, address: &str) -> Result<UtxoScan, CoreError>;

    /// Fetch a block by height or hash.
    async fn fetch_block(&self, block: BlockRef) -> Result<RawBlock, CoreError> {
        let hash = match block {
            BlockRef::Hash(hash) => hash,
            BlockRef::Height(height) => self.get_block_hash(height).await?,
        };
        self.get_block(&hash).await
    }
}
