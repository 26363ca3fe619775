use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{Amount, BlockHash, Txid};

use crate::error::{CoreError, RpcError};
use crate::types::{BlockHeight, BlockSummary, RawBlock, RawTransaction};

use super::types::{AddressValidation, ChainInfo, MempoolEntry, MempoolSummary, Utxo, UtxoScan};
use super::NodeRpc;

/// A mock node for testing. Returns canned data populated via the builder
/// pattern and records every call as `"<method> <arg>"`.
pub struct MockNode {
    transactions: HashMap<Txid, RawTransaction>,
    failing_txs: HashSet<Txid>,
    blocks: Vec<RawBlock>,
    block_summaries: HashMap<BlockHash, BlockSummary>,
    mempool: Vec<MempoolEntry>,
    chain_info: ChainInfo,
    /// `None` behaves like a node without a loaded wallet.
    wallet: Option<HashMap<String, (Amount, Vec<Utxo>)>>,
    scans: HashMap<String, UtxoScan>,
    invalid_addresses: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockNode {
    pub fn builder() -> MockNodeBuilder {
        MockNodeBuilder {
            node: MockNode {
                transactions: HashMap::new(),
                failing_txs: HashSet::new(),
                blocks: Vec::new(),
                block_summaries: HashMap::new(),
                mempool: Vec::new(),
                chain_info: ChainInfo {
                    chain: "regtest".into(),
                    blocks: 100,
                    best_block_hash: BlockHash::all_zeros(),
                    pruned: false,
                },
                wallet: None,
                scans: HashMap::new(),
                invalid_addresses: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            },
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    fn record(&self, method: &str, arg: impl std::fmt::Display) {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push(format!("{method} {arg}"));
    }
}

pub struct MockNodeBuilder {
    node: MockNode,
}

impl MockNodeBuilder {
    pub fn with_tx(mut self, tx: RawTransaction) -> Self {
        self.node.transactions.insert(tx.txid, tx);
        self
    }

    /// Make `getrawtransaction` for `txid` fail as if the node errored.
    pub fn failing_tx(mut self, txid: Txid) -> Self {
        self.node.failing_txs.insert(txid);
        self
    }

    pub fn with_block(mut self, block: RawBlock) -> Self {
        self.node.blocks.push(block);
        self
    }

    pub fn with_block_summary(mut self, summary: BlockSummary) -> Self {
        self.node.block_summaries.insert(summary.hash, summary);
        self
    }

    pub fn with_mempool_tx(mut self, txid: Txid, size: u64, fee_sats: u64, time: u64) -> Self {
        self.node.mempool.push(MempoolEntry {
            txid,
            size,
            fee: Amount::from_sat(fee_sats),
            time,
        });
        self
    }

    pub fn with_chain_info(mut self, info: ChainInfo) -> Self {
        self.node.chain_info = info;
        self
    }

    /// Track `address` in a wallet with the given received total and UTXOs.
    pub fn with_wallet_address(mut self, address: &str, received: Amount, utxos: Vec<Utxo>) -> Self {
        self.node
            .wallet
            .get_or_insert_with(HashMap::new)
            .insert(address.to_owned(), (received, utxos));
        self
    }

    pub fn with_scan(mut self, address: &str, scan: UtxoScan) -> Self {
        self.node.scans.insert(address.to_owned(), scan);
        self
    }

    pub fn with_invalid_address(mut self, address: &str) -> Self {
        self.node.invalid_addresses.insert(address.to_owned());
        self
    }

    pub fn build(self) -> MockNode {
        self.node
    }
}

fn no_wallet() -> CoreError {
    CoreError::Rpc(RpcError::ServerError {
        code: -18,
        message: "Requested wallet does not exist or is not loaded".into(),
    })
}

#[async_trait]
impl NodeRpc for MockNode {
    async fn get_block_hash(&self, height: BlockHeight) -> Result<BlockHash, CoreError> {
        self.record("getblockhash", height);
        self.blocks
            .iter()
            .find(|b| b.height == height)
            .map(|b| b.hash)
            .ok_or_else(|| CoreError::BlockNotFound(format!("height {height}")))
    }

    async fn get_block(&self, hash: &BlockHash) -> Result<RawBlock, CoreError> {
        self.record("getblock", hash);
        self.blocks
            .iter()
            .find(|b| b.hash == *hash)
            .cloned()
            .ok_or_else(|| CoreError::BlockNotFound(format!("hash {hash}")))
    }

    async fn get_block_summary(&self, hash: &BlockHash) -> Result<BlockSummary, CoreError> {
        self.record("getblockheader", hash);
        if let Some(summary) = self.block_summaries.get(hash) {
            return Ok(summary.clone());
        }
        self.blocks
            .iter()
            .find(|b| b.hash == *hash)
            .map(|b| BlockSummary {
                hash: b.hash,
                height: b.height,
                time: b.time,
            })
            .ok_or_else(|| CoreError::BlockNotFound(format!("hash {hash}")))
    }

    async fn get_transaction(&self, txid: &Txid) -> Result<RawTransaction, CoreError> {
        self.record("getrawtransaction", txid);
        if self.failing_txs.contains(txid) {
            return Err(CoreError::Rpc(RpcError::ServerError {
                code: -28,
                message: "Loading block index...".into(),
            }));
        }
        self.transactions
            .get(txid)
            .cloned()
            .ok_or(CoreError::TxNotFound(*txid))
    }

    async fn get_mempool_entry(&self, txid: &Txid) -> Result<MempoolEntry, CoreError> {
        self.record("getmempoolentry", txid);
        self.mempool
            .iter()
            .find(|e| e.txid == *txid)
            .cloned()
            .ok_or(CoreError::NotInMempool(*txid))
    }

    async fn get_raw_mempool(&self) -> Result<Vec<MempoolEntry>, CoreError> {
        self.record("getrawmempool", true);
        Ok(self.mempool.clone())
    }

    async fn get_mempool_info(&self) -> Result<MempoolSummary, CoreError> {
        self.record("getmempoolinfo", "");
        Ok(MempoolSummary {
            size: self.mempool.len() as u64,
            bytes: self.mempool.iter().map(|e| e.size).sum(),
            usage: self.mempool.iter().map(|e| e.size * 4).sum(),
        })
    }

    async fn get_blockchain_info(&self) -> Result<ChainInfo, CoreError> {
        self.record("getblockchaininfo", "");
        Ok(self.chain_info.clone())
    }

    async fn validate_address(&self, address: &str) -> Result<AddressValidation, CoreError> {
        self.record("validateaddress", address);
        let is_valid = !self.invalid_addresses.contains(address);
        Ok(AddressValidation {
            is_valid,
            error: (!is_valid).then(|| "Invalid address".to_owned()),
        })
    }

    async fn get_received_by_address(&self, address: &str) -> Result<Amount, CoreError> {
        self.record("getreceivedbyaddress", address);
        let wallet = self.wallet.as_ref().ok_or_else(no_wallet)?;
        wallet
            .get(address)
            .map(|(received, _)| *received)
            .ok_or_else(|| {
                CoreError::Rpc(RpcError::ServerError {
                    code: -4,
                    message: "Address not found in wallet".into(),
                })
            })
    }

    async fn list_unspent(&self, address: &str) -> Result<Vec<Utxo>, CoreError> {
        self.record("listunspent", address);
        let wallet = self.wallet.as_ref().ok_or_else(no_wallet)?;
        Ok(wallet
            .get(address)
            .map(|(_, utxos)| utxos.clone())
            .unwrap_or_default())
    }

    async fn scan_unspent_outputs(&self, address: &str) -> Result<UtxoScan, CoreError> {
        self.record("scantxoutset", address);
        Ok(self.scans.get(address).cloned().unwrap_or(UtxoScan {
            height: self.chain_info.blocks,
            total_amount: Amount::ZERO,
            unspents: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{make_block, txid_from_byte};
    use crate::types::BlockRef;

    #[tokio::test]
    async fn with_chain_info_overrides_defaults() {
        let custom_info = ChainInfo {
            chain: "main".into(),
            blocks: 800_000,
            best_block_hash: BlockHash::all_zeros(),
            pruned: true,
        };
        let rpc = MockNode::builder().with_chain_info(custom_info).build();
        let info = rpc.get_blockchain_info().await.unwrap();
        assert_eq!(info.chain, "main");
        assert_eq!(info.blocks, 800_000);
        assert!(info.pruned);
    }

    #[tokio::test]
    async fn fetch_block_by_height_resolves_hash_first() {
        let block = make_block(5, vec![]);
        let hash = block.hash;
        let rpc = MockNode::builder().with_block(block).build();

        let fetched = rpc
            .fetch_block(BlockRef::Height(BlockHeight(5)))
            .await
            .unwrap();
        assert_eq!(fetched.hash, hash);
        assert_eq!(
            rpc.calls(),
            vec!["getblockhash 5".to_owned(), format!("getblock {hash}")]
        );
    }

    #[tokio::test]
    async fn fetch_block_beyond_tip_is_not_found() {
        let rpc = MockNode::builder().with_block(make_block(1, vec![])).build();
        let err = rpc
            .fetch_block(BlockRef::Height(BlockHeight(9_999)))
            .await
            .expect_err("height beyond tip must fail");
        assert!(matches!(err, CoreError::BlockNotFound(_)));
    }

    #[tokio::test]
    async fn wallet_calls_fail_without_wallet() {
        let rpc = MockNode::builder().build();
        assert!(rpc.get_received_by_address("addr").await.is_err());
        assert!(rpc.list_unspent("addr").await.is_err());
        assert!(rpc.get_mempool_entry(&txid_from_byte(1)).await.is_err());
    }
}
