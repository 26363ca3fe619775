//! Response views.
//!
//! Pure mappings from node records and enrichment results into the JSON
//! shapes served over HTTP. Amounts leave the domain model as exact
//! satoshis and are rendered here as BTC numbers. Missing node fields have
//! already been defaulted by the parser, so every mapping is total.

use bitcoin::{Network, Txid};
use serde::Serialize;

use crate::balance::{AddressBalance, BalanceSource};
use crate::enrich::{compute_feerate, is_rbf_signaling, locktime_info, LocktimeInfo};
use crate::rpc::{ChainInfo, MempoolEntry, MempoolSummary, Utxo};
use crate::types::{
    BlockSummary, BlockTransaction, EnrichedInput, EnrichedTransaction, InputProvenance, RawBlock,
    ScriptSig, Transfer, TxOutput,
};

// ==============================================================================
// Health and Network
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthView {
    pub status: String,
    pub message: String,
    pub chain: String,
    pub blocks: u64,
}

pub fn health_view(info: &ChainInfo) -> HealthView {
    HealthView {
        status: "ok".into(),
        message: "Connected to Bitcoin node".into(),
        chain: info.chain.clone(),
        blocks: info.blocks,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkView {
    pub network_name: String,
    pub is_testnet: bool,
    pub last_block: u64,
    pub mempool_size: u64,
}

/// Every chain other than `main` (test, signet, regtest) counts as a test
/// network.
pub fn network_view(info: &ChainInfo, mempool: &MempoolSummary) -> NetworkView {
    NetworkView {
        network_name: info.chain.clone(),
        is_testnet: info.chain != "main",
        last_block: info.blocks,
        mempool_size: mempool.size,
    }
}

// ==============================================================================
// Blocks
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub height: u32,
    pub hash: String,
    pub time: u64,
    pub nonce: u32,
    pub difficulty: f64,
    pub num_transactions: usize,
    pub size: u64,
    pub weight: u64,
    pub merkle_root: String,
    pub transactions: Vec<BlockTransactionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockTransactionView {
    pub txid: Txid,
    pub size: u64,
    pub vsize: u64,
    pub fee: f64,
    pub input_count: usize,
    pub output_count: usize,
    pub total_output: f64,
}

pub fn block_view(block: &RawBlock) -> BlockView {
    BlockView {
        height: block.height.0,
        hash: block.hash.to_string(),
        time: block.time,
        nonce: block.nonce,
        difficulty: block.difficulty,
        num_transactions: block.transactions.len(),
        size: block.size,
        weight: block.weight,
        merkle_root: block.merkle_root.clone(),
        transactions: block.transactions.iter().map(block_transaction_view).collect(),
    }
}

fn block_transaction_view(tx: &BlockTransaction) -> BlockTransactionView {
    BlockTransactionView {
        txid: tx.txid,
        size: tx.size,
        vsize: tx.vsize,
        fee: tx.fee.map(|fee| fee.to_btc()).unwrap_or(0.0),
        input_count: tx.input_count,
        output_count: tx.output_count,
        total_output: tx.total_output.to_btc(),
    }
}

// ==============================================================================
// Transactions
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    pub txid: Txid,
    pub size: u64,
    pub vsize: u64,
    pub weight: u64,
    pub fee: f64,
    /// sat/vB.
    pub fee_rate: f64,
    pub total_input: f64,
    pub total_output: f64,
    pub confirmations: u64,
    pub time: Option<u64>,
    pub in_mempool: bool,
    pub input_count: usize,
    pub output_count: usize,
    pub rbf_signaling: bool,
    pub locktime: LocktimeInfo,
    pub inputs: Vec<InputView>,
    pub outputs: Vec<OutputView>,
    pub transfers: Vec<TransferView>,
    pub input_addresses: Vec<String>,
    pub output_addresses: Vec<String>,
    pub block: Option<BlockSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputView {
    /// `None` for a coinbase input.
    pub txid: Option<Txid>,
    pub vout: Option<u32>,
    pub sequence: u32,
    pub addresses: Vec<String>,
    pub value: f64,
    /// `coinbase`, the spent script's type, or `unresolved`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "scriptSig", skip_serializing_if = "Option::is_none")]
    pub script_sig: Option<ScriptSig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputView {
    pub value: f64,
    pub n: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub addresses: Vec<String>,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferView {
    pub from: String,
    pub to: String,
    pub value: f64,
}

pub fn transaction_view(enriched: &EnrichedTransaction) -> TransactionView {
    let tx = &enriched.tx;
    TransactionView {
        txid: tx.txid,
        size: tx.size,
        vsize: tx.vsize,
        weight: tx.weight,
        fee: enriched.fee.to_btc(),
        fee_rate: compute_feerate(enriched.fee, tx.vsize),
        total_input: enriched.total_input.to_btc(),
        total_output: enriched.total_output.to_btc(),
        confirmations: tx.confirmations,
        time: tx.time,
        in_mempool: enriched.in_mempool,
        input_count: tx.inputs.len(),
        output_count: tx.outputs.len(),
        rbf_signaling: is_rbf_signaling(tx),
        locktime: locktime_info(tx),
        inputs: enriched.inputs.iter().map(input_view).collect(),
        outputs: tx.outputs.iter().map(output_view).collect(),
        transfers: enriched.transfers.iter().map(transfer_view).collect(),
        input_addresses: enriched.input_addresses.clone(),
        output_addresses: enriched.output_addresses.clone(),
        block: enriched.block.clone(),
    }
}

fn input_view(enriched: &EnrichedInput) -> InputView {
    let input = &enriched.input;
    let (kind, value, unresolved_reason) = match &enriched.provenance {
        InputProvenance::Coinbase => ("coinbase".to_owned(), 0.0, None),
        InputProvenance::Resolved {
            value, script_type, ..
        } => (script_type.to_string(), value.to_btc(), None),
        InputProvenance::Unresolved { reason } => {
            ("unresolved".to_owned(), 0.0, Some(reason.clone()))
        }
    };

    InputView {
        txid: input.prevout.map(|p| p.txid),
        vout: input.prevout.map(|p| p.vout),
        sequence: input.sequence,
        addresses: enriched.provenance.addresses().to_vec(),
        value,
        kind,
        script_sig: input.script_sig.clone(),
        unresolved_reason,
    }
}

fn output_view(output: &TxOutput) -> OutputView {
    OutputView {
        value: output.value.to_btc(),
        n: output.n,
        kind: output.script_type.to_string(),
        addresses: output.addresses.clone(),
        script_pub_key: format!("{:x}", output.script_pub_key.as_script()),
    }
}

fn transfer_view(transfer: &Transfer) -> TransferView {
    TransferView {
        from: transfer.from.clone(),
        to: transfer.to.clone(),
        value: transfer.value.to_btc(),
    }
}

// ==============================================================================
// Balance
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceView {
    pub address: String,
    pub network: String,
    pub balance: f64,
    pub source: BalanceSource,
    pub unspent_count: usize,
    pub unspent_outputs: Vec<UtxoView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtxoView {
    pub txid: Txid,
    pub vout: u32,
    pub amount: f64,
    pub confirmations: u64,
    pub height: Option<u32>,
}

pub fn balance_view(balance: &AddressBalance, network: Network) -> BalanceView {
    BalanceView {
        address: balance.address.clone(),
        network: network.to_string(),
        balance: balance.balance.to_btc(),
        source: balance.source,
        unspent_count: balance.unspents.len(),
        unspent_outputs: balance.unspents.iter().map(utxo_view).collect(),
    }
}

fn utxo_view(utxo: &Utxo) -> UtxoView {
    UtxoView {
        txid: utxo.txid,
        vout: utxo.vout,
        amount: utxo.amount.to_btc(),
        confirmations: utxo.confirmations,
        height: utxo.height,
    }
}

// ==============================================================================
// Mempool
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MempoolView {
    pub size: u64,
    pub bytes: u64,
    pub usage: u64,
    pub transactions: Vec<MempoolTransactionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MempoolTransactionView {
    pub txid: Txid,
    pub size: u64,
    pub fee: f64,
    pub time: u64,
}

/// Newest entries first; ties broken by txid so the order is stable.
pub fn mempool_view(summary: &MempoolSummary, entries: &[MempoolEntry]) -> MempoolView {
    let mut sorted: Vec<&MempoolEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.txid.cmp(&b.txid)));

    MempoolView {
        size: summary.size,
        bytes: summary.bytes,
        usage: summary.usage,
        transactions: sorted
            .into_iter()
            .map(|e| MempoolTransactionView {
                txid: e.txid,
                size: e.size,
                fee: e.fee.to_btc(),
                time: e.time,
            })
            .collect(),
    }
}
