//! Domain types for blockscope's transaction and block model.
//!
//! Contains the decoded node records (`RawTransaction`, `TxInput`,
//! `TxOutput`, `RawBlock`), the enrichment results (`EnrichedTransaction`,
//! `InputProvenance`, `Transfer`), and shared enums like `ScriptType` and
//! `BlockHeight`.

use std::str::FromStr;

use bitcoin::{Amount, BlockHash, OutPoint, ScriptBuf, SignedAmount, Txid};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Script Type Classification
// ==============================================================================

/// Classifies a script output type. Detection is delegated to the `bitcoin`
/// crate's `Script::is_p2pkh()`, `is_p2sh()`, etc. methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    P2pk,
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    BareMultisig,
    OpReturn,
    Unknown,
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::P2pk => write!(f, "p2pk"),
            Self::P2pkh => write!(f, "p2pkh"),
            Self::P2sh => write!(f, "p2sh"),
            Self::P2wpkh => write!(f, "p2wpkh"),
            Self::P2wsh => write!(f, "p2wsh"),
            Self::P2tr => write!(f, "p2tr"),
            Self::BareMultisig => write!(f, "bare_multisig"),
            Self::OpReturn => write!(f, "op_return"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ==============================================================================
// Block Height and Block Reference
// ==============================================================================

/// A Bitcoin block height, wrapped for type safety.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A block addressed either by height or by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Height(BlockHeight),
    Hash(BlockHash),
}

/// Why a path segment is not a usable [`BlockRef`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseBlockRefError {
    #[error("invalid block hash `{0}`")]
    Hash(String),

    #[error("invalid block height `{0}`")]
    Height(String),

    /// Well-formed height that no chain can reach.
    #[error("block height {0} is beyond the chain tip")]
    HeightOutOfRange(String),
}

impl FromStr for BlockRef {
    type Err = ParseBlockRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A block hash is always 64 hex characters; anything shorter is a height.
        if s.len() == 64 {
            return s
                .parse()
                .map(Self::Hash)
                .map_err(|_| ParseBlockRefError::Hash(s.to_owned()));
        }
        match s.parse::<u32>() {
            Ok(h) => Ok(Self::Height(BlockHeight(h))),
            Err(_) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                Err(ParseBlockRefError::HeightOutOfRange(s.to_owned()))
            }
            Err(_) => Err(ParseBlockRefError::Height(s.to_owned())),
        }
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Height(h) => write!(f, "height {h}"),
            Self::Hash(hash) => write!(f, "hash {hash}"),
        }
    }
}

// ==============================================================================
// Raw Transaction Types
// ==============================================================================

/// A transaction as decoded by the node (`getrawtransaction <txid> 1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: Txid,
    pub version: i32,
    pub locktime: u32,
    pub size: u64,
    pub vsize: u64,
    pub weight: u64,
    /// Containing block; `None` for unconfirmed (mempool) transactions.
    pub block_hash: Option<BlockHash>,
    pub confirmations: u64,
    pub time: Option<u64>,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl RawTransaction {
    /// Coinbase status is decided by the first input alone.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.first().is_some_and(TxInput::is_coinbase)
    }

    pub fn total_output(&self) -> Amount {
        self.outputs.iter().map(|o| o.value).sum()
    }
}

/// A transaction input. For coinbase inputs, `prevout` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: Option<OutPoint>,
    pub sequence: u32,
    pub script_sig: Option<ScriptSig>,
}

impl TxInput {
    pub fn is_coinbase(&self) -> bool {
        self.prevout.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSig {
    pub asm: String,
    pub hex: String,
}

/// A transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub n: u32,
    pub value: Amount,
    /// Addresses decoded by the node. Empty for unspendable or
    /// non-standard scripts.
    pub addresses: Vec<String>,
    pub script_type: ScriptType,
    pub script_pub_key: ScriptBuf,
}

// ==============================================================================
// Blocks
// ==============================================================================

/// A block as decoded by `getblock <hash> 2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    pub hash: BlockHash,
    pub height: BlockHeight,
    pub time: u64,
    pub nonce: u32,
    pub difficulty: f64,
    pub size: u64,
    pub weight: u64,
    pub merkle_root: String,
    pub transactions: Vec<BlockTransaction>,
}

/// Per-transaction data embedded in a verbose block. `fee` is reported by
/// the node only for non-coinbase transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockTransaction {
    pub txid: Txid,
    pub size: u64,
    pub vsize: u64,
    pub fee: Option<Amount>,
    pub input_count: usize,
    pub output_count: usize,
    pub total_output: Amount,
}

/// Header-level summary of a block, attached to confirmed transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub hash: BlockHash,
    pub height: BlockHeight,
    pub time: u64,
}

// ==============================================================================
// Enrichment Results
// ==============================================================================

/// Where an input's value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputProvenance {
    /// Newly issued value; no prior output exists.
    Coinbase,
    /// The spent output was found in the prior transaction.
    Resolved {
        value: Amount,
        addresses: Vec<String>,
        script_type: ScriptType,
    },
    /// The prior transaction or output index could not be resolved.
    Unresolved { reason: String },
}

impl InputProvenance {
    pub fn value(&self) -> Option<Amount> {
        match self {
            Self::Resolved { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn addresses(&self) -> &[String] {
        match self {
            Self::Resolved { addresses, .. } => addresses,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedInput {
    pub input: TxInput,
    pub provenance: InputProvenance,
}

/// A derived (not ledger-exact) value edge between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub value: Amount,
}

/// A raw transaction plus everything derived from dereferencing its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedTransaction {
    pub tx: RawTransaction,
    pub inputs: Vec<EnrichedInput>,
    pub total_input: Amount,
    pub total_output: Amount,
    /// Signed because unresolved inputs can leave the input side short.
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub fee: SignedAmount,
    pub in_mempool: bool,
    pub block: Option<BlockSummary>,
    pub input_addresses: Vec<String>,
    pub output_addresses: Vec<String>,
    pub transfers: Vec<Transfer>,
}

impl EnrichedTransaction {
    pub fn is_coinbase(&self) -> bool {
        self.tx.is_coinbase()
    }
}
