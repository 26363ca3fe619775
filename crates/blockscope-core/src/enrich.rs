//! Transaction analysis utilities.
//!
//! Provides script classification, fee/feerate computation, RBF signaling
//! detection, and locktime interpretation. Everything here is pure; the
//! node-facing resolution lives in [`crate::provenance`].

use bitcoin::{Amount, Script, SignedAmount};
use serde::{Deserialize, Serialize};

use crate::types::{EnrichedInput, RawTransaction, ScriptType};

// ==============================================================================
// Script Classification
// ==============================================================================

/// Classify a script using the `bitcoin` crate's built-in detection methods.
#[must_use]
pub fn classify_script(script: &Script) -> ScriptType {
    if script.is_p2pkh() {
        ScriptType::P2pkh
    } else if script.is_p2sh() {
        ScriptType::P2sh
    } else if script.is_p2wpkh() {
        ScriptType::P2wpkh
    } else if script.is_p2wsh() {
        ScriptType::P2wsh
    } else if script.is_p2tr() {
        ScriptType::P2tr
    } else if script.is_p2pk() {
        ScriptType::P2pk
    } else if script.is_multisig() {
        ScriptType::BareMultisig
    } else if script.is_op_return() {
        ScriptType::OpReturn
    } else {
        ScriptType::Unknown
    }
}

// ==============================================================================
// Totals, Fee and Feerate
// ==============================================================================

/// Sum of the values of all resolved inputs. Coinbase and unresolved
/// inputs contribute nothing.
#[must_use]
pub fn total_input(inputs: &[EnrichedInput]) -> Amount {
    inputs.iter().filter_map(|i| i.provenance.value()).sum()
}

/// Fee as `total_input - total_output`, exact to the satoshi.
///
/// A transaction whose first input is coinbase always reports zero. The
/// result is signed: when some inputs could not be resolved the input side
/// may be short, and the shortfall is reported rather than hidden.
#[must_use]
pub fn compute_fee(tx: &RawTransaction, total_input: Amount) -> SignedAmount {
    if tx.is_coinbase() {
        return SignedAmount::ZERO;
    }
    let total_output = tx.total_output();
    SignedAmount::from_sat(total_input.to_sat() as i64 - total_output.to_sat() as i64)
}

/// Compute the feerate in sat/vB.
#[must_use]
pub fn compute_feerate(fee: SignedAmount, vsize: u64) -> f64 {
    if vsize == 0 {
        return 0.0;
    }
    fee.to_sat() as f64 / vsize as f64
}

// ==============================================================================
// RBF and Locktime
// ==============================================================================

/// A transaction signals opt-in RBF if any input has a sequence number
/// less than `0xFFFFFFFE`.
#[must_use]
pub fn is_rbf_signaling(tx: &RawTransaction) -> bool {
    tx.inputs.iter().any(|input| input.sequence < 0xFFFFFFFE)
}

/// Decoded locktime information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocktimeInfo {
    pub raw: u32,
    pub kind: LocktimeKind,
    /// A locktime is only enforced if at least one input has a non-final
    /// sequence number.
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocktimeKind {
    Disabled,
    BlockHeight,
    Timestamp,
}

/// Interpret the locktime field of a transaction.
#[must_use]
pub fn locktime_info(tx: &RawTransaction) -> LocktimeInfo {
    let locktime = tx.locktime;
    if locktime == 0 {
        return LocktimeInfo {
            raw: 0,
            kind: LocktimeKind::Disabled,
            active: false,
        };
    }

    let kind = if locktime < 500_000_000 {
        LocktimeKind::BlockHeight
    } else {
        LocktimeKind::Timestamp
    };

    LocktimeInfo {
        raw: locktime,
        kind,
        active: tx.inputs.iter().any(|i| i.sequence < 0xFFFFFFFF),
    }
}
