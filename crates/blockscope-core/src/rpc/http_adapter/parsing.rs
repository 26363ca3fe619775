use bitcoin::{Amount, BlockHash, OutPoint, ScriptBuf, Txid};

use crate::enrich::classify_script;
use crate::error::CoreError;
use crate::rpc::types::{MempoolEntry, Utxo, UtxoScan};
use crate::types::{
    BlockHeight, BlockSummary, BlockTransaction, RawBlock, RawTransaction, ScriptSig, TxInput,
    TxOutput,
};

// ==============================================================================
// Transactions
// ==============================================================================

pub(super) fn parse_raw_transaction(raw: &serde_json::Value) -> Result<RawTransaction, CoreError> {
    let txid = parse_txid(raw.get("txid"), "txid")?;
    let version = parse_integer_required::<i32, true>(raw.get("version"), "version")?;
    let locktime = parse_integer_required::<u32, false>(raw.get("locktime"), "locktime")?;
    let size = parse_integer_required::<u64, false>(raw.get("size"), "size")?;
    let vsize = parse_integer_optional::<u64, false>(raw.get("vsize")).unwrap_or(size);
    let weight = parse_integer_optional::<u64, false>(raw.get("weight")).unwrap_or(size * 4);
    let block_hash = parse_opt_block_hash(raw.get("blockhash"))?;
    let confirmations = parse_integer_optional::<u64, false>(raw.get("confirmations")).unwrap_or(0);
    let time = parse_integer_optional::<u64, false>(raw.get("time"));

    let (vin, vout) = vin_vout(raw)?;

    Ok(RawTransaction {
        txid,
        version,
        locktime,
        size,
        vsize,
        weight,
        block_hash,
        confirmations,
        time,
        inputs: parse_vin(vin)?,
        outputs: parse_vout(vout)?,
    })
}

fn vin_vout(
    raw: &serde_json::Value,
) -> Result<(&[serde_json::Value], &[serde_json::Value]), CoreError> {
    let vin = raw
        .get("vin")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing vin array".into()))?;
    let vout = raw
        .get("vout")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing vout array".into()))?;
    Ok((vin, vout))
}

pub(super) fn parse_vin(vin: &[serde_json::Value]) -> Result<Vec<TxInput>, CoreError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;
            let is_coinbase = input.get("coinbase").is_some();

            let prevout = if is_coinbase {
                None
            } else {
                let prev_txid = parse_txid(input.get("txid"), "vin.txid")?;
                let prev_vout =
                    parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;
                Some(OutPoint::new(prev_txid, prev_vout))
            };

            let script_sig = input.get("scriptSig").map(|sig| ScriptSig {
                asm: string_field(sig, "asm"),
                hex: string_field(sig, "hex"),
            });

            Ok(TxInput {
                prevout,
                sequence,
                script_sig,
            })
        })
        .collect()
}

pub(super) fn parse_vout(vout: &[serde_json::Value]) -> Result<Vec<TxOutput>, CoreError> {
    vout.iter()
        .enumerate()
        .map(|(position, output)| {
            let value = parse_btc_amount(
                output
                    .get("value")
                    .ok_or_else(|| CoreError::InvalidTxData("missing value in vout".into()))?,
            )?;
            let n = parse_integer_optional::<u32, false>(output.get("n"))
                .unwrap_or(position as u32);

            let spk = output
                .get("scriptPubKey")
                .ok_or_else(|| CoreError::InvalidTxData("missing scriptPubKey in vout".into()))?;
            let script = parse_script_pubkey_from_json(spk)?;
            let script_type = classify_script(script.as_script());

            Ok(TxOutput {
                n,
                value,
                addresses: parse_addresses(spk),
                script_type,
                script_pub_key: script,
            })
        })
        .collect()
}

/// Addresses decoded by the node. Current Bitcoin Core reports a single
/// `address`; releases before 22.0 report an `addresses` array.
fn parse_addresses(spk: &serde_json::Value) -> Vec<String> {
    if let Some(address) = spk.get("address").and_then(serde_json::Value::as_str) {
        return vec![address.to_owned()];
    }
    spk.get("addresses")
        .and_then(serde_json::Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

// ==============================================================================
// Blocks
// ==============================================================================

pub(super) fn parse_block(raw: &serde_json::Value) -> Result<RawBlock, CoreError> {
    let hash = parse_block_hash(raw.get("hash"), "hash")?;
    let height = parse_integer_required::<u32, false>(raw.get("height"), "height")?;
    let time = parse_integer_required::<u64, false>(raw.get("time"), "time")?;
    let nonce = parse_integer_optional::<u32, false>(raw.get("nonce")).unwrap_or(0);
    let difficulty = raw
        .get("difficulty")
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(0.0);
    let size = parse_integer_optional::<u64, false>(raw.get("size")).unwrap_or(0);
    let weight = parse_integer_optional::<u64, false>(raw.get("weight")).unwrap_or(0);
    let merkle_root = string_field(raw, "merkleroot");

    let txs = raw
        .get("tx")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing tx array in block".into()))?;
    let transactions = txs
        .iter()
        .map(parse_block_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawBlock {
        hash,
        height: BlockHeight(height),
        time,
        nonce,
        difficulty,
        size,
        weight,
        merkle_root,
        transactions,
    })
}

fn parse_block_transaction(raw: &serde_json::Value) -> Result<BlockTransaction, CoreError> {
    let txid = parse_txid(raw.get("txid"), "tx.txid")?;
    let size = parse_integer_optional::<u64, false>(raw.get("size")).unwrap_or(0);
    let vsize = parse_integer_optional::<u64, false>(raw.get("vsize")).unwrap_or(size);
    let fee = raw.get("fee").map(parse_btc_amount).transpose()?;
    let (vin, vout) = vin_vout(raw)?;

    let total_output = vout
        .iter()
        .map(|output| output.get("value").map_or(Ok(Amount::ZERO), parse_btc_amount))
        .sum::<Result<Amount, CoreError>>()?;

    Ok(BlockTransaction {
        txid,
        size,
        vsize,
        fee,
        input_count: vin.len(),
        output_count: vout.len(),
        total_output,
    })
}

pub(super) fn parse_block_summary(raw: &serde_json::Value) -> Result<BlockSummary, CoreError> {
    Ok(BlockSummary {
        hash: parse_block_hash(raw.get("hash"), "hash")?,
        height: BlockHeight(parse_integer_required::<u32, false>(
            raw.get("height"),
            "height",
        )?),
        time: parse_integer_required::<u64, false>(raw.get("time"), "time")?,
    })
}

// ==============================================================================
// Mempool
// ==============================================================================

/// Parse one mempool record. Newer nodes report `vsize` and `fees.base`;
/// older ones report `size` and `fee`. Missing fields default to zero.
pub(super) fn parse_mempool_entry(
    txid: Txid,
    raw: &serde_json::Value,
) -> Result<MempoolEntry, CoreError> {
    let size = parse_integer_optional::<u64, false>(raw.get("size"))
        .or_else(|| parse_integer_optional::<u64, false>(raw.get("vsize")))
        .unwrap_or(0);
    let fee = raw
        .get("fee")
        .or_else(|| raw.get("fees").and_then(|fees| fees.get("base")))
        .map(parse_btc_amount)
        .transpose()?
        .unwrap_or(Amount::ZERO);
    let time = parse_integer_optional::<u64, false>(raw.get("time")).unwrap_or(0);

    Ok(MempoolEntry {
        txid,
        size,
        fee,
        time,
    })
}

pub(super) fn parse_raw_mempool(raw: &serde_json::Value) -> Result<Vec<MempoolEntry>, CoreError> {
    let entries = raw
        .as_object()
        .ok_or_else(|| CoreError::InvalidTxData("getrawmempool result is not an object".into()))?;
    entries
        .iter()
        .map(|(txid, entry)| {
            let txid: Txid = txid
                .parse()
                .map_err(|e| CoreError::InvalidTxData(format!("invalid mempool txid: {e}")))?;
            parse_mempool_entry(txid, entry)
        })
        .collect()
}

// ==============================================================================
// UTXOs
// ==============================================================================

pub(super) fn parse_list_unspent(raw: &serde_json::Value) -> Result<Vec<Utxo>, CoreError> {
    let entries = raw
        .as_array()
        .ok_or_else(|| CoreError::InvalidTxData("listunspent result is not an array".into()))?;
    entries
        .iter()
        .map(|entry| {
            Ok(Utxo {
                txid: parse_txid(entry.get("txid"), "listunspent.txid")?,
                vout: parse_integer_required::<u32, false>(entry.get("vout"), "listunspent.vout")?,
                amount: parse_btc_amount(entry.get("amount").ok_or_else(|| {
                    CoreError::InvalidTxData("missing amount in listunspent".into())
                })?)?,
                confirmations: parse_integer_optional::<u64, false>(entry.get("confirmations"))
                    .unwrap_or(0),
                height: None,
            })
        })
        .collect()
}

/// Parse a `scantxoutset start` result. Confirmations are derived from the
/// scan height, since the scan reports only the height each output was
/// created at.
pub(super) fn parse_scan_result(raw: &serde_json::Value) -> Result<UtxoScan, CoreError> {
    let height = parse_integer_optional::<u64, false>(raw.get("height")).unwrap_or(0);
    let total_amount = raw
        .get("total_amount")
        .map(parse_btc_amount)
        .transpose()?
        .unwrap_or(Amount::ZERO);
    let unspents = raw
        .get("unspents")
        .and_then(serde_json::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let utxo_height = parse_integer_optional::<u32, false>(entry.get("height"));
            let confirmations = match utxo_height {
                Some(h) if u64::from(h) <= height && h > 0 => height - u64::from(h) + 1,
                _ => 0,
            };
            Ok(Utxo {
                txid: parse_txid(entry.get("txid"), "scantxoutset.txid")?,
                vout: parse_integer_required::<u32, false>(entry.get("vout"), "scantxoutset.vout")?,
                amount: parse_btc_amount(entry.get("amount").ok_or_else(|| {
                    CoreError::InvalidTxData("missing amount in scantxoutset".into())
                })?)?,
                confirmations,
                height: utxo_height,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(UtxoScan {
        height,
        total_amount,
        unspents,
    })
}

// ==============================================================================
// Scalar Helpers
// ==============================================================================

pub(super) fn parse_txid(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Txid, CoreError> {
    let value = value
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| CoreError::InvalidTxData(format!("invalid {field}: {e}")))
}

pub(super) fn parse_block_hash(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<BlockHash, CoreError> {
    parse_opt_block_hash(value)?.ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))
}

pub(super) fn parse_opt_block_hash(
    value: Option<&serde_json::Value>,
) -> Result<Option<BlockHash>, CoreError> {
    match value.and_then(serde_json::Value::as_str) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid blockhash: {e}"))),
    }
}

pub(super) fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<T, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))
}

pub(super) fn parse_integer_optional<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// `REQUIRED=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(CoreError::InvalidTxData(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {n}")))
    }
}

fn string_field(value: &serde_json::Value, field: &str) -> String {
    value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn parse_script_pubkey_from_json(spk: &serde_json::Value) -> Result<ScriptBuf, CoreError> {
    let hex_str = spk
        .get("hex")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData("missing hex in scriptPubKey".into()))?;
    ScriptBuf::from_hex(hex_str)
        .map_err(|e| CoreError::InvalidTxData(format!("invalid scriptPubKey hex: {e}")))
}

/// Parse a BTC amount from a JSON value.
///
/// Number values are parsed via `Amount::from_float_in` to support scientific
/// notation, while string values are parsed via `Amount::from_str_in`.
pub(super) fn parse_btc_amount(value: &serde_json::Value) -> Result<Amount, CoreError> {
    match value {
        serde_json::Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| CoreError::InvalidTxData(format!("invalid BTC amount `{value}`")))?;
            Amount::from_float_in(parsed, bitcoin::Denomination::Bitcoin)
                .map_err(|e| CoreError::InvalidTxData(format!("invalid BTC amount `{value}`: {e}")))
        }
        serde_json::Value::String(s) => Amount::from_str_in(s, bitcoin::Denomination::Bitcoin)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid BTC amount `{s}`: {e}"))),
        _ => Err(CoreError::InvalidTxData(format!(
            "expected numeric BTC amount, got: {value}"
        ))),
    }
}
