use std::collections::HashMap;

use bitcoin::{OutPoint, Txid};
use tracing::debug;

use crate::enrich::{compute_fee, total_input};
use crate::error::CoreError;
use crate::rpc::NodeRpc;
use crate::transfers::{derive_transfers, input_addresses, output_addresses};
use crate::types::{EnrichedInput, EnrichedTransaction, InputProvenance, RawTransaction, TxOutput};

// ==============================================================================
// Transaction Enricher
// ==============================================================================

/// Fetch a transaction and resolve everything the node does not report
/// directly: each input's spent value and owners, the totals, the fee, the
/// mempool flag, the containing block, and the derived transfers.
///
/// The calls form one sequential chain against the node. Prior transactions
/// are fetched at most once within the call and forgotten afterwards.
///
/// A prior output that cannot be found only marks that input unresolved;
/// transport and node errors still fail the whole enrichment.
pub async fn enrich_transaction(
    rpc: &dyn NodeRpc,
    txid: Txid,
) -> Result<EnrichedTransaction, CoreError> {
    let tx = rpc.get_transaction(&txid).await?;

    let in_mempool = match rpc.get_mempool_entry(&txid).await {
        Ok(_) => true,
        Err(CoreError::NotInMempool(_)) => false,
        Err(err) => return Err(err),
    };

    let inputs = resolve_inputs(rpc, &tx).await?;
    let total_input = total_input(&inputs);
    let total_output = tx.total_output();
    let fee = compute_fee(&tx, total_input);

    let block = match tx.block_hash {
        Some(hash) => Some(rpc.get_block_summary(&hash).await?),
        None => None,
    };

    let transfers = derive_transfers(&inputs, &tx.outputs);
    let input_addresses = input_addresses(&inputs);
    let output_addresses = output_addresses(&tx.outputs);

    debug!(
        %txid,
        inputs = inputs.len(),
        unresolved = inputs
            .iter()
            .filter(|i| matches!(i.provenance, InputProvenance::Unresolved { .. }))
            .count(),
        transfers = transfers.len(),
        in_mempool,
        "enriched transaction"
    );

    Ok(EnrichedTransaction {
        tx,
        inputs,
        total_input,
        total_output,
        fee,
        in_mempool,
        block,
        input_addresses,
        output_addresses,
        transfers,
    })
}

async fn resolve_inputs(
    rpc: &dyn NodeRpc,
    tx: &RawTransaction,
) -> Result<Vec<EnrichedInput>, CoreError> {
    // `None` marks a prior transaction the node does not know.
    let mut prior_txs: HashMap<Txid, Option<RawTransaction>> = HashMap::new();
    let mut inputs = Vec::with_capacity(tx.inputs.len());

    for input in &tx.inputs {
        let provenance = match input.prevout {
            None => InputProvenance::Coinbase,
            Some(outpoint) => match resolve_prevout(rpc, &mut prior_txs, outpoint).await {
                Ok(output) => InputProvenance::Resolved {
                    value: output.value,
                    addresses: output.addresses.clone(),
                    script_type: output.script_type,
                },
                Err(err @ CoreError::DanglingReference { .. }) => {
                    debug!(
                        spending_txid = %tx.txid,
                        %outpoint,
                        "prior output unresolved"
                    );
                    InputProvenance::Unresolved {
                        reason: err.to_string(),
                    }
                }
                Err(err) => return Err(err),
            },
        };

        inputs.push(EnrichedInput {
            input: input.clone(),
            provenance,
        });
    }

    Ok(inputs)
}

/// Dereference `outpoint` into the output it spends. Fails with
/// `DanglingReference` when the prior transaction is unknown or has no
/// output at that index.
async fn resolve_prevout<'a>(
    rpc: &dyn NodeRpc,
    prior_txs: &'a mut HashMap<Txid, Option<RawTransaction>>,
    outpoint: OutPoint,
) -> Result<&'a TxOutput, CoreError> {
    if !prior_txs.contains_key(&outpoint.txid) {
        let fetched = match rpc.get_transaction(&outpoint.txid).await {
            Ok(prior) => Some(prior),
            Err(CoreError::TxNotFound(_)) => None,
            Err(err) => return Err(err),
        };
        prior_txs.insert(outpoint.txid, fetched);
    }

    prior_txs
        .get(&outpoint.txid)
        .and_then(Option::as_ref)
        .and_then(|prior| prior.outputs.get(outpoint.vout as usize))
        .ok_or(CoreError::DanglingReference {
            txid: outpoint.txid,
            vout: outpoint.vout,
        })
}
