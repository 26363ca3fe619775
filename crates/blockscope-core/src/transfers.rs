//! Best-effort derivation of address-to-address transfers.
//!
//! Transaction graphs do not admit a unique per-address decomposition, so
//! this is a heuristic summary. Every pair of distinct (input address,
//! output address) gets one edge valued at
//! `min(inTotal(input address), outTotal(output address))`. Input totals are
//! reused across all pairs of the same input address and are never reduced
//! by earlier edges, so an input address fanning out to several outputs is
//! counted once per output. Downstream consumers compare against this exact
//! rule, so it is kept as is.

use std::collections::HashSet;

use bitcoin::Amount;

use crate::types::{EnrichedInput, Transfer, TxOutput};

/// Deduplicate addresses, keeping first-seen order so output is
/// deterministic across identical requests.
pub fn ordered_unique<'a, I>(addresses: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .filter(|addr| seen.insert(addr.as_str()))
        .cloned()
        .collect()
}

/// All addresses across resolved inputs, deduplicated.
pub fn input_addresses(inputs: &[EnrichedInput]) -> Vec<String> {
    ordered_unique(inputs.iter().flat_map(|i| i.provenance.addresses()))
}

/// All addresses across outputs, deduplicated.
pub fn output_addresses(outputs: &[TxOutput]) -> Vec<String> {
    ordered_unique(outputs.iter().flat_map(|o| o.addresses.iter()))
}

/// Derive transfers between distinct input and output addresses.
///
/// Ordering is grouped by input address then output address, both in
/// first-seen order.
pub fn derive_transfers(inputs: &[EnrichedInput], outputs: &[TxOutput]) -> Vec<Transfer> {
    let in_addrs = input_addresses(inputs);
    let out_addrs = output_addresses(outputs);

    let mut transfers = Vec::new();
    for from in &in_addrs {
        let in_total: Amount = inputs
            .iter()
            .filter(|i| i.provenance.addresses().contains(from))
            .filter_map(|i| i.provenance.value())
            .sum();

        for to in &out_addrs {
            if from == to {
                continue;
            }
            let out_total: Amount = outputs
                .iter()
                .filter(|o| o.addresses.contains(to))
                .map(|o| o.value)
                .sum();

            transfers.push(Transfer {
                from: from.clone(),
                to: to.clone(),
                value: in_total.min(out_total),
            });
        }
    }

    transfers
}
