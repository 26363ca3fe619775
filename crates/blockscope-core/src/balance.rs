//! Best-effort address balance.
//!
//! Prefers the node wallet's view of the address (received total plus its
//! unspent outputs). Nodes without a wallet, or wallets that do not track
//! the address, fall back to a full UTXO-set scan. An untracked address and
//! an address with zero balance are reported the same way.

use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Amount, Network};
use serde::Serialize;
use tracing::debug;

use crate::error::CoreError;
use crate::rpc::{NodeRpc, Utxo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    Wallet,
    UtxoScan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBalance {
    pub address: String,
    pub balance: Amount,
    pub source: BalanceSource,
    pub unspents: Vec<Utxo>,
}

/// Look up the balance of `address` on `network`.
///
/// Fails with `InvalidAddress` before any scan is attempted when the address
/// does not parse, belongs to another network, or the node rejects it.
pub async fn lookup_balance(
    rpc: &dyn NodeRpc,
    address: &str,
    network: Network,
) -> Result<AddressBalance, CoreError> {
    check_syntax(address, network)?;

    let validation = rpc.validate_address(address).await?;
    if !validation.is_valid {
        return Err(CoreError::InvalidAddress(
            validation
                .error
                .unwrap_or_else(|| format!("node rejected address {address}")),
        ));
    }

    match wallet_balance(rpc, address).await {
        Ok(balance) => Ok(balance),
        Err(err) => {
            debug!(%address, error = %err, "wallet lookup failed, scanning UTXO set");
            scan_balance(rpc, address).await
        }
    }
}

fn check_syntax(address: &str, network: Network) -> Result<(), CoreError> {
    let parsed: Address<NetworkUnchecked> = address
        .parse()
        .map_err(|e| CoreError::InvalidAddress(format!("{address}: {e}")))?;
    if !parsed.is_valid_for_network(network) {
        return Err(CoreError::InvalidAddress(format!(
            "{address} is not a {network} address"
        )));
    }
    Ok(())
}

async fn wallet_balance(rpc: &dyn NodeRpc, address: &str) -> Result<AddressBalance, CoreError> {
    let balance = rpc.get_received_by_address(address).await?;
    let unspents = rpc.list_unspent(address).await?;
    Ok(AddressBalance {
        address: address.to_owned(),
        balance,
        source: BalanceSource::Wallet,
        unspents,
    })
}

async fn scan_balance(rpc: &dyn NodeRpc, address: &str) -> Result<AddressBalance, CoreError> {
    let scan = rpc.scan_unspent_outputs(address).await?;
    Ok(AddressBalance {
        address: address.to_owned(),
        balance: scan.total_amount,
        source: BalanceSource::UtxoScan,
        unspents: scan.unspents,
    })
}
