use bitcoin::Txid;

/// Failures talking to the node, split by whether the node was reachable.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The request never produced a response (connection refused, DNS, TLS...).
    #[error("node unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("node rejected request (code {code}): {message}")]
    ServerError { code: i64, message: String },

    #[error("invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("transaction not found: {0}")]
    TxNotFound(Txid),

    #[error("block not found: {0}")]
    BlockNotFound(String),

    #[error("transaction not in mempool: {0}")]
    NotInMempool(Txid),

    #[error("prior output {txid}:{vout} cannot be resolved")]
    DanglingReference { txid: Txid, vout: u32 },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction data: {0}")]
    InvalidTxData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// `true` when the node could not be reached at all, as opposed to the
    /// node answering with an error.
    pub fn is_node_unreachable(&self) -> bool {
        matches!(self, Self::Rpc(RpcError::Transport(_)))
    }
}
