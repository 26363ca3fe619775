//! Native JSON-RPC client for Bitcoin Core compatible endpoints.
//!
//! Implements [`NodeRpc`](super::NodeRpc) over JSON-RPC using `reqwest`,
//! with basic/cookie auth and one fresh connection per call.

mod client;
mod connection;
mod parsing;
mod protocol;

pub use client::HttpRpcClient;
pub use connection::NodeConfig;
