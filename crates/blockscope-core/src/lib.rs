pub mod balance;
pub mod enrich;
pub mod error;
pub mod provenance;
pub mod rpc;
pub mod transfers;
pub mod types;
pub mod views;

#[cfg(test)]
mod test_util;

pub use error::CoreError;
pub use provenance::enrich_transaction;
pub use types::{BlockRef, EnrichedTransaction};
