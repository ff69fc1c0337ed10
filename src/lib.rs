//! CosmWasm LCD Client Library
//!
//! Read/write access to a Cosmos-SDK / wasmd LCD (REST) backend: accounts, blocks,
//! transaction search, contract metadata and state queries, and broadcasting of
//! already-signed transactions.

pub mod config;
pub mod lcd;
pub mod observability;

pub use config::ClientConfig;
pub use lcd::{ChainQueryClient, LcdError, LcdResult};
