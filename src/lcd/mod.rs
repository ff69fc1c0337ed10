//! LCD (REST) client subsystem.
//!
//! # Data Flow
//! ```text
//! ChainQueryClient operation
//!     → transport.rs (HTTP request, LCD error unwrapping)
//!     → responses.rs (wire schema, rejects malformed payloads)
//!     → types.rs (domain value returned to the caller)
//!
//! search_tx (sent from or to):
//!     sent query ─┐
//!                 ├─ concurrently → search.rs merge → height filter
//!     recv query ─┘
//! ```
//!
//! # Shared State (per client instance)
//! - Chain id: resolved at most once
//! - Code cache: code is immutable on chain, entries never expire
//! - Address hint: any address seen to exist, used by `get_height`

pub mod cache;
pub mod client;
pub mod encoding;
pub mod error;
pub mod responses;
pub mod search;
pub mod transport;
pub mod types;

pub use client::ChainQueryClient;
pub use error::{LcdError, LcdResult};
pub use types::{
    Account, Block, BroadcastMode, BroadcastTxResult, CodeDetails, ContractInfo, IndexedTx,
    SearchTag, SearchTxFilter, SearchTxQuery,
};
