//! CosmWasm LCD query client.
//!
//! # Responsibilities
//! - Read accounts, blocks, transactions and contract metadata
//! - Broadcast signed transactions
//! - Memoize the chain id and cache immutable code details
//! - Remember one known-valid address for cheap height lookups

use arc_swap::ArcSwapOption;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::schema::LcdConfig;
use crate::lcd::cache::CodeCache;
use crate::lcd::encoding::{
    decode_base64, decode_hex, encode_path_segment, is_strict_tx_hash, parse_height,
    sha256_identifier,
};
use crate::lcd::error::{LcdError, LcdResult};
use crate::lcd::responses::{
    AuthAccountResult, BlockResponse, BroadcastTxsResponse, CodeDetailsResponse,
    CodeInfoResponse, ContractCodeHistoryResponse, ContractInfoResponse, ContractStateResponse,
    EncodeTxResponse, LcdEnvelope, NodeInfoResponse, SearchTxsResponse, SmartQueryResponse,
    TxsResponseItem,
};
use crate::lcd::search::{
    self, apply_height_filter, merge_sorted, with_height_filter, MAX_SEARCH_LIMIT,
};
use crate::lcd::transport::LcdTransport;
use crate::lcd::types::{
    Account, Block, BroadcastMode, BroadcastTxResult, Code, CodeDetails, ContractCodeHistoryEntry,
    ContractDetails, ContractInfo, ContractStateEntry, IndexedTx, SearchTxFilter, SearchTxQuery,
    SequenceResponse, StdTx, WrappedStdTx,
};

/// Prefix of the backend error raised by smart queries against a missing contract.
const CONTRACT_NOT_FOUND_PREFIX: &str = "not found: contract";

/// Read/write access to a single LCD backend.
///
/// Clones share the chain id memo, the code cache and the address hint. A client
/// for a different backend must be created separately.
#[derive(Clone)]
pub struct ChainQueryClient {
    transport: LcdTransport,
    broadcast_mode: BroadcastMode,
    chain_id: Arc<OnceCell<String>>,
    codes: CodeCache,
    /// Any address known to exist on chain. Makes `get_height` cheaper.
    any_valid_address: Arc<ArcSwapOption<String>>,
}

#[derive(Serialize)]
struct BroadcastTxsRequest<'a> {
    tx: &'a StdTx,
    mode: BroadcastMode,
}

impl ChainQueryClient {
    /// Create a client for `api_url`. Performs no I/O.
    pub fn new(api_url: &str, broadcast_mode: BroadcastMode) -> LcdResult<Self> {
        Self::with_http_client(api_url, broadcast_mode, reqwest::Client::new())
    }

    /// Create a client from configuration, applying the configured timeouts.
    pub fn from_config(config: &LcdConfig) -> LcdResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Self::with_http_client(&config.api_url, config.broadcast_mode, http)
    }

    /// Create a client on top of a caller-provided HTTP client.
    pub fn with_http_client(
        api_url: &str,
        broadcast_mode: BroadcastMode,
        http: reqwest::Client,
    ) -> LcdResult<Self> {
        Ok(Self {
            transport: LcdTransport::new(api_url, http)?,
            broadcast_mode,
            chain_id: Arc::new(OnceCell::new()),
            codes: CodeCache::new(),
            any_valid_address: Arc::new(ArcSwapOption::empty()),
        })
    }

    pub fn api_url(&self) -> &str {
        self.transport.api_url()
    }

    pub fn broadcast_mode(&self) -> BroadcastMode {
        self.broadcast_mode
    }

    /// Network identifier of the backend.
    ///
    /// Resolved with one request per client; concurrent first callers wait for the
    /// same request. A failed resolution is not memoized.
    pub async fn get_chain_id(&self) -> LcdResult<String> {
        let chain_id = self
            .chain_id
            .get_or_try_init(|| async {
                let response: NodeInfoResponse = self.transport.get("/node_info").await?;
                let network = response.node_info.network;
                if network.is_empty() {
                    return Err(LcdError::Protocol("Chain ID must not be empty".to_string()));
                }
                tracing::info!(api_url = %self.api_url(), chain_id = %network, "Resolved chain id");
                Ok::<_, LcdError>(network)
            })
            .await?;
        Ok(chain_id.clone())
    }

    /// Current chain height.
    pub async fn get_height(&self) -> LcdResult<u64> {
        if let Some(address) = self.any_valid_address.load_full() {
            let path = format!("/auth/accounts/{}", encode_path_segment(&address));
            let response: LcdEnvelope<AuthAccountResult> = self.transport.get(&path).await?;
            return parse_height("height", &response.height);
        }

        // Downloads every transaction of the latest block.
        let latest: BlockResponse = self.transport.get("/blocks/latest").await?;
        parse_height("block.header.height", &latest.block.header.height)
    }

    /// Deterministic identifier of a signed transaction, equal to the hash the
    /// backend reports once the transaction is broadcast.
    pub async fn get_identifier(&self, tx: &WrappedStdTx) -> LcdResult<String> {
        // no local amino encoder, so the backend encodes for us
        let response: EncodeTxResponse = self.transport.post("/txs/encode", tx).await?;
        let bytes = decode_base64("tx", &response.tx)?;
        Ok(sha256_identifier(bytes))
    }

    /// Account state, or `None` when the account has never been seen on chain.
    pub async fn get_account(&self, address: &str) -> LcdResult<Option<Account>> {
        let path = format!("/auth/accounts/{}", encode_path_segment(address));
        let response: LcdEnvelope<AuthAccountResult> = self.transport.get(&path).await?;
        let account = response.result.value.into_account();
        if let Some(account) = &account {
            self.remember_address(&account.address);
        }
        Ok(account)
    }

    pub async fn get_sequence(&self, address: &str) -> LcdResult<SequenceResponse> {
        let account = self
            .get_account(address)
            .await?
            .ok_or_else(|| LcdError::AccountNotFound(address.to_string()))?;
        Ok(SequenceResponse {
            account_number: account.account_number,
            sequence: account.sequence,
        })
    }

    /// Block at `height`, or the latest block.
    pub async fn get_block(&self, height: Option<u64>) -> LcdResult<Block> {
        let path = match height {
            Some(h) => format!("/blocks/{}", h),
            None => "/blocks/latest".to_string(),
        };
        let response: BlockResponse = self.transport.get(&path).await?;
        response.into_block()
    }

    /// Transaction with the given hash.
    pub async fn get_tx(&self, id: &str) -> LcdResult<Option<IndexedTx>> {
        let results = self
            .search_tx(&SearchTxQuery::Id(id.to_string()), SearchTxFilter::default())
            .await?;
        Ok(results.into_iter().next())
    }

    /// Search transactions, returning them in ascending height order.
    pub async fn search_tx(
        &self,
        query: &SearchTxQuery,
        filter: SearchTxFilter,
    ) -> LcdResult<Vec<IndexedTx>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let txs = match query {
            SearchTxQuery::Id(hash) => self.txs_query(&search::id_query(hash)).await?,
            SearchTxQuery::Height(height) => {
                if !filter.contains(*height) {
                    return Ok(Vec::new());
                }
                self.txs_query(&search::height_query(*height)).await?
            }
            SearchTxQuery::SentFromOrTo(address) => {
                let sent_query = with_height_filter(&search::sent_query(address), &filter);
                let received_query = with_height_filter(&search::received_query(address), &filter);
                let (sent, received) = tokio::try_join!(
                    self.txs_query(&sent_query),
                    self.txs_query(&received_query)
                )?;
                merge_sorted(sent, received)
            }
            SearchTxQuery::Tags(tags) => {
                self.txs_query(&with_height_filter(&search::tags_query(tags), &filter))
                    .await?
            }
        };

        // backend height filtering is not reliable
        Ok(apply_height_filter(txs, &filter))
    }

    /// Submit a signed transaction using the client's broadcast mode.
    pub async fn broadcast_tx(&self, tx: &StdTx) -> LcdResult<BroadcastTxResult> {
        let request = BroadcastTxsRequest {
            tx,
            mode: self.broadcast_mode,
        };
        let response: BroadcastTxsResponse = self.transport.post("/txs", &request).await?;

        if !is_strict_tx_hash(&response.txhash) {
            tracing::warn!(txhash = %response.txhash, "Backend returned ill-formatted txhash");
            return Err(LcdError::MalformedResponse(format!(
                "Received ill-formatted txhash '{}'. Must be non-empty upper-case hex",
                response.txhash
            )));
        }

        let result = match response.code {
            Some(code) => BroadcastTxResult::Accepted {
                height: response.height,
                transaction_hash: response.txhash,
                code,
                raw_log: response.raw_log.unwrap_or_default(),
            },
            None => {
                let data = match response.data.as_deref() {
                    Some(d) if !d.is_empty() => Some(decode_hex("data", d)?),
                    _ => None,
                };
                BroadcastTxResult::Indexed {
                    logs: response.logs.unwrap_or_default(),
                    raw_log: response.raw_log.unwrap_or_default(),
                    transaction_hash: response.txhash,
                    data,
                }
            }
        };

        tracing::info!(txhash = %result.transaction_hash(), mode = ?self.broadcast_mode, "Broadcast transaction");
        Ok(result)
    }

    /// All uploaded codes.
    pub async fn get_codes(&self) -> LcdResult<Vec<Code>> {
        let response: LcdEnvelope<Option<Vec<CodeInfoResponse>>> =
            self.transport.get("/wasm/code").await?;
        let codes = response
            .result
            .unwrap_or_default()
            .into_iter()
            .map(CodeInfoResponse::into_code)
            .collect::<LcdResult<Vec<_>>>()?;
        if let Some(code) = codes.first() {
            self.remember_address(&code.creator);
        }
        Ok(codes)
    }

    /// Code metadata and bytecode. Served from cache after the first fetch.
    pub async fn get_code_details(&self, code_id: u64) -> LcdResult<CodeDetails> {
        if let Some(cached) = self.codes.get(code_id) {
            return Ok(cached);
        }

        let response: LcdEnvelope<CodeDetailsResponse> =
            self.transport.get(&format!("/wasm/code/{}", code_id)).await?;
        let details = response.result.into_code_details()?;
        Ok(self.codes.insert(details))
    }

    /// Instances of the given code.
    pub async fn get_contracts(&self, code_id: u64) -> LcdResult<Vec<ContractInfo>> {
        let response: LcdEnvelope<Option<Vec<ContractInfoResponse>>> = self
            .transport
            .get(&format!("/wasm/code/{}/contracts", code_id))
            .await?;
        Ok(response
            .result
            .unwrap_or_default()
            .into_iter()
            .map(ContractInfoResponse::into_info)
            .collect())
    }

    pub async fn get_contract(&self, address: &str) -> LcdResult<ContractDetails> {
        let path = format!("/wasm/contract/{}", encode_path_segment(address));
        let response: LcdEnvelope<Option<ContractInfoResponse>> = self.transport.get(&path).await?;
        response
            .result
            .map(ContractInfoResponse::into_details)
            .ok_or_else(|| LcdError::ContractNotFound(address.to_string()))
    }

    pub async fn get_contract_code_history(
        &self,
        address: &str,
    ) -> LcdResult<Vec<ContractCodeHistoryEntry>> {
        let response: LcdEnvelope<Option<Vec<ContractCodeHistoryResponse>>> = self
            .transport
            .get(&format!("/wasm/contract/{}/history", encode_path_segment(address)))
            .await?;
        let entries = response
            .result
            .ok_or_else(|| LcdError::ContractHistoryNotFound(address.to_string()))?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    /// Full storage of a contract.
    pub async fn get_all_contract_state(&self, address: &str) -> LcdResult<Vec<ContractStateEntry>> {
        let response: LcdEnvelope<Option<Vec<ContractStateResponse>>> = self
            .transport
            .get(&format!("/wasm/contract/{}/state", encode_path_segment(address)))
            .await?;
        response
            .result
            .unwrap_or_default()
            .into_iter()
            .map(ContractStateResponse::into_entry)
            .collect()
    }

    /// Raw value stored under `key`, or `None` if the key is unset.
    ///
    /// Fails with `ContractNotFound` when there is no contract at `address`.
    pub async fn query_contract_raw(&self, address: &str, key: &[u8]) -> LcdResult<Option<Vec<u8>>> {
        self.get_contract(address).await?;

        let path = format!(
            "/wasm/contract/{}/raw/{}?encoding=hex",
            encode_path_segment(address),
            hex::encode(key)
        );
        let response: LcdEnvelope<Option<Vec<ContractStateResponse>>> =
            self.transport.get(&path).await?;
        match response.result.unwrap_or_default().into_iter().next() {
            Some(entry) => Ok(Some(decode_base64("val", &entry.val)?)),
            None => Ok(None),
        }
    }

    /// Run a smart query and decode the JSON answer.
    pub async fn query_contract_smart<Q, R>(&self, address: &str, query_msg: &Q) -> LcdResult<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let encoded = hex::encode(serde_json::to_vec(query_msg)?);
        let path = format!(
            "/wasm/contract/{}/smart/{}?encoding=hex",
            encode_path_segment(address),
            encoded
        );

        let response: LcdEnvelope<SmartQueryResponse> = match self.transport.get(&path).await {
            Ok(r) => r,
            Err(LcdError::Backend { message, .. })
                if message.starts_with(CONTRACT_NOT_FOUND_PREFIX) =>
            {
                return Err(LcdError::ContractNotFound(address.to_string()));
            }
            Err(e) => return Err(e),
        };

        let bytes = decode_base64("smart", &response.result.smart)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn txs_query(&self, query: &str) -> LcdResult<Vec<IndexedTx>> {
        // TODO: follow page_number up to page_total instead of failing on overflow
        let path = format!("/txs?{}&limit={}", query, MAX_SEARCH_LIMIT);
        let response: SearchTxsResponse = self.transport.get(&path).await?;

        if response.page_total > 1 || response.total_count > u64::from(MAX_SEARCH_LIMIT) {
            tracing::warn!(
                query = %query,
                total = response.total_count,
                pages = response.page_total,
                "Search result does not fit into one page"
            );
            return Err(LcdError::UnsupportedPagination {
                total: response.total_count,
                limit: MAX_SEARCH_LIMIT,
            });
        }

        response
            .txs
            .into_iter()
            .map(TxsResponseItem::into_indexed_tx)
            .collect()
    }

    fn remember_address(&self, address: &str) {
        self.any_valid_address
            .store(Some(Arc::new(address.to_string())));
    }

    #[cfg(test)]
    pub(crate) fn known_address(&self) -> Option<String> {
        self.any_valid_address.load_full().map(|a| a.as_ref().clone())
    }
}

impl std::fmt::Debug for ChainQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainQueryClient")
            .field("api_url", &self.api_url())
            .field("broadcast_mode", &self.broadcast_mode)
            .field("chain_id", &self.chain_id.get())
            .field("cached_codes", &self.codes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_performs_no_io() {
        // nothing listens on this port
        let client = ChainQueryClient::new("http://127.0.0.1:1", BroadcastMode::Sync).unwrap();
        assert_eq!(client.api_url(), "http://127.0.0.1:1");
        assert_eq!(client.broadcast_mode(), BroadcastMode::Sync);
        assert!(client.known_address().is_none());
    }

    #[test]
    fn test_invalid_url() {
        let result = ChainQueryClient::new("localhost", BroadcastMode::Block);
        assert!(matches!(result, Err(LcdError::InvalidUrl(_))));
    }

    #[test]
    fn test_from_config() {
        let config = LcdConfig::default();
        let client = ChainQueryClient::from_config(&config).unwrap();
        assert_eq!(client.api_url(), "http://localhost:1317");
        assert_eq!(client.broadcast_mode(), BroadcastMode::Block);
    }

    #[tokio::test]
    async fn test_inverted_filter_skips_network() {
        let client = ChainQueryClient::new("http://127.0.0.1:1", BroadcastMode::Block).unwrap();
        let filter = SearchTxFilter::new(Some(10), Some(5));
        let result = client
            .search_tx(&SearchTxQuery::SentFromOrTo("wasm1x".into()), filter)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_height_outside_filter_skips_network() {
        let client = ChainQueryClient::new("http://127.0.0.1:1", BroadcastMode::Block).unwrap();
        let filter = SearchTxFilter::new(Some(10), Some(20));
        let result = client
            .search_tx(&SearchTxQuery::Height(21), filter)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        let client = ChainQueryClient::new("http://127.0.0.1:1", BroadcastMode::Block).unwrap();
        let err = client.get_chain_id().await.unwrap_err();
        assert!(matches!(err, LcdError::Http(_)));
    }
}
