//! Wire schemas of LCD payloads.
//!
//! Every backend response is deserialized into one of these structs before it is
//! reshaped into a domain type, so malformed payloads are rejected at the boundary.

use serde::Deserialize;

use crate::lcd::encoding::{
    decode_base64, decode_hex, null_as_default, parse_height, u64_from_str_or_num,
};
use crate::lcd::error::LcdResult;
use crate::lcd::types::{
    Account, Block, BlockHeader, BlockVersion, Code, CodeDetails, Coin, ContractCodeHistoryEntry,
    ContractCodeHistoryOperation, ContractDetails, ContractInfo, ContractStateEntry, IndexedTx,
    Log, PubKey, WrappedStdTx,
};

/// `{"height": "...", "result": ...}` envelope used by the wasm and auth modules.
#[derive(Debug, Deserialize)]
pub struct LcdEnvelope<T> {
    #[serde(default)]
    pub height: String,
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct NodeInfoResponse {
    pub node_info: NodeInfo,
}

#[derive(Debug, Deserialize)]
pub struct NodeInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub network: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthAccountResult {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub value: BaseAccountValue,
}

#[derive(Debug, Deserialize)]
pub struct BaseAccountValue {
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coins: Vec<Coin>,
    #[serde(default)]
    pub public_key: Option<PubKey>,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub sequence: u64,
}

impl BaseAccountValue {
    /// `None` when the backend reports an empty address, i.e. an unseen account.
    pub fn into_account(self) -> Option<Account> {
        if self.address.is_empty() {
            return None;
        }
        let pubkey = match self.public_key {
            Some(PubKey::Bech32(s)) if s.is_empty() => None,
            other => other,
        };
        Some(Account {
            address: self.address,
            balance: self.coins,
            pubkey,
            account_number: self.account_number,
            sequence: self.sequence,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BlockResponse {
    pub block_id: BlockId,
    pub block: RawBlock,
}

#[derive(Debug, Deserialize)]
pub struct BlockId {
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct RawBlock {
    pub header: RawBlockHeader,
    pub data: RawBlockData,
}

#[derive(Debug, Deserialize)]
pub struct RawBlockHeader {
    #[serde(default)]
    pub version: BlockVersion,
    pub height: String,
    pub chain_id: String,
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub struct RawBlockData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub txs: Vec<String>,
}

impl BlockResponse {
    pub fn into_block(self) -> LcdResult<Block> {
        let height = parse_height("block.header.height", &self.block.header.height)?;
        let txs = self
            .block
            .data
            .txs
            .iter()
            .map(|tx| decode_base64("block.data.txs", tx))
            .collect::<LcdResult<Vec<_>>>()?;
        Ok(Block {
            id: self.block_id.hash,
            header: BlockHeader {
                version: self.block.header.version,
                height,
                chain_id: self.block.header.chain_id,
                time: self.block.header.time,
            },
            txs,
        })
    }
}

/// Result of `GET /txs?...`.
#[derive(Debug, Deserialize)]
pub struct SearchTxsResponse {
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub total_count: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub count: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub page_number: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub page_total: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub limit: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub txs: Vec<TxsResponseItem>,
}

#[derive(Debug, Deserialize)]
pub struct TxsResponseItem {
    pub height: String,
    pub txhash: String,
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw_log: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<Log>,
    pub tx: WrappedStdTx,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
}

impl TxsResponseItem {
    pub fn into_indexed_tx(self) -> LcdResult<IndexedTx> {
        Ok(IndexedTx {
            height: parse_height("txs.height", &self.height)?,
            hash: self.txhash,
            code: self.code.unwrap_or(0),
            raw_log: self.raw_log,
            logs: self.logs,
            tx: self.tx,
            timestamp: self.timestamp,
        })
    }
}

/// Result of `POST /txs`.
#[derive(Debug, Deserialize)]
pub struct BroadcastTxsResponse {
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub height: u64,
    pub txhash: String,
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub raw_log: Option<String>,
    #[serde(default)]
    pub logs: Option<Vec<Log>>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EncodeTxResponse {
    /// base64 encoded amino bytes
    pub tx: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeInfoResponse {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub id: u64,
    pub creator: String,
    /// Hex encoded sha256 checksum.
    pub data_hash: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub builder: Option<String>,
}

impl CodeInfoResponse {
    pub fn into_code(self) -> LcdResult<Code> {
        // normalize casing and reject non-hex checksums
        let checksum = hex::encode(decode_hex("data_hash", &self.data_hash)?);
        Ok(Code {
            id: self.id,
            creator: self.creator,
            checksum,
            source: self.source.filter(|s| !s.is_empty()),
            builder: self.builder.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CodeDetailsResponse {
    #[serde(flatten)]
    pub info: CodeInfoResponse,
    /// base64 encoded wasm bytecode
    pub data: String,
}

impl CodeDetailsResponse {
    pub fn into_code_details(self) -> LcdResult<CodeDetails> {
        let data = decode_base64("data", &self.data)?;
        Ok(CodeDetails {
            code: self.info.into_code()?,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ContractInfoResponse {
    pub address: String,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub code_id: u64,
    pub creator: String,
    #[serde(default)]
    pub admin: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default)]
    pub init_msg: serde_json::Value,
}

impl ContractInfoResponse {
    pub fn into_info(self) -> ContractInfo {
        ContractInfo {
            address: self.address,
            code_id: self.code_id,
            creator: self.creator,
            admin: self.admin.filter(|a| !a.is_empty()),
            label: self.label,
        }
    }

    pub fn into_details(mut self) -> ContractDetails {
        let init_msg = std::mem::take(&mut self.init_msg);
        ContractDetails {
            info: self.into_info(),
            init_msg,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContractCodeHistoryResponse {
    pub operation: ContractCodeHistoryOperation,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub code_id: u64,
    #[serde(default)]
    pub msg: serde_json::Value,
}

impl From<ContractCodeHistoryResponse> for ContractCodeHistoryEntry {
    fn from(entry: ContractCodeHistoryResponse) -> Self {
        Self {
            operation: entry.operation,
            code_id: entry.code_id,
            msg: entry.msg,
        }
    }
}

/// Entry of `/wasm/contract/{address}/state` and `/raw/...`.
#[derive(Debug, Deserialize)]
pub struct ContractStateResponse {
    /// hex encoded
    pub key: String,
    /// base64 encoded
    pub val: String,
}

impl ContractStateResponse {
    pub fn into_entry(self) -> LcdResult<ContractStateEntry> {
        Ok(ContractStateEntry {
            key: decode_hex("key", &self.key)?,
            value: decode_base64("val", &self.val)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SmartQueryResponse {
    /// base64 encoded JSON
    pub smart: String,
}
