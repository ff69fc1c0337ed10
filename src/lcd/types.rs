//! Domain types returned by and passed to the LCD client.

use serde::{Deserialize, Serialize};

use crate::lcd::encoding::{
    null_as_default, serialize_base64, serialize_base64_list, serialize_base64_opt,
};

/// Largest height the search filter accepts by default (2^53 - 1).
pub const MAX_SAFE_HEIGHT: u64 = 9_007_199_254_740_991;

/// How eagerly the backend answers a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Return once the transaction is included in a block.
    #[default]
    Block,
    /// Return after the mempool check.
    Sync,
    /// Return immediately.
    Async,
}

impl std::str::FromStr for BroadcastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(BroadcastMode::Block),
            "sync" => Ok(BroadcastMode::Sync),
            "async" => Ok(BroadcastMode::Async),
            other => Err(format!("unknown broadcast mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// Public key as reported by the LCD: legacy bech32 string or typed amino JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PubKey {
    Bech32(String),
    Typed {
        #[serde(rename = "type")]
        kind: String,
        value: String,
    },
}

/// On-chain account state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub address: String,
    pub balance: Vec<Coin>,
    pub pubkey: Option<PubKey>,
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceResponse {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct BlockVersion {
    #[serde(default)]
    pub block: String,
    #[serde(default)]
    pub app: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub version: BlockVersion,
    pub height: u64,
    pub chain_id: String,
    /// RFC3339 timestamp.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Block hash.
    pub id: String,
    pub header: BlockHeader,
    /// Raw transactions, one entry per transaction.
    #[serde(serialize_with = "serialize_base64_list")]
    pub txs: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attribute {
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,
}

/// Structured log of a single message in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Log {
    pub msg_index: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Event>,
}

impl Log {
    /// Find the first attribute with the given event type and key.
    pub fn find_attribute(&self, event_type: &str, key: &str) -> Option<&Attribute> {
        self.events
            .iter()
            .filter(|e| e.kind == event_type)
            .flat_map(|e| e.attributes.iter())
            .find(|a| a.key == key)
    }
}

/// Amino JSON message.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Msg {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct StdFee {
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Vec<Coin>,
    pub gas: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StdSignature {
    pub pub_key: PubKey,
    pub signature: String,
}

/// A signed transaction in amino JSON form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StdTx {
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: Vec<Msg>,
    pub fee: StdFee,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signatures: Vec<StdSignature>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memo: String,
}

/// `StdTx` tagged with its amino type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WrappedStdTx {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: StdTx,
}

impl WrappedStdTx {
    pub const AMINO_TYPE: &'static str = "cosmos-sdk/StdTx";

    pub fn new(tx: StdTx) -> Self {
        Self {
            kind: Self::AMINO_TYPE.to_string(),
            value: tx,
        }
    }
}

/// A confirmed transaction as returned by search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedTx {
    pub height: u64,
    pub hash: String,
    /// Result code, 0 on success.
    pub code: u32,
    pub raw_log: String,
    pub logs: Vec<Log>,
    pub tx: WrappedStdTx,
    pub timestamp: String,
}

/// Outcome of a broadcast. The variant tells which shape the backend answered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BroadcastTxResult {
    /// The backend populated a result code.
    Accepted {
        height: u64,
        transaction_hash: String,
        code: u32,
        raw_log: String,
    },
    /// The backend returned execution logs.
    Indexed {
        logs: Vec<Log>,
        raw_log: String,
        transaction_hash: String,
        #[serde(serialize_with = "serialize_base64_opt")]
        data: Option<Vec<u8>>,
    },
}

impl BroadcastTxResult {
    pub fn transaction_hash(&self) -> &str {
        match self {
            BroadcastTxResult::Accepted { transaction_hash, .. }
            | BroadcastTxResult::Indexed { transaction_hash, .. } => transaction_hash,
        }
    }

    pub fn raw_log(&self) -> &str {
        match self {
            BroadcastTxResult::Accepted { raw_log, .. }
            | BroadcastTxResult::Indexed { raw_log, .. } => raw_log,
        }
    }
}

/// Uploaded contract code metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Code {
    pub id: u64,
    pub creator: String,
    /// Lowercase hex sha256 of the bytecode.
    pub checksum: String,
    pub source: Option<String>,
    pub builder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeDetails {
    #[serde(flatten)]
    pub code: Code,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
}

/// A contract instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractInfo {
    pub address: String,
    pub code_id: u64,
    pub creator: String,
    pub admin: Option<String>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDetails {
    #[serde(flatten)]
    pub info: ContractInfo,
    /// Message the contract was instantiated with.
    pub init_msg: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ContractCodeHistoryOperation {
    Init,
    Genesis,
    Migrate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractCodeHistoryEntry {
    pub operation: ContractCodeHistoryOperation,
    pub code_id: u64,
    pub msg: serde_json::Value,
}

/// One key/value pair of a contract's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractStateEntry {
    #[serde(serialize_with = "serialize_base64")]
    pub key: Vec<u8>,
    #[serde(serialize_with = "serialize_base64")]
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTag {
    pub key: String,
    pub value: String,
}

impl SearchTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What to search for. Exactly one criterion per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTxQuery {
    /// Transaction hash.
    Id(String),
    /// Exact block height.
    Height(u64),
    /// Bank sends from or to the address.
    SentFromOrTo(String),
    /// Arbitrary event tag constraints, all of which must match.
    Tags(Vec<SearchTag>),
}

/// Inclusive height range narrowing a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchTxFilter {
    pub min_height: Option<u64>,
    pub max_height: Option<u64>,
}

impl SearchTxFilter {
    pub fn new(min_height: Option<u64>, max_height: Option<u64>) -> Self {
        Self { min_height, max_height }
    }

    pub fn min(&self) -> u64 {
        self.min_height.unwrap_or(0)
    }

    pub fn max(&self) -> u64 {
        self.max_height.unwrap_or(MAX_SAFE_HEIGHT)
    }

    /// An inverted range matches nothing.
    pub fn is_empty(&self) -> bool {
        self.max() < self.min()
    }

    pub fn contains(&self, height: u64) -> bool {
        height >= self.min() && height <= self.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter = SearchTxFilter::default();
        assert_eq!(filter.min(), 0);
        assert_eq!(filter.max(), MAX_SAFE_HEIGHT);
        assert!(!filter.is_empty());
        assert!(filter.contains(0));
    }

    #[test]
    fn test_filter_inverted_is_empty() {
        let filter = SearchTxFilter::new(Some(10), Some(9));
        assert!(filter.is_empty());
        assert!(!filter.contains(9));
        assert!(!filter.contains(10));
    }

    #[test]
    fn test_broadcast_mode_serde() {
        assert_eq!(serde_json::to_string(&BroadcastMode::Block).unwrap(), "\"block\"");
        assert_eq!("sync".parse::<BroadcastMode>().unwrap(), BroadcastMode::Sync);
        assert!("eager".parse::<BroadcastMode>().is_err());
    }

    #[test]
    fn test_pubkey_shapes() {
        let pk: PubKey = serde_json::from_str(r#""wasmpub1addwnpepq""#).unwrap();
        assert!(matches!(pk, PubKey::Bech32(_)));

        let pk: PubKey =
            serde_json::from_str(r#"{"type":"tendermint/PubKeySecp256k1","value":"A08EGB"}"#)
                .unwrap();
        assert!(matches!(pk, PubKey::Typed { .. }));
    }

    #[test]
    fn test_log_find_attribute() {
        let log: Log = serde_json::from_str(
            r#"{"msg_index":0,"log":"","events":[{"type":"message","attributes":[{"key":"action","value":"store-code"},{"key":"code_id","value":"3"}]}]}"#,
        )
        .unwrap();
        assert_eq!(log.find_attribute("message", "code_id").unwrap().value, "3");
        assert!(log.find_attribute("transfer", "code_id").is_none());
    }

    #[test]
    fn test_broadcast_result_accessors() {
        let result = BroadcastTxResult::Indexed {
            logs: Vec::new(),
            raw_log: "[]".to_string(),
            transaction_hash: "AB".to_string(),
            data: None,
        };
        assert_eq!(result.transaction_hash(), "AB");
        assert_eq!(result.raw_log(), "[]");
    }
}
