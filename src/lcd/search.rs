//! Transaction search helpers.
//!
//! # Responsibilities
//! - Build LCD search query strings from `SearchTxQuery`
//! - Merge the "sent" and "received" result lists of an address
//! - Apply the height filter to backend results
//!
//! The LCD cannot answer "sent from or to" in one request, so the client runs two
//! searches and merges them here. Both inputs are sorted ascending by height by the
//! backend; the merge keeps that order and emits a shared hash only once.

use crate::lcd::encoding::encode_query_component as esc;
use crate::lcd::types::{IndexedTx, SearchTag, SearchTxFilter};

/// Maximum page size the LCD accepts for `/txs`.
pub const MAX_SEARCH_LIMIT: u32 = 100;

pub fn id_query(hash: &str) -> String {
    format!("tx.hash={}", esc(hash))
}

pub fn height_query(height: u64) -> String {
    format!("tx.height={}", height)
}

pub fn sent_query(address: &str) -> String {
    format!("message.module=bank&message.sender={}", esc(address))
}

pub fn received_query(address: &str) -> String {
    format!("message.module=bank&transfer.recipient={}", esc(address))
}

pub fn tags_query(tags: &[SearchTag]) -> String {
    tags.iter()
        .map(|t| format!("{}={}", esc(&t.key), esc(&t.value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append the height range parameters to a query.
pub fn with_height_filter(query: &str, filter: &SearchTxFilter) -> String {
    let range = format!("tx.minheight={}&tx.maxheight={}", filter.min(), filter.max());
    if query.is_empty() {
        range
    } else {
        format!("{}&{}", query, range)
    }
}

/// Merge two height-sorted lists into one height-sorted list without duplicate hashes.
///
/// Both inputs must already be sorted ascending by height; the result order is
/// unspecified otherwise. Entries of equal height keep the order in which they are
/// encountered, `sent` first.
pub fn merge_sorted(sent: Vec<IndexedTx>, received: Vec<IndexedTx>) -> Vec<IndexedTx> {
    let mut out = Vec::with_capacity(sent.len() + received.len());
    let mut sent = sent.into_iter().peekable();
    let mut received = received.into_iter().peekable();

    loop {
        match (sent.peek(), received.peek()) {
            (Some(a), Some(b)) => {
                if a.hash == b.hash {
                    // sent to self
                    received.next();
                    out.extend(sent.next());
                } else if b.height < a.height {
                    out.extend(received.next());
                } else {
                    out.extend(sent.next());
                }
            }
            (Some(_), None) => {
                out.extend(sent);
                break;
            }
            (None, Some(_)) => {
                out.extend(received);
                break;
            }
            (None, None) => break,
        }
    }

    out
}

/// Drop every transaction outside the filter's height range.
pub fn apply_height_filter(txs: Vec<IndexedTx>, filter: &SearchTxFilter) -> Vec<IndexedTx> {
    txs.into_iter().filter(|tx| filter.contains(tx.height)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::types::{StdFee, StdTx, WrappedStdTx};

    fn tx(height: u64, hash: &str) -> IndexedTx {
        IndexedTx {
            height,
            hash: hash.to_string(),
            code: 0,
            raw_log: String::new(),
            logs: Vec::new(),
            tx: WrappedStdTx::new(StdTx {
                msg: Vec::new(),
                fee: StdFee::default(),
                signatures: Vec::new(),
                memo: String::new(),
            }),
            timestamp: String::new(),
        }
    }

    fn summary(txs: &[IndexedTx]) -> Vec<(u64, &str)> {
        txs.iter().map(|t| (t.height, t.hash.as_str())).collect()
    }

    #[test]
    fn test_merge_deduplicates_shared_hash() {
        let sent = vec![tx(10, "A"), tx(20, "B")];
        let received = vec![tx(15, "C"), tx(20, "B")];
        let merged = merge_sorted(sent, received);
        assert_eq!(summary(&merged), vec![(10, "A"), (15, "C"), (20, "B")]);
    }

    #[test]
    fn test_merge_with_empty_side() {
        let merged = merge_sorted(Vec::new(), vec![tx(1, "A"), tx(2, "B")]);
        assert_eq!(summary(&merged), vec![(1, "A"), (2, "B")]);

        let merged = merge_sorted(vec![tx(3, "C")], Vec::new());
        assert_eq!(summary(&merged), vec![(3, "C")]);

        assert!(merge_sorted(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_merge_keeps_encounter_order_on_equal_height() {
        let sent = vec![tx(5, "S1"), tx(5, "S2")];
        let received = vec![tx(5, "R1"), tx(6, "R2")];
        let merged = merge_sorted(sent, received);
        assert_eq!(
            summary(&merged),
            vec![(5, "S1"), (5, "S2"), (5, "R1"), (6, "R2")]
        );
    }

    #[test]
    fn test_merge_length_and_order() {
        // every third height is shared between both sides
        let sent: Vec<_> = (0..30).filter(|h| h % 2 == 0).map(|h| tx(h, &format!("H{}", h))).collect();
        let received: Vec<_> = (0..30).filter(|h| h % 3 == 0).map(|h| tx(h, &format!("H{}", h))).collect();
        let shared = (0..30).filter(|h| h % 6 == 0).count();
        let expected_len = sent.len() + received.len() - shared;

        let merged = merge_sorted(sent, received);
        assert_eq!(merged.len(), expected_len);
        assert!(merged.windows(2).all(|w| w[0].height <= w[1].height));

        let mut hashes: Vec<_> = merged.iter().map(|t| t.hash.clone()).collect();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), expected_len);
    }

    #[test]
    fn test_apply_height_filter() {
        let txs = vec![tx(1, "A"), tx(5, "B"), tx(9, "C")];
        let filter = SearchTxFilter::new(Some(2), Some(9));
        let filtered = apply_height_filter(txs, &filter);
        assert_eq!(summary(&filtered), vec![(5, "B"), (9, "C")]);
    }

    #[test]
    fn test_query_strings() {
        assert_eq!(height_query(7), "tx.height=7");
        assert_eq!(
            sent_query("wasm1x"),
            "message.module=bank&message.sender=wasm1x"
        );
        assert_eq!(
            received_query("wasm1x"),
            "message.module=bank&transfer.recipient=wasm1x"
        );
        let tags = vec![
            SearchTag::new("message.contract_address", "wasm1c"),
            SearchTag::new("message.action", "execute"),
        ];
        assert_eq!(
            tags_query(&tags),
            "message.contract_address=wasm1c&message.action=execute"
        );
        let filter = SearchTxFilter::new(Some(3), Some(8));
        assert_eq!(
            with_height_filter("tx.height=5", &filter),
            "tx.height=5&tx.minheight=3&tx.maxheight=8"
        );
    }

    #[test]
    fn test_tag_values_cannot_inject_parameters() {
        let tags = vec![SearchTag::new("message.memo", "a#b&x=y")];
        assert_eq!(tags_query(&tags), "message.memo=a%23b%26x%3Dy");
        assert_eq!(id_query("AB&x=1"), "tx.hash=AB%26x%3D1");
    }
}
