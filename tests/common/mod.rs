//! Shared utilities for integration tests: an in-process mock LCD.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: Value,
    pub received_at: Instant,
}

type Responder = Arc<dyn Fn(&MockRequest) -> (u16, Value) + Send + Sync>;

#[derive(Clone)]
struct MockState {
    responder: Responder,
    delay: Duration,
    calls: Arc<Mutex<Vec<MockRequest>>>,
}

/// Handle to a running mock LCD.
pub struct MockLcd {
    pub url: String,
    calls: Arc<Mutex<Vec<MockRequest>>>,
}

#[allow(dead_code)]
impl MockLcd {
    /// All requests received so far.
    pub fn calls(&self) -> Vec<MockRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of requests whose path equals `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }
}

async fn dispatch(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> impl IntoResponse {
    let request = MockRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().unwrap_or("").to_string(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
        received_at: Instant::now(),
    };
    state.calls.lock().unwrap().push(request.clone());

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, value) = (state.responder)(&request);
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(value),
    )
}

/// Start a programmable mock LCD on an ephemeral port.
pub async fn start_mock_lcd<F>(responder: F) -> MockLcd
where
    F: Fn(&MockRequest) -> (u16, Value) + Send + Sync + 'static,
{
    start_delayed_mock_lcd(Duration::ZERO, responder).await
}

/// Like `start_mock_lcd`, but every response is held back for `delay`.
pub async fn start_delayed_mock_lcd<F>(delay: Duration, responder: F) -> MockLcd
where
    F: Fn(&MockRequest) -> (u16, Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = MockState {
        responder: Arc::new(responder),
        delay,
        calls: Arc::new(Mutex::new(Vec::new())),
    };
    let calls = state.calls.clone();
    let app = Router::new().fallback(dispatch).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockLcd {
        url: format!("http://{}", addr),
        calls,
    }
}

pub fn not_found() -> (u16, Value) {
    (404, json!({ "error": "no route" }))
}

/// Wrap a result the way the wasm and auth modules do.
#[allow(dead_code)]
pub fn envelope(height: u64, result: Value) -> Value {
    json!({ "height": height.to_string(), "result": result })
}

#[allow(dead_code)]
pub fn account_json(address: &str, account_number: u64, sequence: u64) -> Value {
    json!({
        "type": "cosmos-sdk/Account",
        "value": {
            "address": address,
            "coins": [{ "denom": "ucosm", "amount": "1000000" }],
            "public_key": "",
            "account_number": account_number.to_string(),
            "sequence": sequence.to_string()
        }
    })
}

#[allow(dead_code)]
pub fn block_json(height: u64, txs: Value) -> Value {
    json!({
        "block_id": { "hash": "9A2B" },
        "block": {
            "header": {
                "version": { "block": "10", "app": "0" },
                "height": height.to_string(),
                "chain_id": "testing",
                "time": "2020-02-14T10:00:00.000000Z"
            },
            "data": { "txs": txs }
        }
    })
}

#[allow(dead_code)]
pub fn tx_json(height: u64, hash: &str) -> Value {
    json!({
        "height": height.to_string(),
        "txhash": hash,
        "raw_log": "[]",
        "logs": [{ "msg_index": 0, "log": "", "events": [] }],
        "tx": {
            "type": "cosmos-sdk/StdTx",
            "value": {
                "msg": [{
                    "type": "cosmos-sdk/MsgSend",
                    "value": { "from_address": "wasm1a", "to_address": "wasm1b", "amount": [] }
                }],
                "fee": { "amount": [], "gas": "80000" },
                "signatures": null,
                "memo": ""
            }
        },
        "timestamp": "2020-02-14T10:00:00Z"
    })
}

/// Single page search response.
#[allow(dead_code)]
pub fn search_page(txs: Vec<Value>) -> Value {
    let count = txs.len();
    json!({
        "total_count": count.to_string(),
        "count": count.to_string(),
        "page_number": "1",
        "page_total": "1",
        "limit": "100",
        "txs": txs
    })
}
