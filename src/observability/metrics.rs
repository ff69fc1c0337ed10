//! Metrics collection.
//!
//! # Metrics
//! - `lcd_requests_total` (counter): LCD requests by method, status
//! - `lcd_request_duration_seconds` (histogram): LCD latency by method
//! - `lcd_code_cache_hits_total` (counter): code details served from cache
//! - `lcd_code_cache_size` (gauge): cached code entries
//!
//! The library only records; exposition is up to the embedding application's recorder.

use std::time::Duration;

/// Record one finished LCD request. `status` is the HTTP status or "error".
pub fn record_lcd_request(method: &str, status: &str, elapsed: Duration) {
    ::metrics::counter!(
        "lcd_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("lcd_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_code_cache_hit() {
    ::metrics::counter!("lcd_code_cache_hits_total").increment(1);
}

pub fn record_code_cache_size(size: usize) {
    ::metrics::gauge!("lcd_code_cache_size").set(size as f64);
}
