//! Client-side request counters
//!
//! - `beer_client_requests_total` (counter): labels `operation`, `outcome`
//!
//! Only the facade is used here. Whoever embeds the client installs a
//! recorder; without one these calls are no-ops.

use crate::error::Result;

/// Count one completed operation. `outcome` is `success` or the error kind.
pub fn record_request<T>(operation: &'static str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::counter!(
        "beer_client_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
