//! Leaky-bucket cost model for the GraphQL Admin API.
//!
//! Every GraphQL response carries an `extensions.cost` envelope describing
//! what the request cost and how full the shop's bucket is. The functions in
//! this module turn that envelope into wait times and page sizes.
//!
//! # Example
//!
//! ```rust
//! use shopify_sync::clients::graphql::{repay_delay_ms, RequestCost, ThrottleStatus};
//!
//! let cost = RequestCost {
//!     requested_query_cost: 300.0,
//!     actual_query_cost: Some(300.0),
//!     throttle_status: ThrottleStatus {
//!         maximum_available: 1000.0,
//!         currently_available: 400.0,
//!         restore_rate: 500.0,
//!     },
//! };
//!
//! assert_eq!(repay_delay_ms(&cost, false), 600);
//! assert_eq!(repay_delay_ms(&cost, true), 1200);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// State of the shop's GraphQL bucket.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    /// Bucket size in points.
    pub maximum_available: f64,
    /// Points left right after the request.
    pub currently_available: f64,
    /// Points restored per second.
    pub restore_rate: f64,
}

/// Cost envelope of one GraphQL request (`extensions.cost`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCost {
    /// Cost estimated before execution.
    pub requested_query_cost: f64,
    /// Cost actually charged; `null` when the request was rejected.
    #[serde(default)]
    pub actual_query_cost: Option<f64>,
    /// Bucket state after the request.
    pub throttle_status: ThrottleStatus,
}

impl RequestCost {
    /// Parses the cost envelope out of a GraphQL response body.
    #[must_use]
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        body.get("extensions")
            .and_then(|extensions| extensions.get("cost"))
            .and_then(|cost| serde_json::from_value(cost.clone()).ok())
    }
}

/// Milliseconds to wait after a request so the bucket is repaid.
///
/// A throttled request waits until the bucket is full again; a successful one
/// waits for the points it just spent (`actualQueryCost`, falling back to the
/// requested cost). Never negative.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn repay_delay_ms(cost: &RequestCost, was_throttled: bool) -> u64 {
    let status = &cost.throttle_status;
    if status.restore_rate <= 0.0 {
        return 0;
    }

    let points = if was_throttled {
        status.maximum_available - status.currently_available
    } else {
        cost.actual_query_cost.unwrap_or(cost.requested_query_cost)
    };

    let delay = (points * 1000.0 / status.restore_rate).ceil();
    if delay.is_finite() && delay > 0.0 {
        delay as u64
    } else {
        0
    }
}

/// [`repay_delay_ms`] as a [`Duration`].
#[must_use]
pub fn repay_delay(cost: &RequestCost, was_throttled: bool) -> Duration {
    Duration::from_millis(repay_delay_ms(cost, was_throttled))
}

/// Points a fresh run needs before it is admitted.
#[must_use]
pub fn min_points_needed(status: &ThrottleStatus) -> f64 {
    status.maximum_available - 1.0
}

/// Admission defer for a fresh run: `fixed` when the bucket is not (almost)
/// full, zero otherwise.
///
/// The wait is deliberately not derived from `restoreRate`; the next
/// invocation re-checks the bucket anyway.
#[must_use]
pub fn defer_delay(status: &ThrottleStatus, fixed: Duration) -> Duration {
    if status.currently_available < min_points_needed(status) {
        fixed
    } else {
        Duration::ZERO
    }
}

/// Page size for a locked run, sized to the points currently affordable.
///
/// The per-entry cost is learned from the previous run
/// (`requestedQueryCost / last_limit`). Result is in `1..=hard_cap`; with no
/// usable history the hard cap is returned.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn next_max_entries(
    last_cost: &RequestCost,
    last_limit: u32,
    current: &ThrottleStatus,
    budget_cap: f64,
    hard_cap: u32,
) -> u32 {
    let hard_cap = hard_cap.max(1);
    if last_limit == 0 || last_cost.requested_query_cost <= 0.0 {
        return hard_cap;
    }

    let cost_per_entry = last_cost.requested_query_cost / f64::from(last_limit);
    let affordable = budget_cap.min(current.currently_available).max(0.0);
    let entries = (affordable / cost_per_entry).floor();

    if entries >= f64::from(hard_cap) {
        hard_cap
    } else {
        (entries as u32).max(1)
    }
}

/// Shrunk page size after a `MAX_COST_EXCEEDED` rejection.
///
/// `floor(max_cost / cost * requested_limit * 0.75)`, clamped to
/// `1..=hard_cap`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn reduced_limit(cost: f64, max_cost: f64, requested_limit: u32, hard_cap: u32) -> u32 {
    let hard_cap = hard_cap.max(1);
    if cost <= 0.0 {
        return requested_limit.clamp(1, hard_cap);
    }

    let reduced = (max_cost / cost * f64::from(requested_limit) * 0.75).floor();
    if !reduced.is_finite() || reduced < 1.0 {
        1
    } else if reduced >= f64::from(hard_cap) {
        hard_cap
    } else {
        reduced as u32
    }
}

/// Bucket state once the repay delay of `cost` has elapsed.
///
/// Locked runs use this instead of querying the bucket again.
#[must_use]
pub fn status_after_repay(cost: &RequestCost) -> ThrottleStatus {
    let status = cost.throttle_status;
    let repaid = cost.actual_query_cost.unwrap_or(0.0).max(0.0);
    ThrottleStatus {
        currently_available: (status.currently_available + repaid).min(status.maximum_available),
        ..status
    }
}
