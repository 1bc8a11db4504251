use serde::Serialize;

/// Flat per-call prices in USD, matching the provider's published rates for
/// text search and place details requests.
pub const SEARCH_CALL_PRICE: f64 = 0.032;
pub const DETAILS_CALL_PRICE: f64 = 0.017;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub search_cost: f64,
    pub details_cost: f64,
    pub total: f64,
}

/// Spend for the current invocation only; the multi-invocation total is the
/// caller's bookkeeping.
pub fn estimate(search_calls: usize, details_calls: usize) -> CostEstimate {
    let search_cost = search_calls as f64 * SEARCH_CALL_PRICE;
    let details_cost = details_calls as f64 * DETAILS_CALL_PRICE;
    CostEstimate {
        search_cost,
        details_cost,
        total: search_cost + details_cost,
    }
}
