//! Ordering and truncation of scored results.

use std::cmp::Ordering;

use super::types::RerankResult;

/// Sorts by descending score and keeps the first `top_k`.
///
/// `top_k == 0` or `top_k >= results.len()` keeps everything. Equal scores
/// keep ascending original index; NaN scores sort after every number.
pub fn select_top_k(mut results: Vec<RerankResult>, top_k: usize) -> Vec<RerankResult> {
    results.sort_by(|a, b| descending(a.score, b.score).then(a.index.cmp(&b.index)));

    if top_k > 0 && top_k < results.len() {
        results.truncate(top_k);
    }

    results
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
