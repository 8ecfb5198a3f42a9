//! Statistics calculation engine.
//!
//! Computes derived metrics from stored episodes:
//! - Per-game outcomes (who advances, who wins)
//! - Corpus-wide aggregate statistics and leaderboards
//! - Relative ratings for presentation

pub mod aggregate;
pub mod annotate;
pub mod outcome;

pub use aggregate::compute_statistics;
pub use annotate::annotate;
pub use outcome::{calculate_outcome, GameOutcome, GameResult, PlayerResult};

/// Calculate a percentage (0-100). Returns 0 when the denominator is 0.
pub fn calculate_pct(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Calculate a mean. Returns 0 when there are no samples.
pub fn calculate_mean(sum: i64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Histogram over `0..=max_bucket`; values above the range are ignored.
pub fn histogram<I>(values: I, max_bucket: u32) -> Vec<u32>
where
    I: IntoIterator<Item = u32>,
{
    let mut buckets = vec![0u32; max_bucket as usize + 1];
    for value in values {
        if let Some(slot) = buckets.get_mut(value as usize) {
            *slot += 1;
        }
    }
    buckets
}
