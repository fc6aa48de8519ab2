//! Aggregation of reconstructed captures into reports.
//!
//! This module transforms reconstructed frames and transactions into:
//! - Per-window connection concurrency counts
//! - Transaction groups keyed by fingerprint sequence
//! - Duration statistics (min/mean/p95/p99/max/sum/count)

pub mod buckets;
pub mod metrics;
pub mod normalized;

// Re-export main types and functions
pub use buckets::{BucketRow, DurationBucket, DurationBuckets};
pub use metrics::{as_millis_f64, TimeStatistics};
pub use normalized::{NormalizedTransaction, NormalizedTransactionReport, NormalizedTransactions};
