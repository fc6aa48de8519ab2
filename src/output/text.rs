//! Plain-text report rendering.
//!
//! Everything here renders to a `String`; the command layer decides where it goes.

use crate::aggregator::BucketRow;
use crate::parser::transactions::nanos;
use crate::parser::{Frames, TransactionRegistry};
use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Compact human duration: `0s`, `850µs`, `250ms`, `1.5s`
pub fn format_elapsed(duration: TimeDelta) -> String {
    let n = nanos(duration);
    match n.unsigned_abs() {
        0 => "0s".to_string(),
        1..=999 => format!("{}ns", n),
        1_000..=999_999 => format!("{}µs", n as f64 / 1e3),
        1_000_000..=999_999_999 => format!("{}ms", n as f64 / 1e6),
        _ => format!("{}s", n as f64 / 1e9),
    }
}

/// `count<TAB>key` lines, most frequent first
pub fn format_counts(counts: &BTreeMap<String, usize>) -> String {
    let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    for (key, count) in entries {
        let _ = writeln!(out, "{}\t{}", count, key);
    }
    out
}

/// Tab-separated concurrency report with a header row
pub fn concurrency_tsv(rows: &[BucketRow]) -> String {
    let mut out = String::from("Time\tConcurrent\tNew\tClosed\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}",
            format_elapsed(row.elapsed),
            row.concurrent,
            row.new,
            row.closed
        );
    }
    out
}

/// Human-readable report of every finished transaction
pub fn transaction_report(registry: &TransactionRegistry, frames: &Frames) -> String {
    let mut out = String::new();

    for tx in registry.iter() {
        let _ = writeln!(out, "---");
        let _ = writeln!(out, "Total Duration: {}", format_elapsed(tx.total_duration(frames)));
        let _ = writeln!(out, "Query Duration: {}", format_elapsed(tx.query_duration(frames)));
        let _ = writeln!(out, "Waste Duration: {}", format_elapsed(tx.waste_duration(frames)));
        let _ = writeln!(out, "Waste Percentage: {}", tx.waste_percentage(frames));
        let _ = writeln!(out, "Transaction Fingerprint:");
        let _ = writeln!(out, "{}", tx.fingerprint(frames));
        let _ = writeln!(out, "Example (Fingerprinted):");
        for frame in tx.frames(frames) {
            match &frame.query {
                Some(q) if q.fingerprint.is_empty() => {
                    let _ = writeln!(out, "{}", q.text);
                }
                Some(q) => {
                    let _ = writeln!(out, "{}", q.fingerprint);
                }
                None => {}
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(TimeDelta::zero()), "0s");
        assert_eq!(format_elapsed(TimeDelta::nanoseconds(500)), "500ns");
        assert_eq!(format_elapsed(TimeDelta::microseconds(850)), "850µs");
        assert_eq!(format_elapsed(TimeDelta::milliseconds(250)), "250ms");
        assert_eq!(format_elapsed(TimeDelta::milliseconds(1500)), "1.5s");
        assert_eq!(format_elapsed(TimeDelta::milliseconds(-20)), "-20ms");
    }

    #[test]
    fn test_format_counts_orders_by_frequency() {
        let counts: BTreeMap<String, usize> = [("b:1", 1), ("a:1", 3), ("c:1", 1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        assert_eq!(format_counts(&counts), "3\ta:1\n1\tb:1\n1\tc:1\n");
    }

    #[test]
    fn test_concurrency_tsv() {
        let rows = [
            BucketRow {
                elapsed: TimeDelta::zero(),
                concurrent: 1,
                new: 1,
                closed: 0,
            },
            BucketRow {
                elapsed: TimeDelta::milliseconds(100),
                concurrent: 0,
                new: 0,
                closed: 1,
            },
        ];

        assert_eq!(
            concurrency_tsv(&rows),
            "Time\tConcurrent\tNew\tClosed\n0s\t1\t1\t0\n100ms\t0\t0\t1\n"
        );
    }
}
