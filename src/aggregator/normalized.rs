//! Grouping of finished transactions by shape.
//!
//! Transactions whose deduplicated fingerprint sequences match are the same
//! kind of unit of work. Each group accumulates one total/query/waste
//! duration per member and the union of member tags.

use super::metrics::{as_millis_f64, TimeStatistics};
use crate::parser::{Frames, Transaction, TransactionRegistry};
use crate::utils::error::StatsError;
use chrono::TimeDelta;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Accumulated samples for one transaction shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTransaction {
    /// Deduplicated fingerprint sequence (group identity)
    pub fingerprint: Vec<String>,
    /// Full fingerprint sequence of the first member
    pub example: Vec<String>,
    tags: BTreeSet<String>,
    query_durations: Vec<TimeDelta>,
    transaction_durations: Vec<TimeDelta>,
    waste_durations: Vec<TimeDelta>,
}

impl NormalizedTransaction {
    fn new(fingerprint: Vec<String>, example: Vec<String>) -> Self {
        Self {
            fingerprint,
            example,
            tags: BTreeSet::new(),
            query_durations: Vec::new(),
            transaction_durations: Vec::new(),
            waste_durations: Vec::new(),
        }
    }

    fn add(&mut self, transaction: &Transaction, frames: &Frames) {
        for frame in transaction.frames(frames) {
            if let Some(query) = &frame.query {
                self.tags.extend(query.tag_labels());
            }
        }

        self.query_durations.push(transaction.query_duration(frames));
        self.transaction_durations.push(transaction.total_duration(frames));
        self.waste_durations.push(transaction.waste_duration(frames));
    }

    /// Number of member transactions
    pub fn count(&self) -> usize {
        self.transaction_durations.len()
    }

    /// Sorted `key:value` tags seen across members
    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    /// Summarize the three duration samples
    pub fn summarize(&self) -> Result<NormalizedTransactionReport, StatsError> {
        let query_statistics = TimeStatistics::from_durations(&self.query_durations)?;
        let transaction_statistics = TimeStatistics::from_durations(&self.transaction_durations)?;
        let waste_statistics = TimeStatistics::from_durations(&self.waste_durations)?;

        let mean_total = as_millis_f64(transaction_statistics.mean);
        let waste_percentage = if mean_total == 0.0 {
            0.0
        } else {
            as_millis_f64(waste_statistics.mean) / mean_total * 100.0
        };

        Ok(NormalizedTransactionReport {
            fingerprint: self.fingerprint.clone(),
            example: self.example.clone(),
            waste_percentage,
            tags: self.tags(),
            query_statistics,
            transaction_statistics,
            waste_statistics,
        })
    }
}

/// Output record for one transaction group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTransactionReport {
    pub fingerprint: Vec<String>,
    #[serde(rename = "example_query")]
    pub example: Vec<String>,
    pub waste_percentage: f64,
    pub tags: Vec<String>,
    pub query_statistics: TimeStatistics,
    pub transaction_statistics: TimeStatistics,
    pub waste_statistics: TimeStatistics,
}

/// All transaction groups, in order of first appearance
#[derive(Debug, Clone, Default)]
pub struct NormalizedTransactions {
    groups: Vec<NormalizedTransaction>,
    by_fingerprint: HashMap<Vec<String>, usize>,
}

impl NormalizedTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group every transaction left in the registry
    pub fn from_registry(registry: &TransactionRegistry, frames: &Frames) -> Self {
        let mut groups = Self::new();
        for transaction in registry.iter() {
            groups.add(transaction, frames);
        }
        debug!(
            "Grouped {} transactions into {} shapes",
            registry.len(),
            groups.len()
        );
        groups
    }

    pub fn add(&mut self, transaction: &Transaction, frames: &Frames) {
        let fingerprint = transaction.fingerprint_slice(frames, true);

        let slot = match self.by_fingerprint.get(&fingerprint) {
            Some(&slot) => slot,
            None => {
                let example = transaction.fingerprint_slice(frames, false);
                self.groups
                    .push(NormalizedTransaction::new(fingerprint.clone(), example));
                self.by_fingerprint.insert(fingerprint, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        self.groups[slot].add(transaction, frames);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedTransaction> {
        self.groups.iter()
    }

    /// Summaries for every group
    pub fn reports(&self) -> Result<Vec<NormalizedTransactionReport>, StatsError> {
        self.groups.iter().map(NormalizedTransaction::summarize).collect()
    }
}
