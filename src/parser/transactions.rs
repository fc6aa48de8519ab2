//! Transactions and the registry that holds them.
//!
//! A transaction is an ordered group of frames on one connection, bounded by
//! `begin` and `commit`/`rollback`. It holds indices into the capture's
//! [`Frames`] rather than owning the frames, so durations measured after a
//! frame was attached are still visible.

use super::frames::{Frame, Frames};
use crate::utils::error::LookupError;
use chrono::TimeDelta;
use std::collections::{BTreeMap, HashSet};

/// Frames of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Index of the first frame in the capture
    id: usize,

    /// Frame indices in arrival order
    frames: Vec<usize>,
}

impl Transaction {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            frames: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn frame_indices(&self) -> &[usize] {
        &self.frames
    }

    pub fn add_frame(&mut self, index: usize) {
        self.frames.push(index);
    }

    /// Resolve the member frames against the capture
    pub fn frames<'a>(&'a self, frames: &'a Frames) -> impl Iterator<Item = &'a Frame> + 'a {
        self.frames.iter().map(move |&i| &frames[i])
    }

    /// How long the transaction actually took
    ///
    /// Span from the first to the last frame, plus the last frame's own
    /// query duration (the commit round trip).
    pub fn total_duration(&self, frames: &Frames) -> TimeDelta {
        match (self.frames.first(), self.frames.last()) {
            (Some(&first), Some(&last)) => {
                let last = &frames[last];
                last.time_relative - frames[first].time_relative + last.query_duration()
            }
            _ => TimeDelta::zero(),
        }
    }

    /// Sum of the measured durations of all member queries
    pub fn query_duration(&self, frames: &Frames) -> TimeDelta {
        self.frames(frames)
            .fold(TimeDelta::zero(), |total, f| total + f.query_duration())
    }

    /// Time spent outside measured query execution
    pub fn waste_duration(&self, frames: &Frames) -> TimeDelta {
        self.total_duration(frames) - self.query_duration(frames)
    }

    /// Share of the total duration not spent in queries, truncated
    pub fn waste_percentage(&self, frames: &Frames) -> i64 {
        let total = self.total_duration(frames);
        if total.is_zero() {
            return 0;
        }
        let query = self.query_duration(frames);
        let ratio = nanos(query) as f64 / nanos(total) as f64;
        100 - (ratio * 100.0) as i64
    }

    /// Fingerprints in frame order, optionally keeping only first occurrences
    pub fn fingerprint_slice(&self, frames: &Frames, deduplicate: bool) -> Vec<String> {
        let mut seen = HashSet::new();
        self.frames(frames)
            .filter_map(Frame::fingerprint)
            .filter(|fp| !deduplicate || seen.insert(*fp))
            .map(str::to_string)
            .collect()
    }

    /// Deduplicated fingerprint sequence, one per line
    pub fn fingerprint(&self, frames: &Frames) -> String {
        self.fingerprint_slice(frames, true)
            .iter()
            .map(|fp| format!("{}\n", fp))
            .collect()
    }

    /// Display text of every member query
    pub fn queries(&self, frames: &Frames) -> Vec<String> {
        self.frames(frames)
            .filter_map(|f| f.query.as_ref())
            .map(|q| q.text.clone())
            .collect()
    }
}

/// Nanosecond count of a capture-scale duration
pub(crate) fn nanos(duration: TimeDelta) -> i64 {
    duration.num_nanoseconds().unwrap_or(i64::MAX)
}

/// Transactions keyed by identity
///
/// Iteration is ordered by identity, i.e. by first frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRegistry {
    transactions: BTreeMap<usize, Transaction>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, transaction: Transaction) {
        self.transactions.insert(transaction.id, transaction);
    }

    pub fn delete(&mut self, id: usize) -> Option<Transaction> {
        self.transactions.remove(&id)
    }

    pub fn add_frame(&mut self, id: usize, index: usize) -> Result<(), LookupError> {
        self.transactions
            .get_mut(&id)
            .ok_or(LookupError::TransactionNotFound(id))?
            .add_frame(index);
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.transactions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }
}
