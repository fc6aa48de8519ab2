//! Fixed-interval connection concurrency windows.
//!
//! Frames are assigned to windows of `interval` width by elapsed time. Each
//! window counts the connections open during it (carried forward from the
//! previous window until closed), the connections first seen in it, and the
//! connections closed in it. Windows only move forward.

use crate::parser::transactions::nanos;
use crate::parser::Frame;
use crate::utils::error::{BucketError, OrderingError};
use chrono::TimeDelta;
use log::{debug, info};
use std::collections::HashSet;

/// One time window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationBucket {
    /// Connections considered open during this window
    streams: HashSet<u64>,
    /// Connections first observed in this window
    new_streams: HashSet<u64>,
    /// Connections closed in this window
    closed_streams: HashSet<u64>,
}

impl DurationBucket {
    /// Seed a window from its predecessor
    ///
    /// Open connections carry over until their FIN/RST/quit; anything already
    /// in the global closed set is left behind.
    fn seeded(previous: &DurationBucket, closed: &HashSet<u64>) -> Self {
        let mut bucket = Self::default();
        for &stream in &previous.streams {
            if closed.contains(&stream) {
                debug!(
                    "Connection {} was closed but still open in the previous window",
                    stream
                );
                continue;
            }
            bucket.streams.insert(stream);
        }
        bucket
    }

    fn add_frame(&mut self, frame: &Frame, seen: &mut HashSet<u64>, closed: &mut HashSet<u64>) {
        let stream = frame.tcp_stream;

        if frame.is_close() {
            self.streams.remove(&stream);
            // only the first close counts
            if closed.insert(stream) {
                self.closed_streams.insert(stream);
            }
            return;
        }

        // evidence after close is discarded
        if closed.contains(&stream) {
            return;
        }

        if seen.insert(stream) {
            self.new_streams.insert(stream);
        }
        self.streams.insert(stream);
    }

    pub fn count_concurrent(&self) -> usize {
        self.streams.len()
    }

    pub fn count_new(&self) -> usize {
        self.new_streams.len()
    }

    pub fn count_closed(&self) -> usize {
        self.closed_streams.len()
    }

    pub fn is_open(&self, stream: u64) -> bool {
        self.streams.contains(&stream)
    }

    pub fn is_new(&self, stream: u64) -> bool {
        self.new_streams.contains(&stream)
    }

    pub fn is_closed(&self, stream: u64) -> bool {
        self.closed_streams.contains(&stream)
    }
}

/// One row of the concurrency report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRow {
    /// Start of the window
    pub elapsed: TimeDelta,
    pub concurrent: usize,
    pub new: usize,
    pub closed: usize,
}

/// The ordered window sequence for one capture
#[derive(Debug, Clone)]
pub struct DurationBuckets {
    interval: TimeDelta,
    buckets: Vec<DurationBucket>,
    /// The most recent window index; frames must not go back before it
    index: usize,
    closed_streams: HashSet<u64>,
    seen_streams: HashSet<u64>,
}

impl DurationBuckets {
    /// Create an engine with the given window width
    ///
    /// # Errors
    /// * `BucketError::NonPositiveWidth` - zero or negative width
    pub fn new(interval: TimeDelta) -> Result<Self, BucketError> {
        if interval <= TimeDelta::zero() {
            return Err(BucketError::NonPositiveWidth(nanos(interval)));
        }

        Ok(Self {
            interval,
            buckets: Vec::new(),
            index: 0,
            closed_streams: HashSet::new(),
            seen_streams: HashSet::new(),
        })
    }

    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    pub fn buckets(&self) -> &[DurationBucket] {
        &self.buckets
    }

    /// Window index for an elapsed time
    pub fn bucket(&self, elapsed: TimeDelta) -> usize {
        (nanos(elapsed).max(0) / nanos(self.interval)) as usize
    }

    /// Apply one frame
    ///
    /// # Errors
    /// * `OrderingError::FrameInPast` - the frame's window was already passed;
    ///   no window is touched
    pub fn add_frame(&mut self, frame: &Frame) -> Result<(), OrderingError> {
        let idx = self.bucket(frame.time_relative);
        if idx < self.index {
            return Err(OrderingError::FrameInPast {
                window: idx,
                current: self.index,
            });
        }

        if self.buckets.is_empty() {
            self.buckets.push(DurationBucket::default());
        }

        // expand the windows and move the pointer
        for i in self.index..idx {
            let next = DurationBucket::seeded(&self.buckets[i], &self.closed_streams);
            self.buckets.push(next);
        }
        self.index = idx;

        self.buckets[idx].add_frame(frame, &mut self.seen_streams, &mut self.closed_streams);
        Ok(())
    }

    /// Apply frames in order, stopping at the first one in the past
    pub fn add_frames<'a>(
        &mut self,
        frames: impl IntoIterator<Item = &'a Frame>,
    ) -> Result<(), OrderingError> {
        for frame in frames {
            self.add_frame(frame)?;
        }
        info!(
            "Built {} windows of {}ms",
            self.buckets.len(),
            self.interval.num_milliseconds()
        );
        Ok(())
    }

    /// Report rows in window order
    pub fn rows(&self) -> Vec<BucketRow> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(idx, bucket)| BucketRow {
                elapsed: TimeDelta::nanoseconds(nanos(self.interval).saturating_mul(idx as i64)),
                concurrent: bucket.count_concurrent(),
                new: bucket.count_new(),
                closed: bucket.count_closed(),
            })
            .collect()
    }
}
