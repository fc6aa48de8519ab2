//! Descriptive statistics over duration samples.

use crate::parser::transactions::nanos;
use crate::utils::error::StatsError;
use chrono::TimeDelta;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Summary of one duration sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStatistics {
    pub min: TimeDelta,
    pub mean: TimeDelta,
    pub p95: TimeDelta,
    pub p99: TimeDelta,
    pub max: TimeDelta,
    pub sum: TimeDelta,
    pub count: usize,
}

impl TimeStatistics {
    /// Summarize a sample
    ///
    /// # Errors
    /// * `StatsError::EmptySample` - no durations to summarize
    pub fn from_durations(durations: &[TimeDelta]) -> Result<Self, StatsError> {
        let mut sorted: Vec<i64> = durations.iter().map(|&d| nanos(d)).collect();
        sorted.sort_unstable();

        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Err(StatsError::EmptySample);
        };

        let sum: i128 = sorted.iter().map(|&n| n as i128).sum();
        let mean = sum / sorted.len() as i128;

        Ok(Self {
            min: TimeDelta::nanoseconds(min),
            mean: TimeDelta::nanoseconds(mean as i64),
            p95: TimeDelta::nanoseconds(percentile(&sorted, 95.0)),
            p99: TimeDelta::nanoseconds(percentile(&sorted, 99.0)),
            max: TimeDelta::nanoseconds(max),
            sum: TimeDelta::nanoseconds(sum.clamp(i64::MIN as i128, i64::MAX as i128) as i64),
            count: sorted.len(),
        })
    }
}

/// Percentile of a sorted, non-empty sample
///
/// Rank `p/100 * n`: a whole rank picks that element, otherwise the two
/// neighbours are averaged.
fn percentile(sorted: &[i64], percent: f64) -> i64 {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = percent * sorted.len() as f64 / 100.0;
    let whole = rank as usize;

    if rank.fract() == 0.0 {
        sorted[whole.max(1) - 1]
    } else if whole >= 1 {
        ((sorted[whole - 1] as i128 + sorted[whole] as i128) / 2) as i64
    } else {
        sorted[0]
    }
}

/// Milliseconds as a float, the unit of every JSON report
pub fn as_millis_f64(duration: TimeDelta) -> f64 {
    nanos(duration) as f64 / 1_000_000.0
}

impl Serialize for TimeStatistics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TimeStatistics", 7)?;
        state.serialize_field("min", &as_millis_f64(self.min))?;
        state.serialize_field("mean", &as_millis_f64(self.mean))?;
        state.serialize_field("p95", &as_millis_f64(self.p95))?;
        state.serialize_field("p99", &as_millis_f64(self.p99))?;
        state.serialize_field("max", &as_millis_f64(self.max))?;
        state.serialize_field("sum", &as_millis_f64(self.sum))?;
        state.serialize_field("count", &self.count)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[i64]) -> Vec<TimeDelta> {
        values.iter().map(|&v| TimeDelta::milliseconds(v)).collect()
    }

    #[test]
    fn test_empty_sample() {
        assert_eq!(
            TimeStatistics::from_durations(&[]),
            Err(StatsError::EmptySample)
        );
    }

    #[test]
    fn test_single_sample() {
        let stats = TimeStatistics::from_durations(&ms(&[35])).unwrap();
        assert_eq!(stats.min, TimeDelta::milliseconds(35));
        assert_eq!(stats.p95, TimeDelta::milliseconds(35));
        assert_eq!(stats.p99, TimeDelta::milliseconds(35));
        assert_eq!(stats.sum, TimeDelta::milliseconds(35));
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_summary() {
        let stats = TimeStatistics::from_durations(&ms(&[40, 10, 30, 20])).unwrap();
        assert_eq!(stats.min, TimeDelta::milliseconds(10));
        assert_eq!(stats.max, TimeDelta::milliseconds(40));
        assert_eq!(stats.mean, TimeDelta::milliseconds(25));
        assert_eq!(stats.sum, TimeDelta::milliseconds(100));
        // rank 3.8 -> mean of 3rd and 4th
        assert_eq!(stats.p95, TimeDelta::milliseconds(35));
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn test_whole_rank_percentile() {
        let sample: Vec<i64> = (1..=100).collect();
        assert_eq!(percentile(&sample, 95.0), 95);
        assert_eq!(percentile(&sample, 99.0), 99);
    }

    #[test]
    fn test_serialize_in_millis() {
        let stats = TimeStatistics::from_durations(&ms(&[1, 2])).unwrap();
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["min"], 1.0);
        assert_eq!(json["max"], 2.0);
        assert_eq!(json["mean"], 1.5);
        assert_eq!(json["count"], 2);
    }
}
