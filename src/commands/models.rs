use crate::utils::config::DEFAULT_INTERVAL_MS;
use std::path::PathBuf;

/// Which report to produce from a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportMode {
    /// Dump the registry and frames
    Debug,

    /// Occurrences of every tag
    CountTags,

    /// Fingerprint occurrences among queries with one tag
    QueriesForTag { key: String, value: String },

    /// Tag occurrences among queries with one fingerprint
    TagsForFingerprint { fingerprint: String },

    /// Per-transaction durations and fingerprints
    Transactions,

    /// Transaction groups with duration statistics, as JSON
    NormalizedTransactions { output: Option<PathBuf> },

    /// Connection concurrency per window, as TSV
    Concurrency { interval_ms: u64 },
}

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// tshark JSON input; stdin when absent
    pub input: Option<PathBuf>,

    /// Report to produce
    pub mode: ReportMode,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: None,
            mode: ReportMode::Concurrency {
                interval_ms: DEFAULT_INTERVAL_MS,
            },
        }
    }
}
