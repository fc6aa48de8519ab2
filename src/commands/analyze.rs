//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Reads dissected frame records (file or stdin)
//! 2. Reconstructs frames, query durations and transactions
//! 3. Renders the requested report

use super::models::{AnalyzeArgs, ReportMode};
use crate::aggregator::{DurationBuckets, NormalizedTransactions};
use crate::output::{concurrency_tsv, format_counts, report_to_string, transaction_report, write_report};
use crate::parser::{read_frames, Capture, FrameParser, RawFrame};
use crate::utils::config::MAX_INTERVAL_MS;
use anyhow::{Context, Result};
use chrono::TimeDelta;
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input read / JSON errors
/// * Attribute conversion errors (the whole run is aborted)
/// * Out-of-order frames in concurrency mode
/// * Report write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Reading frame records...");
    let records = load_records(args.input.as_deref())?;
    debug!("Read {} frame records", records.len());

    info!("Step 2/3: Reconstructing transactions...");
    let capture = FrameParser::parse_raw_frames(&records)
        .context("Failed to reconstruct frames")?;

    info!("Step 3/3: Rendering report...");
    let rendered = render_report(&args.mode, &capture)?;
    print!("{}", rendered);

    info!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Render one report mode from a reconstructed capture
///
/// **Public** - the output side of execute_analyze, without any I/O on stdin
pub fn render_report(mode: &ReportMode, capture: &Capture) -> Result<String> {
    let rendered = match mode {
        ReportMode::Debug => format!("{:#?}\n{:#?}\n", capture.transactions, capture.frames),

        ReportMode::CountTags => format_counts(&capture.frames.count_by_tag()),

        ReportMode::QueriesForTag { key, value } => {
            format_counts(&capture.frames.queries_for_tag(key, value))
        }

        ReportMode::TagsForFingerprint { fingerprint } => format!(
            "Fingerprint: {}\n{}",
            fingerprint,
            format_counts(&capture.frames.tags_for_fingerprint(fingerprint))
        ),

        ReportMode::Transactions => transaction_report(&capture.transactions, &capture.frames),

        ReportMode::NormalizedTransactions { output } => {
            let groups =
                NormalizedTransactions::from_registry(&capture.transactions, &capture.frames);
            let reports = groups
                .reports()
                .context("Failed to summarize transaction groups")?;

            match output {
                Some(path) => {
                    write_report(&reports, path).context("Failed to write report JSON")?;
                    info!("✓ Report written to: {}", path.display());
                    String::new()
                }
                None => report_to_string(&reports)? + "\n",
            }
        }

        ReportMode::Concurrency { interval_ms } => {
            let interval = TimeDelta::milliseconds(*interval_ms as i64);
            let mut buckets = DurationBuckets::new(interval)?;
            buckets
                .add_frames(&capture.frames)
                .context("Frames must be in arrival order")?;
            concurrency_tsv(&buckets.rows())
        }
    };

    Ok(rendered)
}

/// Read records from a file, or stdin when no path is given
fn load_records(input: Option<&Path>) -> Result<Vec<RawFrame>> {
    match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            read_frames(BufReader::new(file))
                .with_context(|| format!("Failed to read frame records from {}", path.display()))
        }
        None => read_frames(io::stdin().lock()).context("Failed to read frame records from stdin"),
    }
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if let Some(path) = &args.input {
        if !path.is_file() {
            anyhow::bail!("Input file does not exist: {}", path.display());
        }
    }

    match &args.mode {
        ReportMode::QueriesForTag { key, .. } if key.is_empty() => {
            anyhow::bail!("Tag key cannot be empty");
        }
        ReportMode::TagsForFingerprint { fingerprint } if fingerprint.is_empty() => {
            anyhow::bail!("Fingerprint cannot be empty");
        }
        ReportMode::Concurrency { interval_ms } if *interval_ms == 0 => {
            anyhow::bail!("Interval must be greater than 0");
        }
        ReportMode::Concurrency { interval_ms } if *interval_ms > MAX_INTERVAL_MS => {
            anyhow::bail!("Interval is too large (max {}ms)", MAX_INTERVAL_MS);
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_default() {
        assert!(validate_args(&AnalyzeArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_zero_interval() {
        let args = AnalyzeArgs {
            mode: ReportMode::Concurrency { interval_ms: 0 },
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_interval_too_large() {
        let args = AnalyzeArgs {
            mode: ReportMode::Concurrency {
                interval_ms: MAX_INTERVAL_MS + 1,
            },
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_empty_tag_key() {
        let args = AnalyzeArgs {
            mode: ReportMode::QueriesForTag {
                key: String::new(),
                value: "users".to_string(),
            },
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_missing_input() {
        let args = AnalyzeArgs {
            input: Some("/definitely/not/here.json".into()),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_load_records_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp.path(),
            r#"[{"_source": {"layers": {"tcp.stream": ["1"]}}}]"#,
        )
        .unwrap();

        let records = load_records(Some(temp.path())).unwrap();
        assert_eq!(records.len(), 1);
    }
}
