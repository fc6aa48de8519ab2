//! JSON report output writer.
//!
//! Writes transaction group reports as pretty-printed JSON, to a file or a string.

use crate::aggregator::NormalizedTransactionReport;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write group reports to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(
    reports: &[NormalizedTransactionReport],
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, reports).map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written successfully ({} groups, {} bytes)",
        reports.len(),
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Render group reports as a pretty JSON string
pub fn report_to_string(reports: &[NormalizedTransactionReport]) -> Result<String, OutputError> {
    serde_json::to_string_pretty(reports).map_err(OutputError::SerializationFailed)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TimeStatistics;
    use chrono::TimeDelta;

    fn create_test_report() -> NormalizedTransactionReport {
        let stats = TimeStatistics::from_durations(&[TimeDelta::milliseconds(35)]).unwrap();
        NormalizedTransactionReport {
            fingerprint: vec!["begin".to_string(), "commit".to_string()],
            example: vec!["begin".to_string(), "commit".to_string()],
            waste_percentage: 57.1,
            tags: vec!["controller:users".to_string()],
            query_statistics: stats,
            transaction_statistics: stats,
            waste_statistics: stats,
        }
    }

    #[test]
    fn test_write_report() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        write_report(&[create_test_report()], temp_file.path()).unwrap();

        let written: serde_json::Value =
            serde_json::from_reader(File::open(temp_file.path()).unwrap()).unwrap();
        assert_eq!(written[0]["fingerprint"][0], "begin");
        assert_eq!(written[0]["example_query"][1], "commit");
        assert_eq!(written[0]["transaction_statistics"]["mean"], 35.0);
        assert_eq!(written[0]["waste_statistics"]["count"], 1);
    }

    #[test]
    fn test_report_to_string_empty() {
        assert_eq!(report_to_string(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/report.json");

        write_report(&[create_test_report()], &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
