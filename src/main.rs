//! MySQL Trace Studio CLI
//!
//! Reads tshark JSON for a MySQL capture and reports on transactions,
//! query tags and connection concurrency.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use mysql_trace_studio::commands::{
    display_schema, display_version, execute_analyze, validate_args, AnalyzeArgs, ReportMode,
};
use mysql_trace_studio::utils::config::DEFAULT_INTERVAL_MS;

/// MySQL Trace Studio - transaction analysis for MySQL captures
#[derive(Parser, Debug)]
#[command(name = "mysql-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// tshark JSON input file (defaults to stdin)
    #[arg(short, long, global = true, env = "MYSQL_TRACE_INPUT")]
    input: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump reconstructed transactions and frames
    Debug,

    /// Count every key:value query tag
    CountTags,

    /// Count query fingerprints carrying a tag
    QueriesForTag {
        /// Tag key
        #[arg(short, long)]
        key: String,

        /// Tag value
        #[arg(long)]
        value: String,
    },

    /// Count tags on queries with a fingerprint
    TagsForFingerprint {
        /// Query fingerprint
        #[arg(short, long)]
        fingerprint: String,
    },

    /// Print every finished transaction
    Transactions,

    /// Group transactions by fingerprint sequence (JSON)
    NormalizedTransactions {
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Connection concurrency per time window (TSV)
    Concurrency {
        /// Window width in milliseconds
        #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
        interval_ms: u64,
    },

    /// Display report schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let mode = match cli.command {
        Commands::Debug => ReportMode::Debug,
        Commands::CountTags => ReportMode::CountTags,
        Commands::QueriesForTag { key, value } => ReportMode::QueriesForTag { key, value },
        Commands::TagsForFingerprint { fingerprint } => {
            ReportMode::TagsForFingerprint { fingerprint }
        }
        Commands::Transactions => ReportMode::Transactions,
        Commands::NormalizedTransactions { output } => {
            ReportMode::NormalizedTransactions { output }
        }
        Commands::Concurrency { interval_ms } => ReportMode::Concurrency { interval_ms },
        Commands::Schema { show } => {
            display_schema(show);
            return Ok(());
        }
        Commands::Version => {
            display_version();
            return Ok(());
        }
    };

    let args = AnalyzeArgs {
        input: cli.input,
        mode,
    };

    // Validate args first
    validate_args(&args)?;

    execute_analyze(args)
}
