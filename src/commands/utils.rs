use crate::utils::config::SCHEMA_VERSION;

/// Display report schema information
pub fn display_schema(show_details: bool) {
    println!("MySQL Trace Studio Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("normalized-transactions (JSON array, one object per group):");
        println!("  fingerprint: string[]        - Deduplicated fingerprint sequence");
        println!("  example_query: string[]      - Fingerprints of the first member, in order");
        println!("  waste_percentage: number     - Mean waste / mean total duration x 100");
        println!("  tags: string[]               - Sorted key:value tags across members");
        println!("  query_statistics: object     - Summed query durations (ms)");
        println!("  transaction_statistics: object - Total transaction durations (ms)");
        println!("  waste_statistics: object     - Total minus query durations (ms)");
        println!("    min, mean, p95, p99, max, sum: number");
        println!("    count: number");
        println!();
        println!("concurrency (TSV): Time, Concurrent, New, Closed");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("MySQL Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Transaction and connection analysis for dissected MySQL captures.");
}
