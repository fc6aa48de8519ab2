//! Configuration and constants for the CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Attribute names emitted by tshark for each dissected frame.
// tshark -r mysql.pcap -Y mysql -T json -e frame.number -e frame.time_relative ...
pub const ATTR_FRAME_NUMBER: &str = "frame.number";
pub const ATTR_TIME_RELATIVE: &str = "frame.time_relative";
pub const ATTR_TCP_STREAM: &str = "tcp.stream";
pub const ATTR_MYSQL_COMMAND: &str = "mysql.command";
pub const ATTR_TCP_FIN: &str = "tcp.flags.fin";
pub const ATTR_TCP_RESET: &str = "tcp.flags.reset";
pub const ATTR_MYSQL_QUERY: &str = "mysql.query";
pub const ATTR_MYSQL_PAYLOAD: &str = "mysql.payload";
pub const ATTR_MYSQL_RESPONSE_CODE: &str = "mysql.response_code";
pub const ATTR_LOST_SEGMENT: &str = "tcp.analysis.lost_segment";
pub const ATTR_ACK_LOST_SEGMENT: &str = "tcp.analysis.ack_lost_segment";

/// MySQL COM_QUIT: the client is disconnecting
pub const MYSQL_COMMAND_QUIT: u32 = 1;

/// Tag keys dropped from query comments: not useful or high cardinality
pub const TAG_DENYLIST: &[&str] = &["request_id", "server", "application", "deployed_to"];

// Fingerprints with transaction meaning
pub const FINGERPRINT_BEGIN: &str = "begin";
pub const FINGERPRINT_COMMIT: &str = "commit";
pub const FINGERPRINT_ROLLBACK: &str = "rollback";
pub const NO_FINGERPRINT: &str = "E_NO_FINGERPRINT";

/// Default window width for the concurrency report
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
pub const MAX_INTERVAL_MS: u64 = 3_600_000; // one hour
