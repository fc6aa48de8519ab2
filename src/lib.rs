//! MySQL Trace Studio
//!
//! Reconstructs MySQL transactions and connection behaviour from
//! dissected packet captures, and reports on their timing.
//!
//! This crate provides the core implementation for the
//! `mysql-trace` CLI tool.
//!
//! ## Getting Started
//!
//! Dissect a capture with tshark and pipe it in:
//!
//! ```bash
//! tshark -r mysql.pcap -Y mysql -T json \
//!     -e tcp.analysis.lost_segment -e tcp.analysis.ack_lost_segment \
//!     -e frame.number -e frame.time_relative -e tcp.stream \
//!     -e tcp.flags.fin -e tcp.flags.reset -e mysql.command \
//!     -e mysql.query -e mysql.payload -e mysql.response_code \
//!   | mysql-trace normalized-transactions
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
