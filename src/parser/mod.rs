//! Frame record parsing and transaction reconstruction.
//!
//! This module handles:
//! - Reading dissected frame records (tshark JSON)
//! - Normalizing and fingerprinting MySQL queries
//! - Pairing requests with responses per connection
//! - Rebuilding (nested) transactions

pub mod fingerprint;
pub mod frame_parser;
pub mod frames;
pub mod query;
pub mod schema;
pub mod transactions;

// Re-export main types
pub use frame_parser::{Capture, FrameParser, Nesting};
pub use frames::{Frame, Frames};
pub use query::Query;
pub use schema::{read_frames, AttrValue, RawFrame};
pub use transactions::{Transaction, TransactionRegistry};
