//! Frame reconstruction engine.
//!
//! Walks the dissected frame records in arrival order and rebuilds:
//! - query durations, by pairing each request with the next response on
//!   the same connection
//! - transactions, by following begin/commit/rollback markers per
//!   connection, including nested begins
//!
//! Transactions whose evidence is incomplete (lost segments, or still open
//! when the capture ends) are dropped from the registry.

use super::frames::{Frame, Frames};
use super::query::Query;
use super::schema::RawFrame;
use super::transactions::{Transaction, TransactionRegistry};
use crate::utils::config::{
    ATTR_ACK_LOST_SEGMENT, ATTR_FRAME_NUMBER, ATTR_LOST_SEGMENT, ATTR_MYSQL_COMMAND,
    ATTR_MYSQL_PAYLOAD, ATTR_MYSQL_QUERY, ATTR_MYSQL_RESPONSE_CODE, ATTR_TCP_FIN, ATTR_TCP_RESET,
    ATTR_TCP_STREAM, ATTR_TIME_RELATIVE,
};
use crate::utils::error::{ParseError, ReconstructError};
use chrono::TimeDelta;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Nesting state of a connection's transaction
///
/// `Closed -> Open(0) -> Open(1) -> ... -> Open(0) -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Open { depth: u32 },
    Closed,
}

impl Nesting {
    /// A `begin` opens a transaction or nests one level deeper
    pub fn begin(self) -> Self {
        match self {
            Nesting::Closed => Nesting::Open { depth: 0 },
            Nesting::Open { depth } => Nesting::Open { depth: depth + 1 },
        }
    }

    /// A `commit`/`rollback` leaves one level; the outermost closes
    pub fn end(self) -> Self {
        match self {
            Nesting::Open { depth: 0 } | Nesting::Closed => Nesting::Closed,
            Nesting::Open { depth } => Nesting::Open { depth: depth - 1 },
        }
    }
}

/// The transaction currently open on a connection
#[derive(Debug, Clone, Copy)]
struct OpenTransaction {
    /// Registry identity: index of the first frame
    id: usize,
    nesting: Nesting,
}

/// Everything reconstructed from one capture
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub frames: Frames,
    pub transactions: TransactionRegistry,
    /// Connections that signalled FIN, RST or COM_QUIT
    pub closed_connections: HashSet<u64>,
}

/// Stateful per-connection parser over an ordered batch of frame records
#[derive(Debug, Default)]
pub struct FrameParser {
    frames: Frames,
    transactions: TransactionRegistry,
    /// Connection -> index of its latest unanswered request
    ///
    /// A new request overwrites an unanswered one, which then keeps a zero duration.
    unresponded: HashMap<u64, usize>,
    open_transactions: HashMap<u64, OpenTransaction>,
    closed_connections: HashSet<u64>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstruct a complete batch
    ///
    /// **Public** - main entry point for reconstruction
    ///
    /// # Errors
    /// * `ReconstructError::Parse` - an attribute failed numeric/boolean conversion
    /// * `ReconstructError::Lookup` - the registry lost an open transaction
    pub fn parse_raw_frames(records: &[RawFrame]) -> Result<Capture, ReconstructError> {
        let mut parser = Self::new();
        for record in records {
            parser.push_record(record)?;
        }
        Ok(parser.finish())
    }

    /// Frames reconstructed so far
    pub fn frames(&self) -> &Frames {
        &self.frames
    }

    /// Registry as it stands mid-batch (open transactions included)
    pub fn transactions(&self) -> &TransactionRegistry {
        &self.transactions
    }

    /// Process the next record in arrival order
    pub fn push_record(&mut self, record: &RawFrame) -> Result<&Frame, ReconstructError> {
        let index = self.frames.len();
        let frame = parse_scalars(record)?;
        let stream = frame.tcp_stream;
        let is_close = frame.is_close();
        self.frames.push(frame);

        if let Some(raw_query) = record.text_attr(ATTR_MYSQL_QUERY) {
            self.handle_query(index, stream, Query::normalize(raw_query))?;
        }

        if record.has_attr(ATTR_MYSQL_PAYLOAD) || record.has_attr(ATTR_MYSQL_RESPONSE_CODE) {
            self.handle_response(index, stream);
        }

        if record.flag_attr(ATTR_LOST_SEGMENT)? || record.flag_attr(ATTR_ACK_LOST_SEGMENT)? {
            self.abandon(stream);
        }

        if is_close {
            self.closed_connections.insert(stream);
        }

        Ok(&self.frames[index])
    }

    /// Sweep transactions still open and hand over the reconstruction
    pub fn finish(mut self) -> Capture {
        // connection killed, or capture ended before the commit
        for (stream, open) in self.open_transactions.drain() {
            debug!(
                "Dropping unterminated transaction {} on connection {}",
                open.id, stream
            );
            self.transactions.delete(open.id);
        }

        info!(
            "Reconstructed {} frames, {} complete transactions",
            self.frames.len(),
            self.transactions.len()
        );

        Capture {
            frames: self.frames,
            transactions: self.transactions,
            closed_connections: self.closed_connections,
        }
    }

    fn handle_query(
        &mut self,
        index: usize,
        stream: u64,
        query: Query,
    ) -> Result<(), ReconstructError> {
        let is_begin = query.is_begin();
        let is_end = query.is_end();
        if let Some(frame) = self.frames.get_mut(index) {
            frame.query = Some(query);
        }

        if let Some(previous) = self.unresponded.insert(stream, index) {
            debug!(
                "Request at frame {} on connection {} was never answered",
                previous, stream
            );
        }

        if is_begin {
            match self.open_transactions.get_mut(&stream) {
                Some(open) => {
                    open.nesting = open.nesting.begin();
                    debug!("Nested begin in transaction {} on connection {}", open.id, stream);
                }
                None => {
                    self.open_transactions.insert(
                        stream,
                        OpenTransaction {
                            id: index,
                            nesting: Nesting::Closed.begin(),
                        },
                    );
                    self.transactions.add(Transaction::new(index));
                    debug!("Opened transaction {} on connection {}", index, stream);
                }
            }
        }

        let Some(open) = self.open_transactions.get_mut(&stream) else {
            return Ok(());
        };
        self.transactions.add_frame(open.id, index)?;

        if is_end {
            open.nesting = open.nesting.end();
            if open.nesting == Nesting::Closed {
                debug!("Closed transaction {} on connection {}", open.id, stream);
                self.open_transactions.remove(&stream);
            }
        }

        Ok(())
    }

    fn handle_response(&mut self, index: usize, stream: u64) {
        let Some(request) = self.unresponded.remove(&stream) else {
            return;
        };

        let took = self.frames[index].time_relative - self.frames[request].time_relative;
        if let Some(query) = self
            .frames
            .get_mut(request)
            .and_then(|f| f.query.as_mut())
        {
            query.duration = took;
        }
    }

    /// Evidence was lost: the open transaction on this connection is unreliable
    fn abandon(&mut self, stream: u64) {
        if let Some(open) = self.open_transactions.remove(&stream) {
            debug!(
                "Lost segment on connection {}, abandoning transaction {}",
                stream, open.id
            );
            self.transactions.delete(open.id);
        }
    }
}

/// Sequence number, elapsed time, connection and flags of a record
fn parse_scalars(record: &RawFrame) -> Result<Frame, ParseError> {
    Ok(Frame {
        number: record.int_attr(ATTR_FRAME_NUMBER)?.unwrap_or_default(),
        time_relative: record
            .seconds_attr(ATTR_TIME_RELATIVE)?
            .unwrap_or_else(TimeDelta::zero),
        tcp_stream: record.int_attr(ATTR_TCP_STREAM)?.unwrap_or_default(),
        mysql_command: record.int_attr(ATTR_MYSQL_COMMAND)?,
        tcp_fin: record.bool_attr(ATTR_TCP_FIN)?,
        tcp_reset: record.bool_attr(ATTR_TCP_RESET)?,
        query: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_state_machine() {
        let state = Nesting::Closed.begin();
        assert_eq!(state, Nesting::Open { depth: 0 });

        let nested = state.begin();
        assert_eq!(nested, Nesting::Open { depth: 1 });
        assert_eq!(nested.end(), Nesting::Open { depth: 0 });
        assert_eq!(nested.end().end(), Nesting::Closed);
        assert_eq!(Nesting::Closed.end(), Nesting::Closed);
    }

    #[test]
    fn test_parse_scalars() {
        let record = RawFrame::from_pairs([
            ("frame.number", "12"),
            ("frame.time_relative", "1.250000000"),
            ("tcp.stream", "3"),
            ("mysql.command", "1"),
            ("tcp.flags.fin", "0"),
        ]);

        let frame = parse_scalars(&record).unwrap();
        assert_eq!(frame.number, 12);
        assert_eq!(frame.time_relative, TimeDelta::milliseconds(1250));
        assert_eq!(frame.tcp_stream, 3);
        assert_eq!(frame.mysql_command, Some(1));
        assert!(frame.is_close());
    }

    #[test]
    fn test_parse_scalars_rejects_bad_stream() {
        let record = RawFrame::from_pairs([("tcp.stream", "three")]);
        match parse_scalars(&record) {
            Err(ParseError::InvalidAttribute { field, value, .. }) => {
                assert_eq!(field, "tcp.stream");
                assert_eq!(value, "three");
            }
            other => panic!("expected InvalidAttribute, got {:?}", other),
        }
    }

    #[test]
    fn test_query_and_response_in_same_frame() {
        let record = RawFrame::from_pairs([
            ("tcp.stream", "1"),
            ("mysql.query", "SELECT 1"),
            ("mysql.response_code", "0"),
        ]);

        let mut parser = FrameParser::new();
        let frame = parser.push_record(&record).unwrap();
        assert_eq!(frame.query_duration(), TimeDelta::zero());
        assert!(parser.unresponded.is_empty());
    }

    #[test]
    fn test_registry_is_authoritative_mid_batch() {
        let mut parser = FrameParser::new();
        parser
            .push_record(&RawFrame::from_pairs([("tcp.stream", "1"), ("mysql.query", "BEGIN")]))
            .unwrap();
        assert!(parser.transactions().contains(0));

        let capture = parser.finish();
        assert!(capture.transactions.is_empty());
        assert_eq!(capture.frames.len(), 1);
    }
}
