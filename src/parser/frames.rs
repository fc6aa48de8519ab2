//! Reconstructed frames and frame-level tag/fingerprint reports.

use super::query::Query;
use crate::utils::config::MYSQL_COMMAND_QUIT;
use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::ops::Index;

/// One event derived from a single captured packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Capture sequence number (`frame.number`)
    pub number: u64,

    /// Elapsed time since capture start
    pub time_relative: TimeDelta,

    /// Connection identity (`tcp.stream`)
    pub tcp_stream: u64,

    /// MySQL command code, when the frame carries one
    pub mysql_command: Option<u32>,

    pub tcp_fin: bool,
    pub tcp_reset: bool,

    pub query: Option<Query>,
}

impl Frame {
    /// FIN, RST or COM_QUIT: the connection is going away
    pub fn is_close(&self) -> bool {
        self.tcp_fin || self.tcp_reset || self.mysql_command == Some(MYSQL_COMMAND_QUIT)
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.query.as_ref().map(|q| q.fingerprint.as_str())
    }

    /// Measured query duration; zero for frames without an answered query
    pub fn query_duration(&self) -> TimeDelta {
        self.query.as_ref().map_or(TimeDelta::zero(), |q| q.duration)
    }
}

/// The ordered frame sequence of a whole capture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frames(Vec<Frame>);

impl Frames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.0.push(frame);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.0.iter()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.0.get_mut(index)
    }

    fn queries(&self) -> impl Iterator<Item = &Query> {
        self.0.iter().filter_map(|f| f.query.as_ref())
    }

    /// Occurrences of every `key:value` tag
    pub fn count_by_tag(&self) -> BTreeMap<String, usize> {
        let mut result = BTreeMap::new();
        for label in self.queries().flat_map(Query::tag_labels) {
            *result.entry(label).or_insert(0) += 1;
        }
        result
    }

    /// Fingerprint occurrences among queries tagged `key:value`
    pub fn queries_for_tag(&self, key: &str, value: &str) -> BTreeMap<String, usize> {
        let mut result = BTreeMap::new();
        for query in self.queries() {
            if query.tags.get(key).map(String::as_str) == Some(value) {
                *result.entry(query.fingerprint.clone()).or_insert(0) += 1;
            }
        }
        result
    }

    /// Tag occurrences among queries with the given fingerprint
    pub fn tags_for_fingerprint(&self, fingerprint: &str) -> BTreeMap<String, usize> {
        let mut result = BTreeMap::new();
        for label in self
            .queries()
            .filter(|q| q.fingerprint == fingerprint)
            .flat_map(Query::tag_labels)
        {
            *result.entry(label).or_insert(0) += 1;
        }
        result
    }
}

impl Index<usize> for Frames {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Frames {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Frame> for Frames {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(stream: u64, query: Option<&str>) -> Frame {
        Frame {
            number: 0,
            time_relative: TimeDelta::zero(),
            tcp_stream: stream,
            mysql_command: None,
            tcp_fin: false,
            tcp_reset: false,
            query: query.map(Query::normalize),
        }
    }

    fn sample() -> Frames {
        [
            frame(1, Some("SELECT 1 /* controller:users,action:index */")),
            frame(1, Some("SELECT 2 /* controller:users,action:show */")),
            frame(2, Some("UPDATE t SET a = 1 /* controller:posts */")),
            frame(2, None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_count_by_tag() {
        let counts = sample().count_by_tag();
        let expected: BTreeMap<String, usize> = [
            ("action:index", 1),
            ("action:show", 1),
            ("controller:posts", 1),
            ("controller:users", 2),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_queries_for_tag() {
        let counts = sample().queries_for_tag("controller", "users");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["select ?"], 2);

        assert!(sample().queries_for_tag("controller", "").is_empty());
    }

    #[test]
    fn test_tags_for_fingerprint() {
        let counts = sample().tags_for_fingerprint("update t set a = ?");
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["controller:posts"], 1);
    }

    #[test]
    fn test_is_close() {
        let mut f = frame(1, None);
        assert!(!f.is_close());
        f.mysql_command = Some(MYSQL_COMMAND_QUIT);
        assert!(f.is_close());
        f.mysql_command = Some(3);
        f.tcp_reset = true;
        assert!(f.is_close());
    }
}
