//! MySQL query normalization.
//!
//! Applications annotate queries with a trailing comment such as
//! `SELECT ... /* controller:users,action:index */`. The comment is split
//! off into tags, and the statement is fingerprinted for grouping.

use super::fingerprint::fingerprint;
use crate::utils::config::{
    FINGERPRINT_BEGIN, FINGERPRINT_COMMIT, FINGERPRINT_ROLLBACK, NO_FINGERPRINT, TAG_DENYLIST,
};
use chrono::TimeDelta;
use std::collections::HashMap;

const COMMENT_OPEN: &str = " /*";
const COMMENT_CLOSE: &str = "*/";

/// A parsed request extracted from a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Query exactly as captured
    pub raw: String,

    /// Query with the trailing tag comment removed
    pub text: String,

    /// Tags from the trailing comment, minus the denylist
    pub tags: HashMap<String, String>,

    /// Structural fingerprint, or one of the transaction markers
    pub fingerprint: String,

    /// Time until the response arrived; zero until one does
    pub duration: TimeDelta,
}

impl Query {
    /// Normalize a raw query string
    ///
    /// Never fails: malformed comments degrade to best-effort tag extraction.
    pub fn normalize(raw: &str) -> Self {
        let (text, tags) = match raw.rfind(COMMENT_OPEN) {
            Some(n) => {
                let body = &raw[n + COMMENT_OPEN.len()..];
                let body = body.strip_suffix(COMMENT_CLOSE).unwrap_or(body);
                (raw[..n].to_string(), parse_tags(body))
            }
            None => (raw.to_string(), HashMap::new()),
        };

        Self {
            raw: raw.to_string(),
            text,
            tags,
            fingerprint: fingerprint_or_marker(raw),
            duration: TimeDelta::zero(),
        }
    }

    pub fn is_begin(&self) -> bool {
        self.fingerprint == FINGERPRINT_BEGIN
    }

    /// Commit or rollback: both end a transaction level
    pub fn is_end(&self) -> bool {
        self.fingerprint == FINGERPRINT_COMMIT || self.fingerprint == FINGERPRINT_ROLLBACK
    }

    /// Tags rendered as `key:value`
    pub fn tag_labels(&self) -> impl Iterator<Item = String> + '_ {
        self.tags.iter().map(|(k, v)| format!("{}:{}", k, v))
    }
}

/// Split `key:value,key:value` pairs, dropping denylisted keys
fn parse_tags(comment: &str) -> HashMap<String, String> {
    comment
        .split(',')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !TAG_DENYLIST.contains(k))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fingerprint_or_marker(raw: &str) -> String {
    let fp = fingerprint(raw);
    if !fp.is_empty() {
        return fp;
    }

    let upper = raw.trim_start().to_uppercase();
    let marker = [
        ("BEGIN", FINGERPRINT_BEGIN),
        ("COMMIT", FINGERPRINT_COMMIT),
        ("ROLLBACK", FINGERPRINT_ROLLBACK),
    ]
    .into_iter()
    .find(|(keyword, _)| upper.starts_with(keyword))
    .map_or(NO_FINGERPRINT, |(_, marker)| marker);

    marker.to_string()
}
