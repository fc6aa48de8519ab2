//! Structural query fingerprinting.
//!
//! Reduces a SQL statement to its shape so that queries differing only in
//! literal values group together:
//!
//! `SELECT * FROM foo WHERE id IN (1, 2, 3)` -> `select * from foo where id in(?+)`
//!
//! Comments are dropped, string and numeric literals become `?`, the text is
//! lowercased and whitespace collapsed.

use regex::Regex;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static IN_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bin\s*\(\s*\?(?:\s*,\s*\?)*\s*\)").expect("valid regex")
});

static VALUES_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bvalues\s*\([^)]*\)(?:\s*,\s*\([^)]*\))*").expect("valid regex")
});

static LIMIT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\blimit \?\s*,\s*\?").expect("valid regex"));

/// Fingerprint a raw query; returns an empty string when nothing is left
pub fn fingerprint(query: &str) -> String {
    let stripped = strip_literals(query);
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    let collapsed = IN_LIST.replace_all(&collapsed, "in(?+)");
    let collapsed = VALUES_LIST.replace_all(&collapsed, "values(?+)");
    LIMIT_PAIR.replace_all(&collapsed, "limit ?").into_owned()
}

/// Single pass over the query: drop comments, replace literals, lowercase
fn strip_literals(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                skip_quoted(&mut chars, c);
                out.push('?');
            }
            '`' => {
                out.push(c);
                for inner in chars.by_ref() {
                    out.extend(inner.to_lowercase());
                    if inner == '`' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars);
                out.push(' ');
            }
            '-' if chars.peek() == Some(&'-') => {
                skip_line(&mut chars);
                out.push(' ');
            }
            '#' => {
                skip_line(&mut chars);
                out.push(' ');
            }
            c if c.is_ascii_digit() && !prev.is_some_and(is_identifier_char) => {
                skip_number(&mut chars, c);
                out.push('?');
            }
            c => out.extend(c.to_lowercase()),
        }
        prev = Some(c);
    }

    out
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn skip_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            // doubled quote is an escaped quote
            if chars.peek() == Some(&quote) {
                chars.next();
            } else {
                return;
            }
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) {
    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'/') {
            chars.next();
            return;
        }
    }
}

fn skip_line(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            return;
        }
    }
}

fn skip_number(chars: &mut Peekable<Chars<'_>>, first: char) {
    if first == '0' && matches!(chars.peek(), Some('x') | Some('X')) {
        chars.next();
        while chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            chars.next();
        }
        return;
    }

    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' | '.' => {
                chars.next();
            }
            'e' | 'E' => {
                chars.next();
                if matches!(chars.peek(), Some('+') | Some('-')) {
                    chars.next();
                }
            }
            _ => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_replaces_numbers() {
        assert_eq!(
            fingerprint("SELECT * FROM foo WHERE bar = 1"),
            "select * from foo where bar = ?"
        );
    }

    #[test]
    fn test_fingerprint_replaces_strings() {
        assert_eq!(
            fingerprint("SELECT id FROM users WHERE name = 'O''Brien' AND note = \"x\\\"y\""),
            "select id from users where name = ? and note = ?"
        );
    }

    #[test]
    fn test_fingerprint_keeps_identifier_digits() {
        assert_eq!(
            fingerprint("select c1 from t2 where x = 0x1F"),
            "select c1 from t2 where x = ?"
        );
    }

    #[test]
    fn test_fingerprint_collapses_lists() {
        assert_eq!(
            fingerprint("SELECT * FROM a WHERE id IN (1, 2,3)"),
            "select * from a where id in(?+)"
        );
        assert_eq!(
            fingerprint("INSERT INTO a (x, y) VALUES (1, 'a'), (2, 'b')"),
            "insert into a (x, y) values(?+)"
        );
        assert_eq!(
            fingerprint("select * from a limit 10, 20"),
            "select * from a limit ?"
        );
    }

    #[test]
    fn test_fingerprint_drops_comments() {
        assert_eq!(
            fingerprint("SELECT 1 /* controller:users */"),
            "select ?"
        );
        assert_eq!(fingerprint("select a -- trailing\nfrom b"), "select a from b");
        assert_eq!(fingerprint("/* only a comment */"), "");
    }

    #[test]
    fn test_fingerprint_collapses_whitespace() {
        assert_eq!(fingerprint("  BEGIN \n"), "begin");
        assert_eq!(fingerprint(""), "");
    }
}
