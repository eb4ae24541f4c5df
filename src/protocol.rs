//! # Wire Protocol
//! One news event per line: `<headline>;<priority>`.
//!
//! The separator never collides with the priority digits, so a line splits
//! into exactly two fields. Both fields are trimmed by the receiver; senders
//! are expected not to pad them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Malformed, Result};

pub const SEPARATOR: char = ';';
pub const MIN_PRIORITY: u32 = 0;
pub const MAX_PRIORITY: u32 = 9;

/// An immutable news event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsItem {
    headline: String,
    priority: u32,
}

impl NewsItem {
    pub fn new(headline: impl Into<String>, priority: u32) -> Self {
        Self {
            headline: headline.into(),
            priority,
        }
    }

    pub fn headline(&self) -> &str {
        &self.headline
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }
}

impl fmt::Display for NewsItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.priority, self.headline)
    }
}

/// Encode an item as a protocol line (without the trailing newline).
pub fn encode(item: &NewsItem) -> String {
    format!("{}{}{}", item.headline, SEPARATOR, item.priority)
}

/// Decode one protocol line (without the trailing newline).
pub fn decode(line: &str) -> Result<NewsItem> {
    if !line.contains(SEPARATOR) {
        return Err(Error::malformed(line, Malformed::MissingSeparator));
    }

    let parts: Vec<&str> = line.split(SEPARATOR).collect();
    if parts.len() != 2 {
        return Err(Error::malformed(line, Malformed::FieldCount(parts.len())));
    }

    let headline = parts[0].trim();
    let raw_priority = parts[1].trim();

    let priority: i64 = raw_priority
        .parse()
        .map_err(|_| Error::malformed(line, Malformed::NotAnInteger))?;
    if !(MIN_PRIORITY as i64..=MAX_PRIORITY as i64).contains(&priority) {
        return Err(Error::malformed(
            line,
            Malformed::PriorityOutOfRange(priority),
        ));
    }

    if headline.is_empty() {
        return Err(Error::malformed(line, Malformed::EmptyHeadline));
    }

    Ok(NewsItem::new(headline, priority as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(line: &str) -> Malformed {
        decode(line)
            .unwrap_err()
            .malformed_reason()
            .expect("malformed")
    }

    #[test]
    fn encode_uses_single_separator() {
        let item = NewsItem::new("up rise success", 5);
        assert_eq!(encode(&item), "up rise success;5");
    }

    #[test]
    fn round_trip_all_priorities() {
        for p in MIN_PRIORITY..=MAX_PRIORITY {
            let item = NewsItem::new("good high über", p);
            assert_eq!(decode(&encode(&item)).unwrap(), item);
        }
    }

    #[test]
    fn trims_both_fields() {
        let item = decode("  up rise  ;  7 ").unwrap();
        assert_eq!(item.headline(), "up rise");
        assert_eq!(item.priority(), 7);
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(reason("no separator 5"), Malformed::MissingSeparator);
        assert_eq!(reason("a;b;3"), Malformed::FieldCount(3));
        assert_eq!(reason("invalid;format"), Malformed::NotAnInteger);
        assert_eq!(reason("up;"), Malformed::NotAnInteger);
        assert_eq!(reason("up;10"), Malformed::PriorityOutOfRange(10));
        assert_eq!(reason("up;-1"), Malformed::PriorityOutOfRange(-1));
        assert_eq!(reason("   ;4"), Malformed::EmptyHeadline);
    }
}
