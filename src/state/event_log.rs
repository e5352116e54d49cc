//! Append-only event log.
//!
//! Human-readable lines derived from server updates: errors, free-text
//! messages, final standings and "X plays Y" notices. Entries are never
//! edited or removed; insertion order is the only order.

use std::fmt;

use chrono::{DateTime, Utc};

use super::protocol::{PlayerNumber, ScoreEntry};

/// Presentation hint attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Error,
    /// Entry about a specific player's move
    Player(PlayerNumber),
}

impl LogCategory {
    /// Style class used by the presentation layer ("error", "player2").
    pub fn as_class(&self) -> String {
        match self {
            Self::Error => "error".to_string(),
            Self::Player(number) => format!("player{}", number),
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_class())
    }
}

/// A single log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub category: Option<LogCategory>,
    pub logged_at: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(text: impl Into<String>, category: Option<LogCategory>) -> Self {
        Self {
            text: text.into(),
            category,
            logged_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == Some(LogCategory::Error)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "text": self.text,
            "category": self.category.map(|c| c.as_class()),
            "logged_at": self.logged_at.to_rfc3339()
        })
    }
}

/// Ordered, append-only list of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, text: impl Into<String>, category: Option<LogCategory>) -> &LogEntry {
        self.entries.push(LogEntry::new(text, category));
        &self.entries[self.entries.len() - 1]
    }

    pub fn error(&mut self, text: impl Into<String>) -> &LogEntry {
        self.push(text, Some(LogCategory::Error))
    }

    pub fn info(&mut self, text: impl Into<String>) -> &LogEntry {
        self.push(text, None)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries appended after `cursor` (a previously observed `len()`).
    pub fn since(&self, cursor: usize) -> &[LogEntry] {
        self.entries.get(cursor..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.entries.iter().map(|e| e.to_json()).collect())
    }
}

/// English ordinal for a 1-based position: 1st, 2nd, 3rd, 4th, 11th, 21st.
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// One standings line.
///
/// `position` is the 1-based index of the entry in the scores list; tied
/// players share the entry's line, and later entries are not renumbered.
pub fn ranking_line(position: usize, names: &[String], entry: &ScoreEntry) -> String {
    format!(
        "{} place: {} with {} groups and {} captured tiles",
        ordinal(position),
        names.join(", "),
        entry.groups,
        entry.captured
    )
}

/// The player whose turn just ended, given who moves next.
///
/// Player 1 moving next means the highest-numbered player just moved.
pub fn prior_player(next: PlayerNumber, highest: PlayerNumber) -> Option<PlayerNumber> {
    match next {
        0 => None,
        1 if highest == 0 => None,
        1 => Some(highest),
        n => Some(n - 1),
    }
}

pub fn move_line(name: &str, symbol: &str) -> String {
    format!("{} plays {}", name, symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ordinals() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(12), "12th");
        assert_eq!(ordinal(13), "13th");
        assert_eq!(ordinal(21), "21st");
        assert_eq!(ordinal(102), "102nd");
        assert_eq!(ordinal(111), "111th");
    }

    #[test]
    fn test_ranking_line() {
        let entry = ScoreEntry {
            players: vec![1, 2],
            groups: 3,
            captured: 2,
        };
        assert_eq!(
            ranking_line(1, &["A".to_string(), "B".to_string()], &entry),
            "1st place: A, B with 3 groups and 2 captured tiles"
        );
    }

    #[test]
    fn test_prior_player_wraps() {
        assert_eq!(prior_player(1, 4), Some(4));
        assert_eq!(prior_player(2, 4), Some(1));
        assert_eq!(prior_player(4, 4), Some(3));
        assert_eq!(prior_player(1, 0), None);
        assert_eq!(prior_player(0, 3), None);
    }

    #[test]
    fn test_log_append_order() {
        let mut log = EventLog::new();
        log.info("first");
        log.error("second");
        log.push("third", Some(LogCategory::Player(2)));

        let texts: Vec<&str> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert!(log.entries()[1].is_error());
        assert_eq!(log.last().unwrap().category, Some(LogCategory::Player(2)));
    }

    #[test]
    fn test_since_cursor() {
        let mut log = EventLog::new();
        log.info("a");
        let cursor = log.len();
        log.info("b");
        log.info("c");

        let fresh: Vec<&str> = log.since(cursor).iter().map(|e| e.text.as_str()).collect();
        assert_eq!(fresh, vec!["b", "c"]);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_category_class() {
        assert_eq!(LogCategory::Error.as_class(), "error");
        assert_eq!(LogCategory::Player(3).to_string(), "player3");
    }

    #[test]
    fn test_entry_json() {
        let entry = LogEntry::new("Bo plays 7", Some(LogCategory::Player(2)));
        let json = entry.to_json();
        assert_eq!(json["text"], "Bo plays 7");
        assert_eq!(json["category"], "player2");
    }
}
