//! Case-insensitive title search over a reminder snapshot.
//!
//! # Invariants
//! - An empty query matches everything and keeps store order.
//! - Query text is matched literally, never as a pattern.

use crate::model::reminder::Reminder;
use regex::{Regex, RegexBuilder};

/// Compiled title filter for one query string.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    All,
    Pattern(Regex),
    Lowercase(String),
}

impl TitleFilter {
    pub fn new(query: &str) -> Self {
        if query.is_empty() {
            return Self {
                matcher: Matcher::All,
            };
        }

        let matcher = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map(Matcher::Pattern)
            // Oversized queries exceed the regex size limit.
            .unwrap_or_else(|_| Matcher::Lowercase(query.to_lowercase()));
        Self { matcher }
    }

    pub fn matches(&self, title: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Pattern(pattern) => pattern.is_match(title),
            Matcher::Lowercase(needle) => title.to_lowercase().contains(needle.as_str()),
        }
    }

    /// Keeps matching reminders in their original order.
    pub fn apply(&self, reminders: Vec<Reminder>) -> Vec<Reminder> {
        if matches!(self.matcher, Matcher::All) {
            return reminders;
        }
        reminders
            .into_iter()
            .filter(|reminder| self.matches(&reminder.title))
            .collect()
    }
}

/// Filters reminders whose title contains `query`, ignoring case.
pub fn filter_by_title(reminders: Vec<Reminder>, query: &str) -> Vec<Reminder> {
    TitleFilter::new(query).apply(reminders)
}
