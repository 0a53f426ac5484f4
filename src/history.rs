use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// An applied translation, kept so it can be undone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Zero-based line index in the edited document
    pub line_number: usize,
    pub original_text: String,
    pub translated_text: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        line_number: usize,
        original_text: impl Into<String>,
        translated_text: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            original_text: original_text.into(),
            translated_text: translated_text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Bounded undo log.
///
/// Overflow drops the oldest entry; `last` pops the newest one, so each
/// entry can be undone at most once.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn add(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove and return the most recent entry
    pub fn last(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Oldest-first snapshot
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
