//! crates/dream_path_core/src/history.rs
//!
//! The bounded, most-recent-first list of files a user has generated from.

use crate::domain::HistoryItem;

pub const MAX_HISTORY_ITEMS: usize = 10;

/// At most `MAX_HISTORY_ITEMS` entries, newest first, unique by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHistory {
    items: Vec<HistoryItem>,
}

impl FileHistory {
    /// Rebuilds a history from persisted items, re-applying the bound and uniqueness rules.
    pub fn from_items(items: Vec<HistoryItem>) -> Self {
        let mut history = Self::default();
        for item in items.into_iter().rev() {
            history.push(item);
        }
        history
    }

    /// Puts `item` at the front, dropping any older entry with the same file name and
    /// evicting the oldest entry past the bound.
    pub fn push(&mut self, item: HistoryItem) {
        self.items.retain(|existing| existing.file_name != item.file_name);
        self.items.insert(0, item);
        self.items.truncate(MAX_HISTORY_ITEMS);
    }

    pub fn find(&self, file_name: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.file_name == file_name)
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<HistoryItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
