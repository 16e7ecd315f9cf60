//! Bounded in-memory activity journal

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::types::ActivityEntry;

#[derive(Debug)]
pub struct ActivityStorage {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityStorage {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry, evicting the oldest once full
    pub fn append(&self, entry: ActivityEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
