use tracing::warn;

use crate::db::Database;
use crate::error::StoreError;
use crate::models::HistoryEntry;

const HISTORY_KEY: &str = "workout_history";

/// Durable log of completed days: at most one entry per date, always
/// sorted newest first.
pub struct HistoryStore {
    db: Database,
}

impl HistoryStore {
    pub fn new(db: Database) -> Self {
        HistoryStore { db }
    }

    /// Reads the full history, newest first. Corrupt stored data is
    /// deleted and reported as an empty history.
    pub fn get_history(&self) -> Vec<HistoryEntry> {
        let raw = match self.db.kv_get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("failed to read history: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(mut entries) => {
                sort_descending(&mut entries);
                entries
            }
            Err(e) => {
                warn!("stored history is unreadable, discarding it: {e}");
                if let Err(e) = self.db.kv_delete(HISTORY_KEY) {
                    warn!("failed to delete corrupt history entry: {e}");
                }
                Vec::new()
            }
        }
    }

    /// Records a completed day. A second entry for the same date is a
    /// no-op (the first write wins); if persisting fails the previous
    /// history is returned unchanged, so the caller never observes a
    /// write that did not land.
    pub fn add_entry(&self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let current = self.get_history();
        if current.iter().any(|existing| existing.date == entry.date) {
            return current;
        }

        let mut updated = current.clone();
        updated.push(entry);
        sort_descending(&mut updated);

        let encoded = match serde_json::to_string(&updated) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("failed to encode history: {e}");
                return current;
            }
        };
        if let Err(e) = self.db.kv_set(HISTORY_KEY, &encoded) {
            warn!("failed to persist history: {e}");
            return current;
        }
        updated
    }

    /// Individual entries are never deleted; the log only goes away as
    /// part of a full reset.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.kv_delete(HISTORY_KEY)
    }
}

fn sort_descending(entries: &mut [HistoryEntry]) {
    // ISO dates sort lexicographically
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}
