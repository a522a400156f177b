//! Notification History Log
//!
//! Append-only record of accepted notifications, shared between the
//! listener threads and the web surface. Entries only leave through an
//! explicit ignore (which suppresses the text) or a clear-all. Reads come
//! back most-recent-first, which is what the UI wants.

use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::wire::ColorSpec;

/// One accepted notification as the administration surface sees it
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    /// Wall-clock acceptance time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
    #[serde(rename = "message")]
    pub text: String,
    pub priority: i32,
    pub color: ColorSpec,
    pub bg_color: ColorSpec,
}

impl HistoryEntry {
    pub fn new(id: Uuid, text: &str, priority: i32, color: &ColorSpec, bg_color: &ColorSpec) -> Self {
        Self {
            id,
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            text: text.trim().to_string(),
            priority,
            color: color.clone(),
            bg_color: bg_color.clone(),
        }
    }
}

/// Lock-guarded append-only log
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: HistoryEntry) {
        self.entries.lock().push(entry);
    }

    /// Snapshot, most recent first.
    pub fn recent_first(&self) -> Vec<HistoryEntry> {
        let entries = self.entries.lock();
        entries.iter().rev().cloned().collect()
    }

    /// Remove one entry by id, returning it if present.
    pub fn remove(&self, id: Uuid) -> Option<HistoryEntry> {
        let mut entries = self.entries.lock();
        let pos = entries.iter().position(|e| e.id == id)?;
        Some(entries.remove(pos))
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
