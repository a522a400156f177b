//! Suppression Table and Dedup Window
//!
//! Two time-bounded guards sit in front of the queue:
//!
//! - [`SuppressionTable`]: normalized message text → expiry. Installed by
//!   an explicit "ignore" action; until expiry, any request with the same
//!   normalized text is dropped. At most one entry per key; expired
//!   entries are invisible to lookups even before a sweep removes them.
//! - [`RecentKeys`]: a short window (2 s) keyed on text+priority that
//!   merges away near-simultaneous duplicates. Expiry is handled by
//!   sweeping on use and from the scheduler's maintenance tick, not by a
//!   timer per key.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How long a text+priority pair blocks an identical admission
pub const DEDUP_WINDOW: Duration = Duration::from_secs(2);

/// Normalize message text into a suppression key: trimmed, case-folded.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Dedup key covering both content and urgency
pub fn dedup_key(text: &str, priority: i32) -> String {
    format!("{}_{}", text, priority)
}

/// Time-bounded block list keyed on normalized message text
#[derive(Debug, Default)]
pub struct SuppressionTable {
    entries: Mutex<HashMap<String, Instant>>,
}

impl SuppressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or overwrite a suppression for `key` lasting `duration`.
    pub fn insert(&self, key: String, duration: Duration) {
        let expires_at = Instant::now() + duration;
        self.entries.lock().insert(key, expires_at);
    }

    /// Sweep expired entries, then report whether `key` is blocked.
    /// One critical section so a concurrent insert cannot interleave
    /// between the sweep and the check.
    pub fn sweep_and_check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, expires_at| *expires_at > now);
        entries.contains_key(key)
    }

    /// Drop expired entries; called from the scheduler's maintenance tick.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, expires_at| *expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Short-lived guard against duplicate near-simultaneous admissions
#[derive(Debug)]
pub struct RecentKeys {
    window: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl RecentKeys {
    pub fn new() -> Self {
        Self::with_window(DEDUP_WINDOW)
    }

    /// Custom window, used by tests that cannot wait two wall-clock seconds.
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Register `key` unless an unexpired registration exists. Returns
    /// `true` when the key was fresh (caller may admit), `false` when a
    /// duplicate is still inside the window. Check and insert share one
    /// critical section.
    pub fn try_register(&self, key: String) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock();
        seen.retain(|_, at| now.duration_since(*at) < self.window);
        if seen.contains_key(&key) {
            return false;
        }
        seen.insert(key, now);
        true
    }

    /// Drop expired registrations.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.seen
            .lock()
            .retain(|_, at| now.duration_since(*at) < self.window);
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Default for RecentKeys {
    fn default() -> Self {
        Self::new()
    }
}
