//! Notification Engine
//!
//! The shared state behind every transport and the display scheduler: the
//! pending-notification priority queue, the history log, the suppression
//! table, the dedup window, and the single "currently displaying" slot.
//!
//! One [`EngineState`] is constructed at startup and handed (`Arc`) to the
//! listeners (producers), the scheduler (the only consumer) and the web
//! surface. There are no process-wide globals; every structure carries its
//! own lock so a stalled listener cannot block the scheduler.

pub mod error;
pub mod history;
pub mod intake;
pub mod queue;
pub mod suppression;

pub use error::{EngineError, EngineResult};
pub use history::{HistoryEntry, HistoryLog};
pub use intake::SubmitOutcome;
pub use queue::PriorityQueue;
pub use suppression::{RecentKeys, SuppressionTable, DEDUP_WINDOW};

use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::wire::NotificationRequest;

/// A queued, displayable unit derived from an accepted request.
/// Immutable after creation; owned by whichever queue or scheduler
/// currently holds it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub accepted_at: DateTime<Local>,
    pub request: NotificationRequest,
}

impl Notification {
    fn new(id: Uuid, request: NotificationRequest) -> Self {
        Self {
            id,
            accepted_at: Local::now(),
            request,
        }
    }
}

/// Summary of the notification currently being animated, for the
/// admin surface and for invariant checks.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveDisplay {
    pub id: Uuid,
    #[serde(rename = "message")]
    pub text: String,
    pub priority: i32,
}

impl From<&Notification> for ActiveDisplay {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            text: n.request.text.clone(),
            priority: n.request.priority,
        }
    }
}

/// Shared engine state; see the module docs for the ownership story.
#[derive(Debug)]
pub struct EngineState {
    queue: Mutex<PriorityQueue<Notification>>,
    history: HistoryLog,
    suppression: SuppressionTable,
    recents: RecentKeys,
    active: Mutex<Option<ActiveDisplay>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(PriorityQueue::new()),
            history: HistoryLog::new(),
            suppression: SuppressionTable::new(),
            recents: RecentKeys::new(),
            active: Mutex::new(None),
        }
    }

    /// Engine with a custom dedup window; tests use short windows.
    pub fn with_dedup_window(window: Duration) -> Self {
        Self {
            recents: RecentKeys::with_window(window),
            ..Self::new()
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn suppression(&self) -> &SuppressionTable {
        &self.suppression
    }

    pub(crate) fn recents(&self) -> &RecentKeys {
        &self.recents
    }

    pub(crate) fn enqueue(&self, notification: Notification) {
        let priority = notification.request.priority;
        self.queue.lock().push(priority, notification);
    }

    /// Non-blocking pop for the scheduler's poll loop. An empty queue is
    /// not an error, just "nothing to show now".
    pub fn pop_next(&self) -> Option<Notification> {
        self.queue.lock().pop()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// The notification currently in the Animating state, if any.
    pub fn active(&self) -> Option<ActiveDisplay> {
        self.active.lock().clone()
    }

    pub(crate) fn set_active(&self, notification: &Notification) {
        *self.active.lock() = Some(ActiveDisplay::from(notification));
    }

    pub(crate) fn clear_active(&self) {
        *self.active.lock() = None;
    }

    /// Periodic maintenance, driven by the scheduler's idle tick: drops
    /// expired suppression entries and dedup registrations.
    pub fn sweep_expired(&self) {
        self.suppression.sweep();
        self.recents.sweep();
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}
