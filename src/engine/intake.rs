//! Request Intake
//!
//! The single entry point every transport funnels into. `submit` runs the
//! admission pipeline in a fixed order: normalize the suppression key,
//! sweep-and-check the suppression table, check the dedup window, and only
//! then mint a notification, record it in history and enqueue it. The
//! outcome is an explicit variant, never control flow by exception: a
//! suppressed or deduplicated request is an expected, silent drop.

use std::time::Duration;

use log::{debug, info};
use uuid::Uuid;

use crate::engine::suppression::{dedup_key, normalize_key};
use crate::engine::{EngineError, EngineResult, EngineState, HistoryEntry, Notification};
use crate::wire::NotificationRequest;

/// What became of a submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Admitted to the queue under this id
    Accepted(Uuid),
    /// Normalized text is currently suppressed; dropped, not logged to history
    Suppressed,
    /// Identical text+priority arrived within the dedup window; merged away
    Deduplicated,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

impl EngineState {
    /// Admit a decoded request, or drop it with an explicit outcome.
    /// Safe for concurrent invocation from every listener; each check
    /// holds its structure's lock for the whole check-and-act sequence.
    pub fn submit(&self, request: NotificationRequest) -> SubmitOutcome {
        let suppression_key = normalize_key(&request.text);

        if self.suppression().sweep_and_check(&suppression_key) {
            debug!("suppressed message {:?}", request.text);
            return SubmitOutcome::Suppressed;
        }

        if !self
            .recents()
            .try_register(dedup_key(&request.text, request.priority))
        {
            debug!(
                "merged duplicate message {:?} (priority {})",
                request.text, request.priority
            );
            return SubmitOutcome::Deduplicated;
        }

        let id = Uuid::new_v4();
        self.history().append(HistoryEntry::new(
            id,
            &request.text,
            request.priority,
            &request.color,
            &request.bg_color,
        ));

        info!(
            "accepted message {:?} (priority {}, id {})",
            request.text, request.priority, id
        );
        self.enqueue(Notification::new(id, request));
        SubmitOutcome::Accepted(id)
    }

    /// Suppress the message behind a history entry for `duration_minutes`,
    /// and drop the entry itself. Suppression is keyed on normalized text,
    /// not id: any future request with the same text is blocked until
    /// expiry, whatever id it would have been assigned.
    pub fn ignore(&self, id: Uuid, duration_minutes: u64) -> EngineResult<()> {
        let entry = self
            .history()
            .remove(id)
            .ok_or(EngineError::UnknownHistoryEntry(id))?;

        let key = normalize_key(&entry.text);
        let duration = Duration::from_secs(duration_minutes * 60);
        info!(
            "ignoring message {:?} for {} minute(s)",
            entry.text, duration_minutes
        );
        self.suppression().insert(key, duration);
        Ok(())
    }

    /// Empty the history log. Suppressions and queued notifications are
    /// untouched; this is a view reset, not an admission change.
    pub fn clear_history(&self) {
        info!("clearing message history ({} entries)", self.history().len());
        self.history().clear();
    }
}
