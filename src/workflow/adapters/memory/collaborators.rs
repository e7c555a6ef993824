//! Recording notifier and activity log for assertions in tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::workflow::{
    domain::WorkflowEvent,
    ports::{ActivityEntry, ActivityLog, WorkflowNotifier},
};

/// Notifier that records every published event.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<WorkflowEvent>>>,
}

impl RecordingNotifier {
    /// Creates an empty recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the events published so far.
    #[must_use]
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WorkflowNotifier for RecordingNotifier {
    async fn publish(&self, event: WorkflowEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Activity log that records every entry.
#[derive(Debug, Clone, Default)]
pub struct RecordingActivityLog {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
}

impl RecordingActivityLog {
    /// Creates an empty recording activity log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the entries recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ActivityLog for RecordingActivityLog {
    async fn record(&self, entry: ActivityEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
