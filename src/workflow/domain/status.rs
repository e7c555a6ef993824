//! Task status enum and the data-driven transition table.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been created but not handed to anyone.
    Draft,
    /// Task has an assignee but work has not started.
    Assigned,
    /// Task is being worked on.
    InProgress,
    /// Task work is finished. The only status that unblocks dependents.
    Completed,
    /// Task was refused during approval and needs rework.
    Rejected,
    /// Task has been abandoned.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether this status represents finished work.
    ///
    /// Only `Completed` unblocks dependent tasks; `Rejected` and `Cancelled`
    /// are terminal but leave dependents blocked.
    #[must_use]
    pub const fn is_terminal_complete(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "draft" => Ok(Self::Draft),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Allowed one-step task status transitions, held as data so deployments can
/// extend the edge set without touching call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransitionTable {
    edges: HashMap<TaskStatus, BTreeSet<TaskStatus>>,
}

impl StatusTransitionTable {
    /// Creates an empty table with no permitted transitions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// Permits a one-step transition from `from` to `to`.
    #[must_use]
    pub fn allow(mut self, from: TaskStatus, to: TaskStatus) -> Self {
        self.edges.entry(from).or_default().insert(to);
        self
    }

    /// Returns whether the table permits moving from `from` to `to`.
    #[must_use]
    pub fn allows(&self, from: TaskStatus, to: TaskStatus) -> bool {
        self.edges.get(&from).is_some_and(|set| set.contains(&to))
    }

    /// Returns the statuses reachable in one step from `from`.
    #[must_use]
    pub fn reachable_from(&self, from: TaskStatus) -> Vec<TaskStatus> {
        self.edges
            .get(&from)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for StatusTransitionTable {
    /// Builds the product transition table.
    ///
    /// `Completed` and `Cancelled` are terminal; `Rejected` may be reworked
    /// back to `Draft`.
    fn default() -> Self {
        Self::empty()
            .allow(TaskStatus::Draft, TaskStatus::Assigned)
            .allow(TaskStatus::Draft, TaskStatus::Rejected)
            .allow(TaskStatus::Draft, TaskStatus::Cancelled)
            .allow(TaskStatus::Assigned, TaskStatus::InProgress)
            .allow(TaskStatus::Assigned, TaskStatus::Draft)
            .allow(TaskStatus::Assigned, TaskStatus::Cancelled)
            .allow(TaskStatus::InProgress, TaskStatus::Completed)
            .allow(TaskStatus::InProgress, TaskStatus::Assigned)
            .allow(TaskStatus::InProgress, TaskStatus::Cancelled)
            .allow(TaskStatus::Rejected, TaskStatus::Draft)
    }
}
