//! Directed dependency edges between tasks and the derived blocking view.

use super::{DependencyId, TaskId, WorkflowDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of relationship an edge expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// The dependent task may not start until the blocking task completes.
    FinishToStart,
    /// Informational link; never blocks.
    RelatesTo,
}

impl DependencyKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinishToStart => "finish_to_start",
            Self::RelatesTo => "relates_to",
        }
    }

    /// Returns whether edges of this kind participate in blocking.
    #[must_use]
    pub const fn blocks(self) -> bool {
        matches!(self, Self::FinishToStart)
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DependencyKind {
    type Error = ParseDependencyKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "finish_to_start" => Ok(Self::FinishToStart),
            "relates_to" => Ok(Self::RelatesTo),
            _ => Err(ParseDependencyKindError(value.to_owned())),
        }
    }
}

/// Error returned while parsing dependency kinds from persistence.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown dependency kind: {0}")]
pub struct ParseDependencyKindError(pub String);

/// Directed edge stating that `dependent` is blocked until `blocking`
/// reaches the terminal-complete status.
///
/// Edges are created once and deleted individually, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    id: DependencyId,
    dependent: TaskId,
    blocking: TaskId,
    kind: DependencyKind,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedDependencyData {
    /// Persisted edge identifier.
    pub id: DependencyId,
    /// Persisted dependent task reference.
    pub dependent: TaskId,
    /// Persisted blocking task reference.
    pub blocking: TaskId,
    /// Persisted edge kind.
    pub kind: DependencyKind,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskDependency {
    /// Creates a new dependency edge.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::SelfDependency`] when both ends refer
    /// to the same task.
    pub fn new(
        dependent: TaskId,
        blocking: TaskId,
        kind: DependencyKind,
        clock: &impl Clock,
    ) -> Result<Self, WorkflowDomainError> {
        if dependent == blocking {
            return Err(WorkflowDomainError::SelfDependency(dependent));
        }
        Ok(Self {
            id: DependencyId::new(),
            dependent,
            blocking,
            kind,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs an edge from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedDependencyData) -> Self {
        Self {
            id: data.id,
            dependent: data.dependent,
            blocking: data.blocking,
            kind: data.kind,
            created_at: data.created_at,
        }
    }

    /// Returns the edge identifier.
    #[must_use]
    pub const fn id(&self) -> DependencyId {
        self.id
    }

    /// Returns the task that is blocked by this edge.
    #[must_use]
    pub const fn dependent(&self) -> TaskId {
        self.dependent
    }

    /// Returns the task that blocks.
    #[must_use]
    pub const fn blocking(&self) -> TaskId {
        self.blocking
    }

    /// Returns the edge kind.
    #[must_use]
    pub const fn kind(&self) -> DependencyKind {
        self.kind
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Derived blocking state for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingInfo {
    /// Task the view describes.
    pub task_id: TaskId,
    /// Whether some blocking task has not yet completed.
    pub is_blocked: bool,
    /// Tasks this task depends on, complete or not.
    pub blocked_by: Vec<TaskId>,
    /// Tasks that depend on this task.
    pub blocking: Vec<TaskId>,
}

impl BlockingInfo {
    /// Returns whether the task may start.
    #[must_use]
    pub const fn can_start(&self) -> bool {
        !self.is_blocked
    }
}
