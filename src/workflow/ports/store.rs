//! Store port for workflow persistence.

use crate::workflow::domain::{
    DependencyId, ProjectId, Sprint, SprintId, Task, TaskDependency, TaskId,
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow store operations.
pub type WorkflowStoreResult<T> = Result<T, WorkflowStoreError>;

/// Persistence contract for tasks, sprints, and dependency edges.
///
/// Implementations are assumed to be backed by a transactional relational
/// store; the engine validates invariants before writing and relies on the
/// store's uniqueness constraints as a backstop against concurrent writers.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stores a new task.
    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::TaskNotFound`] when the task does not
    /// exist.
    async fn update_task(&self, task: &Task) -> WorkflowStoreResult<()>;

    /// Finds a task by identifier. Returns `None` when absent.
    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>>;

    /// Returns all tasks currently assigned to the given sprint.
    async fn find_tasks_by_sprint(&self, sprint: SprintId) -> WorkflowStoreResult<Vec<Task>>;

    /// Stores a new sprint.
    async fn insert_sprint(&self, sprint: &Sprint) -> WorkflowStoreResult<()>;

    /// Persists changes to an existing sprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::SprintNotFound`] when the sprint does
    /// not exist, or [`WorkflowStoreError::Conflict`] when the write would
    /// violate the one-active-sprint-per-project constraint.
    async fn update_sprint(&self, sprint: &Sprint) -> WorkflowStoreResult<()>;

    /// Finds a sprint by identifier. Returns `None` when absent.
    async fn find_sprint(&self, id: SprintId) -> WorkflowStoreResult<Option<Sprint>>;

    /// Returns all sprints belonging to the given project.
    async fn find_sprints_by_project(&self, project: ProjectId)
    -> WorkflowStoreResult<Vec<Sprint>>;

    /// Returns the project's active sprint, if one exists.
    async fn find_active_sprint(&self, project: ProjectId) -> WorkflowStoreResult<Option<Sprint>>;

    /// Stores a new dependency edge.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::Conflict`] when the ordered pair
    /// already exists; the uniqueness constraint is the backstop for races
    /// that slip past the service-level duplicate check.
    async fn insert_edge(&self, edge: &TaskDependency) -> WorkflowStoreResult<()>;

    /// Deletes an edge by identifier. Idempotent; returns whether an edge
    /// was actually removed.
    async fn delete_edge(&self, id: DependencyId) -> WorkflowStoreResult<bool>;

    /// Finds the edge for an ordered task pair. Returns `None` when absent.
    async fn find_edge(
        &self,
        dependent: TaskId,
        blocking: TaskId,
    ) -> WorkflowStoreResult<Option<TaskDependency>>;

    /// Returns edges whose dependent end is the given task: the tasks it
    /// depends on.
    async fn find_edges_by_dependent(
        &self,
        dependent: TaskId,
    ) -> WorkflowStoreResult<Vec<TaskDependency>>;

    /// Returns edges whose blocking end is the given task: the tasks it
    /// blocks.
    async fn find_edges_by_blocking(
        &self,
        blocking: TaskId,
    ) -> WorkflowStoreResult<Vec<TaskDependency>>;
}

/// Errors returned by workflow store implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The sprint was not found.
    #[error("sprint not found: {0}")]
    SprintNotFound(SprintId),

    /// A store-level constraint rejected the write at commit time.
    #[error("conflicting concurrent write: {0}")]
    Conflict(String),

    /// A transient failure persisted after bounded retries.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
