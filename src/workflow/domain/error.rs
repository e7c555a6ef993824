//! Error types for workflow domain validation and parsing.

use super::{ProjectId, SprintId, SprintStatus, TaskId, TaskStatus};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned while validating workflow domain rules.
///
/// Each variant maps to one stable error code surfaced to callers; the
/// coordinator never retries these automatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowDomainError {
    /// The requested task status edge is not in the transition table.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        /// Task whose status change was rejected.
        task_id: TaskId,
        /// Status the task currently holds.
        from: TaskStatus,
        /// Status the caller requested.
        to: TaskStatus,
    },

    /// The requested sprint lifecycle edge is not permitted.
    #[error("invalid sprint transition for sprint {sprint_id}: {from} -> {to}")]
    InvalidSprintTransition {
        /// Sprint whose transition was rejected.
        sprint_id: SprintId,
        /// Status the sprint currently holds.
        from: SprintStatus,
        /// Status the caller requested.
        to: SprintStatus,
    },

    /// The actor lacks authority for the requested mutation.
    #[error("actor is not permitted to {action}")]
    Forbidden {
        /// Short description of the refused action.
        action: String,
    },

    /// A task cannot depend on itself.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    /// The ordered dependency pair already exists.
    #[error("dependency from {dependent} to {blocking} already exists")]
    DuplicateEdge {
        /// Task that would be blocked.
        dependent: TaskId,
        /// Task that would block.
        blocking: TaskId,
    },

    /// Inserting the edge would close a cycle in the dependency graph.
    #[error("dependency from {dependent} to {blocking} would create a cycle")]
    CycleDetected {
        /// Task that would be blocked.
        dependent: TaskId,
        /// Task that would block.
        blocking: TaskId,
    },

    /// The sprint window intersects another open sprint in the project.
    #[error("sprint window overlaps sprint {other} in project {project_id}")]
    OverlappingSprint {
        /// Project owning both sprints.
        project_id: ProjectId,
        /// Existing sprint whose window intersects.
        other: SprintId,
    },

    /// The project already has a sprint in the active state.
    #[error("project {project_id} already has active sprint {active}")]
    ActiveSprintExists {
        /// Project owning the sprints.
        project_id: ProjectId,
        /// Sprint currently active.
        active: SprintId,
    },

    /// Task membership cannot change on a completed or cancelled sprint.
    #[error("sprint {0} is closed")]
    SprintClosed(SprintId),

    /// The sprint date window is malformed.
    #[error("invalid sprint window {start}..{end}")]
    InvalidDateRange {
        /// Requested window start.
        start: NaiveDate,
        /// Requested window end.
        end: NaiveDate,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// Rejecting a task requires a non-empty reason.
    #[error("rejection of task {0} requires a non-empty reason")]
    RejectionReasonRequired(TaskId),

    /// The task does not require approval.
    #[error("task {0} does not require approval")]
    ApprovalNotRequired(TaskId),

    /// A task and sprint belong to different projects.
    #[error("task {task_id} does not belong to the project of sprint {sprint_id}")]
    TaskProjectMismatch {
        /// Task whose project disagrees.
        task_id: TaskId,
        /// Sprint whose project was expected.
        sprint_id: SprintId,
    },

    /// Two sprints belong to different projects.
    #[error("sprint {other} does not belong to the project of sprint {sprint_id}")]
    SprintProjectMismatch {
        /// Sprint whose project was expected.
        sprint_id: SprintId,
        /// Sprint whose project disagrees.
        other: SprintId,
    },

    /// The story-point estimate is out of range.
    #[error("invalid story points {0}, expected 1..=100")]
    InvalidStoryPoints(u32),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing sprint statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sprint status: {0}")]
pub struct ParseSprintStatusError(pub String);
