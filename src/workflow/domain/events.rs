//! Domain events published to the notification collaborator.

use super::{ProjectId, SprintId, TaskId, TaskStatus, UserId};
use serde::{Deserialize, Serialize};

/// Event emitted after an accepted mutation.
///
/// Delivery and retry are the notification collaborator's concern; the
/// engine fires after the write commits and never rolls back on delivery
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A task moved along a transition-table edge.
    StatusChanged {
        /// Task that changed.
        task_id: TaskId,
        /// Actor who requested the change.
        actor: UserId,
        /// Status before the change.
        previous: TaskStatus,
        /// Status after the change.
        current: TaskStatus,
    },
    /// A dependency edge was inserted.
    DependencyAdded {
        /// Task that is now blocked.
        dependent: TaskId,
        /// Task that blocks.
        blocking: TaskId,
        /// Actor who added the edge.
        actor: UserId,
        /// Assignee of the dependent task, the notification recipient.
        recipient: Option<UserId>,
    },
    /// A task was handed to an assignee.
    TaskAssigned {
        /// Task that was assigned.
        task_id: TaskId,
        /// New assignee.
        assignee: UserId,
        /// Actor who performed the assignment.
        actor: UserId,
    },
    /// A newly created task awaits elevated sign-off.
    ApprovalRequired {
        /// Task awaiting sign-off.
        task_id: TaskId,
        /// Creator of the task.
        creator: UserId,
    },
    /// An elevated role signed off on a task.
    TaskApproved {
        /// Task that was approved.
        task_id: TaskId,
        /// Approving actor.
        approver: UserId,
    },
    /// An elevated role refused a task.
    TaskRejected {
        /// Task that was rejected.
        task_id: TaskId,
        /// Rejecting actor.
        approver: UserId,
        /// Reason recorded on the task.
        reason: String,
    },
    /// A sprint moved from planning to active.
    SprintStarted {
        /// Sprint that started.
        sprint_id: SprintId,
        /// Owning project.
        project: ProjectId,
        /// Actor who started the sprint.
        actor: UserId,
    },
    /// A sprint finished and recorded its velocity.
    SprintCompleted {
        /// Sprint that completed.
        sprint_id: SprintId,
        /// Owning project.
        project: ProjectId,
        /// Final velocity in story points.
        velocity: u32,
        /// Actor who completed the sprint.
        actor: UserId,
    },
}
