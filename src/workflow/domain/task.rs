//! Task aggregate root and priority scale.

use super::{
    ParseTaskStatusError, ProjectId, SprintId, StatusTransitionTable, StoryPoints, TaskId,
    TaskStatus, UserId, WorkflowDomainError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Nice to have.
    Low,
    /// Default priority.
    Medium,
    /// Should be scheduled ahead of medium work.
    High,
    /// Drop everything.
    Critical,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Parameter object for creating a new task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskParams {
    /// Task title; must be non-empty after trimming.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Priority; defaults to medium at the request layer.
    pub priority: TaskPriority,
    /// User creating the task.
    pub creator: UserId,
    /// Initial assignee, if any.
    pub assignee: Option<UserId>,
    /// Containing parent task for subtasks. Not a dependency edge.
    pub parent: Option<TaskId>,
    /// Owning project; personal tasks have none.
    pub project: Option<ProjectId>,
    /// Story-point estimate.
    pub story_points: Option<StoryPoints>,
    /// Whether an elevated role must sign off before assignment.
    pub requires_approval: bool,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted creator reference.
    pub creator: UserId,
    /// Persisted assignee reference.
    pub assignee: Option<UserId>,
    /// Persisted parent task reference.
    pub parent: Option<TaskId>,
    /// Persisted project reference.
    pub project: Option<ProjectId>,
    /// Persisted sprint reference.
    pub sprint: Option<SprintId>,
    /// Persisted approval requirement flag.
    pub requires_approval: bool,
    /// Persisted approver reference.
    pub approved_by: Option<UserId>,
    /// Persisted rejection reason.
    pub rejection_reason: Option<String>,
    /// Persisted story-point estimate.
    pub story_points: Option<StoryPoints>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    priority: TaskPriority,
    creator: UserId,
    assignee: Option<UserId>,
    parent: Option<TaskId>,
    project: Option<ProjectId>,
    sprint: Option<SprintId>,
    requires_approval: bool,
    approved_by: Option<UserId>,
    rejection_reason: Option<String>,
    story_points: Option<StoryPoints>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task in `Draft` status.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyTitle`] when the title is empty
    /// after trimming.
    pub fn new(params: NewTaskParams, clock: &impl Clock) -> Result<Self, WorkflowDomainError> {
        let title = params.title.trim().to_owned();
        if title.is_empty() {
            return Err(WorkflowDomainError::EmptyTitle);
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: params.description,
            status: TaskStatus::Draft,
            priority: params.priority,
            creator: params.creator,
            assignee: params.assignee,
            parent: params.parent,
            project: params.project,
            sprint: None,
            requires_approval: params.requires_approval,
            approved_by: None,
            rejection_reason: None,
            story_points: params.story_points,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            creator: data.creator,
            assignee: data.assignee,
            parent: data.parent,
            project: data.project,
            sprint: data.sprint,
            requires_approval: data.requires_approval,
            approved_by: data.approved_by,
            rejection_reason: data.rejection_reason,
            story_points: data.story_points,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the creator reference.
    #[must_use]
    pub const fn creator(&self) -> UserId {
        self.creator
    }

    /// Returns the assignee reference, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the parent task reference, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    /// Returns the owning project, if any.
    #[must_use]
    pub const fn project(&self) -> Option<ProjectId> {
        self.project
    }

    /// Returns the containing sprint, if any.
    #[must_use]
    pub const fn sprint(&self) -> Option<SprintId> {
        self.sprint
    }

    /// Returns whether an elevated sign-off is required.
    #[must_use]
    pub const fn requires_approval(&self) -> bool {
        self.requires_approval
    }

    /// Returns the approver reference, if any.
    #[must_use]
    pub const fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    /// Returns the rejection reason; set only while status is `Rejected`.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Returns the story-point estimate, if any.
    #[must_use]
    pub const fn story_points(&self) -> Option<StoryPoints> {
        self.story_points
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `user` created this task.
    #[must_use]
    pub fn is_creator(&self, user: UserId) -> bool {
        self.creator == user
    }

    /// Returns whether `user` is the current assignee.
    #[must_use]
    pub fn is_assignee(&self, user: UserId) -> bool {
        self.assignee == Some(user)
    }

    /// Returns whether the approval gate has been satisfied.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        !self.requires_approval || self.approved_by.is_some()
    }

    /// Moves the task along a permitted edge of the transition table.
    ///
    /// Leaving `Rejected` clears the rejection reason so the reason is only
    /// ever set while the status is `Rejected`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] when the table has
    /// no edge from the current status to `target`.
    pub fn change_status(
        &mut self,
        target: TaskStatus,
        table: &StatusTransitionTable,
        clock: &impl Clock,
    ) -> Result<TaskStatus, WorkflowDomainError> {
        if !table.allows(self.status, target) {
            return Err(WorkflowDomainError::InvalidTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }

        let previous = self.status;
        if previous == TaskStatus::Rejected && target != TaskStatus::Rejected {
            self.rejection_reason = None;
        }
        self.status = target;
        self.touch(clock);
        Ok(previous)
    }

    /// Hands the task to `assignee` and moves it to `Assigned`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidTransition`] when the current
    /// status has no edge to `Assigned`.
    pub fn assign_to(
        &mut self,
        assignee: UserId,
        table: &StatusTransitionTable,
        clock: &impl Clock,
    ) -> Result<TaskStatus, WorkflowDomainError> {
        let previous = self.change_status(TaskStatus::Assigned, table, clock)?;
        self.assignee = Some(assignee);
        Ok(previous)
    }

    /// Records an elevated sign-off.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::ApprovalNotRequired`] when the task
    /// does not require approval or is already approved.
    pub fn approve_by(
        &mut self,
        approver: UserId,
        clock: &impl Clock,
    ) -> Result<(), WorkflowDomainError> {
        if !self.requires_approval || self.approved_by.is_some() {
            return Err(WorkflowDomainError::ApprovalNotRequired(self.id));
        }
        self.approved_by = Some(approver);
        self.touch(clock);
        Ok(())
    }

    /// Moves the task to `Rejected` and records the reason.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::RejectionReasonRequired`] when the
    /// reason is empty after trimming, or
    /// [`WorkflowDomainError::InvalidTransition`] when the table has no edge
    /// from the current status to `Rejected`.
    pub fn reject(
        &mut self,
        reason: &str,
        table: &StatusTransitionTable,
        clock: &impl Clock,
    ) -> Result<TaskStatus, WorkflowDomainError> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(WorkflowDomainError::RejectionReasonRequired(self.id));
        }
        let previous = self.change_status(TaskStatus::Rejected, table, clock)?;
        self.rejection_reason = Some(trimmed.to_owned());
        Ok(previous)
    }

    /// Moves the task into a sprint or back to the backlog.
    pub fn move_to_sprint(&mut self, sprint: Option<SprintId>, clock: &impl Clock) {
        self.sprint = sprint;
        self.touch(clock);
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
