//! Task workflow coordinator: creation, assignment, approval, and status
//! changes, sequencing the validation primitives and emitting domain
//! events.

use crate::workflow::{
    domain::{
        Actor, ActorRole, AuthorityTable, NewTaskParams, ProjectId, StatusTransitionTable,
        StoryPoints, Task, TaskId, TaskPriority, TaskStatus, UserId, WorkflowDomainError,
        WorkflowEvent,
    },
    ports::{
        ActivityEntity, ActivityEntry, ActivityLog, WorkflowNotifier, WorkflowStore,
        WorkflowStoreError,
    },
    services::WorkflowResult,
};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;

/// Assignee identity with its upstream-resolved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignee {
    /// Assignee user identifier.
    pub id: UserId,
    /// Assignee role.
    pub role: ActorRole,
}

impl Assignee {
    /// Creates an assignee reference.
    #[must_use]
    pub const fn new(id: UserId, role: ActorRole) -> Self {
        Self { id, role }
    }
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    assignee: Option<Assignee>,
    parent: Option<TaskId>,
    project: Option<ProjectId>,
    story_points: Option<u32>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title and medium priority.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: TaskPriority::Medium,
            assignee: None,
            parent: None,
            project: None,
            story_points: None,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the task priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the initial assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: Assignee) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the containing parent task.
    #[must_use]
    pub const fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the owning project.
    #[must_use]
    pub const fn with_project(mut self, project: ProjectId) -> Self {
        self.project = Some(project);
        self
    }

    /// Sets the story-point estimate.
    #[must_use]
    pub const fn with_story_points(mut self, points: u32) -> Self {
        self.story_points = Some(points);
        self
    }
}

/// Orchestrates multi-step task flows around the validation primitives.
///
/// Holds the status transition table and the authority lattice as injected
/// data; no algorithmic state of its own.
#[derive(Clone)]
pub struct TaskWorkflowCoordinator<S, N, A, C>
where
    S: WorkflowStore,
    N: WorkflowNotifier,
    A: ActivityLog,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    notifier: Arc<N>,
    activity: Arc<A>,
    clock: Arc<C>,
    transitions: StatusTransitionTable,
    authority: AuthorityTable,
}

impl<S, N, A, C> TaskWorkflowCoordinator<S, N, A, C>
where
    S: WorkflowStore,
    N: WorkflowNotifier,
    A: ActivityLog,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator with the default transition and authority
    /// tables.
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, activity: Arc<A>, clock: Arc<C>) -> Self {
        Self::with_tables(
            store,
            notifier,
            activity,
            clock,
            StatusTransitionTable::default(),
            AuthorityTable::default(),
        )
    }

    /// Creates a coordinator with explicit tables.
    #[must_use]
    pub const fn with_tables(
        store: Arc<S>,
        notifier: Arc<N>,
        activity: Arc<A>,
        clock: Arc<C>,
        transitions: StatusTransitionTable,
        authority: AuthorityTable,
    ) -> Self {
        Self {
            store,
            notifier,
            activity,
            clock,
            transitions,
            authority,
        }
    }

    /// Creates a task in `Draft` status.
    ///
    /// A staff-level assignee under a non-elevated creator requires
    /// elevated sign-off before the task can be assigned; elevated creators
    /// auto-approve their own creations.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::EmptyTitle`] or
    /// [`WorkflowDomainError::InvalidStoryPoints`] for malformed input.
    pub async fn create_task(
        &self,
        actor: Actor,
        request: CreateTaskRequest,
    ) -> WorkflowResult<Task> {
        let story_points = request.story_points.map(StoryPoints::new).transpose()?;
        let requires_approval = request
            .assignee
            .is_some_and(|assignee| assignee.role == ActorRole::Staff)
            && !actor.role.is_elevated();

        let task = Task::new(
            NewTaskParams {
                title: request.title,
                description: request.description,
                priority: request.priority,
                creator: actor.id,
                assignee: request.assignee.map(|assignee| assignee.id),
                parent: request.parent,
                project: request.project,
                story_points,
                requires_approval,
            },
            &*self.clock,
        )?;
        self.store.insert_task(&task).await?;

        if requires_approval {
            self.notifier
                .publish(WorkflowEvent::ApprovalRequired {
                    task_id: task.id(),
                    creator: actor.id,
                })
                .await;
        }
        self.record(actor, &task, "task_created", None, Some(json!(task.status())))
            .await;
        Ok(task)
    }

    /// Hands a task to an assignee, moving it to `Assigned`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Forbidden`] when the actor is neither
    /// the creator, an elevated role, nor authorised over the assignee's
    /// role, or when the task still awaits approval, and
    /// [`WorkflowDomainError::InvalidTransition`] when the current status
    /// has no edge to `Assigned`.
    pub async fn assign(
        &self,
        actor: Actor,
        task_id: TaskId,
        assignee: Assignee,
    ) -> WorkflowResult<Task> {
        let mut task = self.require_task(task_id).await?;

        let authorised = task.is_creator(actor.id)
            || actor.role.is_elevated()
            || self.authority.may_act_on(actor.role, assignee.role);
        if !authorised {
            return Err(forbidden("assign this task").into());
        }
        if !task.is_approved() {
            return Err(forbidden("assign a task awaiting approval").into());
        }

        let previous = task.assign_to(assignee.id, &self.transitions, &*self.clock)?;
        self.store.update_task(&task).await?;

        self.notifier
            .publish(WorkflowEvent::TaskAssigned {
                task_id,
                assignee: assignee.id,
                actor: actor.id,
            })
            .await;
        self.record(
            actor,
            &task,
            "task_assigned",
            Some(json!(previous)),
            Some(json!({ "status": task.status(), "assignee": assignee.id })),
        )
        .await;
        Ok(task)
    }

    /// Moves a task along a permitted edge of the transition table.
    ///
    /// Entering `Rejected` is routed through [`Self::reject`] so a reason
    /// is always recorded.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Forbidden`] when the actor is neither
    /// the creator, the assignee, nor elevated, and
    /// [`WorkflowDomainError::InvalidTransition`] when the table has no
    /// such edge.
    pub async fn change_status(
        &self,
        actor: Actor,
        task_id: TaskId,
        target: TaskStatus,
    ) -> WorkflowResult<Task> {
        let mut task = self.require_task(task_id).await?;

        if !self.may_mutate(actor, &task) {
            return Err(forbidden("change the status of this task").into());
        }
        if target == TaskStatus::Rejected {
            return Err(WorkflowDomainError::RejectionReasonRequired(task_id).into());
        }

        let previous = task.change_status(target, &self.transitions, &*self.clock)?;
        self.store.update_task(&task).await?;

        self.publish_status_change(actor, &task, previous).await;
        Ok(task)
    }

    /// Records an elevated sign-off on an approval-required task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Forbidden`] for non-elevated actors
    /// and [`WorkflowDomainError::ApprovalNotRequired`] when there is
    /// nothing to approve.
    pub async fn approve(&self, actor: Actor, task_id: TaskId) -> WorkflowResult<Task> {
        if !actor.role.is_elevated() {
            return Err(forbidden("approve tasks").into());
        }

        let mut task = self.require_task(task_id).await?;
        task.approve_by(actor.id, &*self.clock)?;
        self.store.update_task(&task).await?;

        self.notifier
            .publish(WorkflowEvent::TaskApproved {
                task_id,
                approver: actor.id,
            })
            .await;
        self.record(
            actor,
            &task,
            "task_approved",
            None,
            Some(json!({ "approved_by": actor.id })),
        )
        .await;
        Ok(task)
    }

    /// Refuses a task with a non-empty reason, moving it to `Rejected`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Forbidden`] for non-elevated actors,
    /// [`WorkflowDomainError::RejectionReasonRequired`] for an empty
    /// reason, and [`WorkflowDomainError::InvalidTransition`] when the
    /// current status has no edge to `Rejected`.
    pub async fn reject(
        &self,
        actor: Actor,
        task_id: TaskId,
        reason: &str,
    ) -> WorkflowResult<Task> {
        if !actor.role.is_elevated() {
            return Err(forbidden("reject tasks").into());
        }

        let mut task = self.require_task(task_id).await?;
        let previous = task.reject(reason, &self.transitions, &*self.clock)?;
        self.store.update_task(&task).await?;

        self.notifier
            .publish(WorkflowEvent::TaskRejected {
                task_id,
                approver: actor.id,
                reason: reason.trim().to_owned(),
            })
            .await;
        self.record(
            actor,
            &task,
            "task_rejected",
            Some(json!(previous)),
            Some(json!({ "status": task.status(), "reason": task.rejection_reason() })),
        )
        .await;
        Ok(task)
    }

    fn may_mutate(&self, actor: Actor, task: &Task) -> bool {
        task.is_creator(actor.id) || task.is_assignee(actor.id) || actor.role.is_elevated()
    }

    async fn publish_status_change(&self, actor: Actor, task: &Task, previous: TaskStatus) {
        self.notifier
            .publish(WorkflowEvent::StatusChanged {
                task_id: task.id(),
                actor: actor.id,
                previous,
                current: task.status(),
            })
            .await;
        self.record(
            actor,
            task,
            "status_changed",
            Some(json!(previous)),
            Some(json!(task.status())),
        )
        .await;
    }

    async fn require_task(&self, id: TaskId) -> WorkflowResult<Task> {
        Ok(self
            .store
            .find_task(id)
            .await?
            .ok_or(WorkflowStoreError::TaskNotFound(id))?)
    }

    async fn record(
        &self,
        actor: Actor,
        task: &Task,
        action: &str,
        previous: Option<serde_json::Value>,
        current: Option<serde_json::Value>,
    ) {
        let mut entry = ActivityEntry::new(
            ActivityEntity::Task,
            task.id().into_inner(),
            actor.id,
            action,
            self.clock.utc(),
        );
        if let Some(value) = previous {
            entry = entry.with_previous(value);
        }
        if let Some(value) = current {
            entry = entry.with_new(value);
        }
        self.activity.record(entry).await;
    }
}

fn forbidden(action: &str) -> WorkflowDomainError {
    WorkflowDomainError::Forbidden {
        action: action.to_owned(),
    }
}
