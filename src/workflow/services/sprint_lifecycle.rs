//! Sprint lifecycle manager: state machine, overlap and active-singleton
//! invariants, and task reassignment on completion or cancellation.

use crate::workflow::{
    domain::{
        Actor, NewSprintParams, Sprint, SprintId, SprintPolicy, SprintStatus, StoryPoints, Task,
        TaskId, WorkflowDomainError, WorkflowEvent,
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

/// Manages sprint lifecycles for a project.
///
/// The application-level checks here are backed by the store's partial
/// uniqueness constraint on active sprints; a race that slips past a check
/// surfaces as [`WorkflowStoreError::Conflict`] at commit time.
#[derive(Clone)]
pub struct SprintLifecycleService<S, N, A, C>
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
    policy: SprintPolicy,
}

impl<S, N, A, C> SprintLifecycleService<S, N, A, C>
where
    S: WorkflowStore,
    N: WorkflowNotifier,
    A: ActivityLog,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default scheduling policy.
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, activity: Arc<A>, clock: Arc<C>) -> Self {
        Self::with_policy(store, notifier, activity, clock, SprintPolicy::default())
    }

    /// Creates a service with an explicit scheduling policy.
    #[must_use]
    pub const fn with_policy(
        store: Arc<S>,
        notifier: Arc<N>,
        activity: Arc<A>,
        clock: Arc<C>,
        policy: SprintPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            activity,
            clock,
            policy,
        }
    }

    /// Creates a sprint in `Planning` status.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidDateRange`] for a malformed
    /// window and [`WorkflowDomainError::OverlappingSprint`] when the window
    /// intersects another planning or active sprint in the project.
    pub async fn create(&self, actor: Actor, params: NewSprintParams) -> WorkflowResult<Sprint> {
        let sprint = Sprint::new(params, self.policy, &*self.clock)?;
        self.ensure_window_free(&sprint).await?;
        self.store.insert_sprint(&sprint).await?;

        self.record(
            actor,
            &sprint,
            "sprint_created",
            None,
            Some(json!(sprint.status())),
        )
        .await;
        Ok(sprint)
    }

    /// Starts a planning sprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidSprintTransition`] when the
    /// sprint is not in planning and
    /// [`WorkflowDomainError::ActiveSprintExists`] when the project already
    /// has an active sprint.
    pub async fn start(&self, actor: Actor, sprint_id: SprintId) -> WorkflowResult<Sprint> {
        let mut sprint = self.require_sprint(sprint_id).await?;
        let previous = sprint.transition_to(SprintStatus::Active, self.policy, &*self.clock)?;

        if let Some(active) = self.store.find_active_sprint(sprint.project()).await?
            && active.id() != sprint.id()
        {
            return Err(WorkflowDomainError::ActiveSprintExists {
                project_id: sprint.project(),
                active: active.id(),
            }
            .into());
        }

        self.store.update_sprint(&sprint).await?;

        self.notifier
            .publish(WorkflowEvent::SprintStarted {
                sprint_id: sprint.id(),
                project: sprint.project(),
                actor: actor.id,
            })
            .await;
        self.record(
            actor,
            &sprint,
            "sprint_started",
            Some(json!(previous)),
            Some(json!(sprint.status())),
        )
        .await;
        Ok(sprint)
    }

    /// Completes an active sprint.
    ///
    /// Tasks that have not reached the terminal-complete status move to
    /// `move_incomplete_to` when given, otherwise back to the backlog. The
    /// final velocity is the story-point sum of completed tasks.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidSprintTransition`] when the
    /// sprint is not active, [`WorkflowDomainError::SprintProjectMismatch`]
    /// when the target sprint belongs to another project, and
    /// [`WorkflowDomainError::SprintClosed`] when the target sprint is
    /// closed.
    pub async fn complete(
        &self,
        actor: Actor,
        sprint_id: SprintId,
        move_incomplete_to: Option<SprintId>,
    ) -> WorkflowResult<Sprint> {
        let mut sprint = self.require_sprint(sprint_id).await?;

        if let Some(target_id) = move_incomplete_to {
            let target = self.require_sprint(target_id).await?;
            if target.project() != sprint.project() {
                return Err(WorkflowDomainError::SprintProjectMismatch {
                    sprint_id,
                    other: target_id,
                }
                .into());
            }
            if target.status().is_closed() {
                return Err(WorkflowDomainError::SprintClosed(target_id).into());
            }
        }

        let tasks = self.store.find_tasks_by_sprint(sprint_id).await?;
        let velocity = completed_points(&tasks);
        let previous = sprint.complete(velocity, self.policy, &*self.clock)?;

        for mut task in tasks {
            if task.status().is_terminal_complete() {
                continue;
            }
            task.move_to_sprint(move_incomplete_to, &*self.clock);
            self.store.update_task(&task).await?;
        }
        self.store.update_sprint(&sprint).await?;

        self.notifier
            .publish(WorkflowEvent::SprintCompleted {
                sprint_id: sprint.id(),
                project: sprint.project(),
                velocity,
                actor: actor.id,
            })
            .await;
        self.record(
            actor,
            &sprint,
            "sprint_completed",
            Some(json!(previous)),
            Some(json!({ "status": sprint.status(), "velocity": velocity })),
        )
        .await;
        Ok(sprint)
    }

    /// Cancels a planning or active sprint, detaching all of its tasks back
    /// to the backlog unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidSprintTransition`] when the
    /// sprint is already completed or cancelled; cancellation is not a
    /// self-loop.
    pub async fn cancel(&self, actor: Actor, sprint_id: SprintId) -> WorkflowResult<Sprint> {
        let mut sprint = self.require_sprint(sprint_id).await?;
        let previous = sprint.transition_to(SprintStatus::Cancelled, self.policy, &*self.clock)?;

        for mut task in self.store.find_tasks_by_sprint(sprint_id).await? {
            task.move_to_sprint(None, &*self.clock);
            self.store.update_task(&task).await?;
        }
        self.store.update_sprint(&sprint).await?;

        self.record(
            actor,
            &sprint,
            "sprint_cancelled",
            Some(json!(previous)),
            Some(json!(sprint.status())),
        )
        .await;
        Ok(sprint)
    }

    /// Reopens a cancelled sprint into planning, when the policy permits.
    ///
    /// The window is re-validated against the project's open sprints, which
    /// may have moved in since the cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidSprintTransition`] when the
    /// sprint is not cancelled or the policy forbids reopening, and
    /// [`WorkflowDomainError::OverlappingSprint`] when the window is taken.
    pub async fn reopen(&self, actor: Actor, sprint_id: SprintId) -> WorkflowResult<Sprint> {
        let mut sprint = self.require_sprint(sprint_id).await?;
        let previous = sprint.transition_to(SprintStatus::Planning, self.policy, &*self.clock)?;
        self.ensure_window_free(&sprint).await?;
        self.store.update_sprint(&sprint).await?;

        self.record(
            actor,
            &sprint,
            "sprint_reopened",
            Some(json!(previous)),
            Some(json!(sprint.status())),
        )
        .await;
        Ok(sprint)
    }

    /// Adds tasks to an open sprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::SprintClosed`] when the sprint is
    /// completed or cancelled and
    /// [`WorkflowDomainError::TaskProjectMismatch`] when a task belongs to
    /// a different project than the sprint.
    pub async fn add_tasks(
        &self,
        actor: Actor,
        sprint_id: SprintId,
        task_ids: &[TaskId],
    ) -> WorkflowResult<()> {
        let sprint = self.require_open_sprint(sprint_id).await?;

        for &task_id in task_ids {
            let mut task = self.require_task(task_id).await?;
            if task.project() != Some(sprint.project()) {
                return Err(WorkflowDomainError::TaskProjectMismatch { task_id, sprint_id }.into());
            }
            task.move_to_sprint(Some(sprint_id), &*self.clock);
            self.store.update_task(&task).await?;
        }

        self.record(
            actor,
            &sprint,
            "sprint_tasks_added",
            None,
            Some(json!(task_ids)),
        )
        .await;
        Ok(())
    }

    /// Removes tasks from an open sprint back to the backlog. Tasks not in
    /// the sprint are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::SprintClosed`] when the sprint is
    /// completed or cancelled.
    pub async fn remove_tasks(
        &self,
        actor: Actor,
        sprint_id: SprintId,
        task_ids: &[TaskId],
    ) -> WorkflowResult<()> {
        let sprint = self.require_open_sprint(sprint_id).await?;

        for &task_id in task_ids {
            let mut task = self.require_task(task_id).await?;
            if task.sprint() != Some(sprint_id) {
                continue;
            }
            task.move_to_sprint(None, &*self.clock);
            self.store.update_task(&task).await?;
        }

        self.record(
            actor,
            &sprint,
            "sprint_tasks_removed",
            None,
            Some(json!(task_ids)),
        )
        .await;
        Ok(())
    }

    async fn ensure_window_free(&self, sprint: &Sprint) -> WorkflowResult<()> {
        let siblings = self.store.find_sprints_by_project(sprint.project()).await?;
        for other in &siblings {
            if other.id() != sprint.id()
                && other.status().occupies_window()
                && sprint.overlaps(other)
            {
                return Err(WorkflowDomainError::OverlappingSprint {
                    project_id: sprint.project(),
                    other: other.id(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn require_sprint(&self, id: SprintId) -> WorkflowResult<Sprint> {
        Ok(self
            .store
            .find_sprint(id)
            .await?
            .ok_or(WorkflowStoreError::SprintNotFound(id))?)
    }

    async fn require_open_sprint(&self, id: SprintId) -> WorkflowResult<Sprint> {
        let sprint = self.require_sprint(id).await?;
        if sprint.status().is_closed() {
            return Err(WorkflowDomainError::SprintClosed(id).into());
        }
        Ok(sprint)
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
        sprint: &Sprint,
        action: &str,
        previous: Option<serde_json::Value>,
        current: Option<serde_json::Value>,
    ) {
        let mut entry = ActivityEntry::new(
            ActivityEntity::Sprint,
            sprint.id().into_inner(),
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

/// Sums the story points of tasks that reached the terminal-complete
/// status.
fn completed_points(tasks: &[Task]) -> u32 {
    tasks
        .iter()
        .filter(|task| task.status().is_terminal_complete())
        .filter_map(Task::story_points)
        .map(StoryPoints::value)
        .sum()
}
