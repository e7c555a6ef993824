//! Shared fixtures for workflow unit tests.

use crate::workflow::{
    adapters::memory::{InMemoryWorkflowStore, RecordingActivityLog, RecordingNotifier},
    domain::{
        Actor, ActorRole, NewSprintParams, PersistedSprintData, PersistedTaskData, ProjectId,
        Sprint, SprintId, SprintPolicy, SprintStatus, StoryPoints, Task, TaskId, TaskPriority,
        TaskStatus, UserId,
    },
    services::{DependencyGraphService, SprintLifecycleService, TaskWorkflowCoordinator},
};
use chrono::{Days, NaiveDate, Utc};
use mockable::DefaultClock;
use std::sync::Arc;

/// Service bundle over the in-memory adapters.
pub struct Harness {
    /// Shared store.
    pub store: Arc<InMemoryWorkflowStore>,
    /// Recording notifier.
    pub notifier: Arc<RecordingNotifier>,
    /// Recording activity log.
    pub activity: Arc<RecordingActivityLog>,
    /// Dependency graph manager under test.
    pub graph:
        DependencyGraphService<InMemoryWorkflowStore, RecordingNotifier, RecordingActivityLog, DefaultClock>,
    /// Sprint lifecycle manager under test.
    pub sprints: SprintLifecycleService<
        InMemoryWorkflowStore,
        RecordingNotifier,
        RecordingActivityLog,
        DefaultClock,
    >,
    /// Coordinator under test.
    pub coordinator: TaskWorkflowCoordinator<
        InMemoryWorkflowStore,
        RecordingNotifier,
        RecordingActivityLog,
        DefaultClock,
    >,
}

/// Builds a harness with the given sprint policy.
pub fn harness_with_policy(policy: SprintPolicy) -> Harness {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let activity = Arc::new(RecordingActivityLog::new());
    let clock = Arc::new(DefaultClock);

    Harness {
        graph: DependencyGraphService::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&activity),
            Arc::clone(&clock),
        ),
        sprints: SprintLifecycleService::with_policy(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&activity),
            Arc::clone(&clock),
            policy,
        ),
        coordinator: TaskWorkflowCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&activity),
            clock,
        ),
        store,
        notifier,
        activity,
    }
}

/// Builds a harness with the default sprint policy.
pub fn harness() -> Harness {
    harness_with_policy(SprintPolicy::default())
}

/// An actor with the given role and a fresh identity.
pub fn actor(role: ActorRole) -> Actor {
    Actor::new(UserId::new(), role)
}

/// Fabricates a task snapshot with the given status, bypassing the
/// transition table the way a persisted record would.
pub fn persisted_task(
    project: Option<ProjectId>,
    sprint: Option<SprintId>,
    status: TaskStatus,
    story_points: Option<u32>,
) -> Task {
    let now = Utc::now();
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: "fixture task".to_owned(),
        description: None,
        status,
        priority: TaskPriority::Medium,
        creator: UserId::new(),
        assignee: Some(UserId::new()),
        parent: None,
        project,
        sprint,
        requires_approval: false,
        approved_by: None,
        rejection_reason: None,
        story_points: story_points.and_then(|points| StoryPoints::new(points).ok()),
        created_at: now,
        updated_at: now,
    })
}

/// Fabricates a sprint snapshot with the given status and window.
pub fn persisted_sprint(
    project: ProjectId,
    status: SprintStatus,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Sprint {
    let now = Utc::now();
    Sprint::from_persisted(PersistedSprintData {
        id: SprintId::new(),
        project,
        name: "fixture sprint".to_owned(),
        goal: None,
        status,
        start_date,
        end_date,
        capacity: None,
        velocity: None,
        created_at: now,
        updated_at: now,
    })
}

/// Sprint creation parameters with a window `offset` days from today,
/// lasting `length` days.
pub fn sprint_params(project: ProjectId, offset: u64, length: u64) -> NewSprintParams {
    let today = Utc::now().date_naive();
    let start_date = today
        .checked_add_days(Days::new(offset))
        .unwrap_or(today);
    let end_date = start_date
        .checked_add_days(Days::new(length))
        .unwrap_or(start_date);
    NewSprintParams {
        project,
        name: "fixture sprint".to_owned(),
        goal: None,
        start_date,
        end_date,
        capacity: None,
    }
}
