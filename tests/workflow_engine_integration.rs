//! Behavioural integration tests for the workflow engine over the
//! in-memory store.
//!
//! These tests exercise the coordinator, dependency graph, and sprint
//! lifecycle services together in realistic project flows, verifying that
//! the three invariants hold across service boundaries.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
#![expect(
    clippy::cognitive_complexity,
    reason = "Test functions may have higher complexity for full scenario coverage"
)]
#![expect(
    clippy::shadow_unrelated,
    reason = "Test code reuses variable names for clarity in sequential assertions"
)]

use gantt::workflow::{
    adapters::memory::{InMemoryWorkflowStore, RecordingActivityLog, RecordingNotifier},
    domain::{
        Actor, ActorRole, DependencyKind, NewSprintParams, ProjectId, SprintStatus, TaskStatus,
        UserId, WorkflowDomainError, WorkflowEvent,
    },
    ports::WorkflowStore,
    services::{
        Assignee, CreateTaskRequest, DependencyGraphService, SprintLifecycleService,
        TaskWorkflowCoordinator, WorkflowError,
    },
};
use chrono::{Days, Utc};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Creates a tokio runtime for async operations in tests.
fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

type MemoryCoordinator = TaskWorkflowCoordinator<
    InMemoryWorkflowStore,
    RecordingNotifier,
    RecordingActivityLog,
    DefaultClock,
>;
type MemoryGraph = DependencyGraphService<
    InMemoryWorkflowStore,
    RecordingNotifier,
    RecordingActivityLog,
    DefaultClock,
>;
type MemorySprints = SprintLifecycleService<
    InMemoryWorkflowStore,
    RecordingNotifier,
    RecordingActivityLog,
    DefaultClock,
>;

struct Engine {
    store: Arc<InMemoryWorkflowStore>,
    notifier: Arc<RecordingNotifier>,
    activity: Arc<RecordingActivityLog>,
    coordinator: MemoryCoordinator,
    graph: MemoryGraph,
    sprints: MemorySprints,
}

fn engine() -> Engine {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let activity = Arc::new(RecordingActivityLog::new());
    let clock = Arc::new(DefaultClock);

    Engine {
        coordinator: TaskWorkflowCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&activity),
            Arc::clone(&clock),
        ),
        graph: DependencyGraphService::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&activity),
            Arc::clone(&clock),
        ),
        sprints: SprintLifecycleService::new(
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

fn sprint_window(project: ProjectId, name: &str, offset: u64, length: u64) -> NewSprintParams {
    let today = Utc::now().date_naive();
    let start_date = today.checked_add_days(Days::new(offset)).expect("date in range");
    let end_date = start_date
        .checked_add_days(Days::new(length))
        .expect("date in range");
    NewSprintParams {
        project,
        name: name.to_owned(),
        goal: None,
        start_date,
        end_date,
        capacity: Some(40),
    }
}

/// A staff-created task for a staff assignee walks the full approval,
/// assignment, and completion path, emitting the expected events in order.
#[test]
fn approval_gated_task_reaches_completion() {
    let rt = test_runtime();
    let engine = engine();

    let creator = Actor::new(UserId::new(), ActorRole::Staff);
    let manager = Actor::new(UserId::new(), ActorRole::Manager);
    let worker = Assignee::new(UserId::new(), ActorRole::Staff);

    // Creation flags the task for elevated sign-off.
    let task = rt
        .block_on(engine.coordinator.create_task(
            creator,
            CreateTaskRequest::new("Migrate the billing exports").with_assignee(worker),
        ))
        .expect("create task");
    assert!(task.requires_approval());

    // Assignment is held until the sign-off lands.
    let blocked = rt.block_on(engine.coordinator.assign(creator, task.id(), worker));
    assert!(matches!(
        blocked,
        Err(WorkflowError::Domain(WorkflowDomainError::Forbidden { .. }))
    ));

    rt.block_on(engine.coordinator.approve(manager, task.id()))
        .expect("approve task");
    rt.block_on(engine.coordinator.assign(creator, task.id(), worker))
        .expect("assign task");

    // The assignee works the task to completion.
    let as_worker = Actor::new(worker.id, worker.role);
    rt.block_on(
        engine
            .coordinator
            .change_status(as_worker, task.id(), TaskStatus::InProgress),
    )
    .expect("start work");
    let done = rt
        .block_on(
            engine
                .coordinator
                .change_status(as_worker, task.id(), TaskStatus::Completed),
        )
        .expect("complete work");
    assert_eq!(done.status(), TaskStatus::Completed);

    // Completed is terminal.
    let resurrect = rt.block_on(engine.coordinator.change_status(
        manager,
        task.id(),
        TaskStatus::InProgress,
    ));
    assert!(matches!(
        resurrect,
        Err(WorkflowError::Domain(WorkflowDomainError::InvalidTransition { .. }))
    ));

    let events = engine.notifier.events();
    let kinds: Vec<&str> = events
        .iter()
        .map(|event| match event {
            WorkflowEvent::ApprovalRequired { .. } => "approval_required",
            WorkflowEvent::TaskApproved { .. } => "task_approved",
            WorkflowEvent::TaskAssigned { .. } => "task_assigned",
            WorkflowEvent::StatusChanged { .. } => "status_changed",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "approval_required",
            "task_approved",
            "task_assigned",
            "status_changed",
            "status_changed",
        ],
    );

    // Every accepted mutation left an activity entry.
    let actions: Vec<String> = engine
        .activity
        .entries()
        .iter()
        .map(|entry| entry.action.clone())
        .collect();
    assert!(actions.contains(&"task_created".to_owned()));
    assert!(actions.contains(&"task_approved".to_owned()));
    assert!(actions.contains(&"status_changed".to_owned()));
}

/// Dependencies constrain a sprint's tasks: the graph stays acyclic, the
/// blocking view flips as blockers complete, and sprint completion computes
/// velocity from completed points while carrying unfinished work forward.
#[test]
fn dependency_aware_sprint_runs_to_completion() {
    let rt = test_runtime();
    let engine = engine();

    let manager = Actor::new(UserId::new(), ActorRole::Manager);
    let project = ProjectId::new();

    let schema = rt
        .block_on(engine.coordinator.create_task(
            manager,
            CreateTaskRequest::new("Design the ledger schema")
                .with_project(project)
                .with_story_points(5),
        ))
        .expect("create schema task");
    let api = rt
        .block_on(engine.coordinator.create_task(
            manager,
            CreateTaskRequest::new("Expose the ledger API")
                .with_project(project)
                .with_story_points(8),
        ))
        .expect("create api task");

    // The API work depends on the schema work; the reverse edge must close
    // a cycle and be refused.
    rt.block_on(engine.graph.add_edge(
        manager,
        api.id(),
        schema.id(),
        DependencyKind::FinishToStart,
    ))
    .expect("add edge");
    let cycle = rt.block_on(engine.graph.add_edge(
        manager,
        schema.id(),
        api.id(),
        DependencyKind::FinishToStart,
    ));
    assert!(matches!(
        cycle,
        Err(WorkflowError::Domain(WorkflowDomainError::CycleDetected { .. }))
    ));

    let info = rt
        .block_on(engine.graph.blocking_info(api.id()))
        .expect("blocking info");
    assert!(info.is_blocked);
    assert_eq!(info.blocked_by, vec![schema.id()]);

    // Plan and start the sprint with both tasks aboard.
    let sprint = rt
        .block_on(
            engine
                .sprints
                .create(manager, sprint_window(project, "Ledger sprint", 0, 14)),
        )
        .expect("create sprint");
    rt.block_on(
        engine
            .sprints
            .add_tasks(manager, sprint.id(), &[schema.id(), api.id()]),
    )
    .expect("add tasks");
    rt.block_on(engine.sprints.start(manager, sprint.id()))
        .expect("start sprint");

    // A second active sprint in the project is refused.
    let rival = rt
        .block_on(
            engine
                .sprints
                .create(manager, sprint_window(project, "Rival sprint", 20, 14)),
        )
        .expect("create rival sprint");
    let second_active = rt.block_on(engine.sprints.start(manager, rival.id()));
    assert!(matches!(
        second_active,
        Err(WorkflowError::Domain(WorkflowDomainError::ActiveSprintExists { .. }))
    ));

    // Hand the schema work to an engineer and finish it; the API task
    // unblocks on the next read.
    let engineer = Assignee::new(UserId::new(), ActorRole::Staff);
    rt.block_on(engine.coordinator.assign(manager, schema.id(), engineer))
        .expect("assign schema");
    rt.block_on(
        engine
            .coordinator
            .change_status(manager, schema.id(), TaskStatus::InProgress),
    )
    .expect("start schema");
    rt.block_on(
        engine
            .coordinator
            .change_status(manager, schema.id(), TaskStatus::Completed),
    )
    .expect("complete schema");

    let unblocked = rt
        .block_on(engine.graph.blocking_info(api.id()))
        .expect("blocking info");
    assert!(unblocked.can_start());

    // Close the sprint: velocity counts only completed points, and the
    // unfinished API task carries into the next sprint.
    let closed = rt
        .block_on(engine.sprints.complete(manager, sprint.id(), Some(rival.id())))
        .expect("complete sprint");
    assert_eq!(closed.status(), SprintStatus::Completed);
    assert_eq!(closed.velocity(), Some(5));

    let carried = rt
        .block_on(engine.store.find_task(api.id()))
        .expect("find task")
        .expect("task exists");
    assert_eq!(carried.sprint(), Some(rival.id()));

    let finished = rt
        .block_on(engine.store.find_task(schema.id()))
        .expect("find task")
        .expect("task exists");
    assert_eq!(finished.sprint(), Some(sprint.id()));
}

/// Cancelling a sprint releases its window and detaches its tasks; the
/// cancelled sprint can be reopened only while the window stays free.
#[test]
fn cancelled_sprint_window_contention() {
    let rt = test_runtime();
    let engine = engine();

    let manager = Actor::new(UserId::new(), ActorRole::Manager);
    let project = ProjectId::new();

    let sprint = rt
        .block_on(
            engine
                .sprints
                .create(manager, sprint_window(project, "First cut", 0, 14)),
        )
        .expect("create sprint");
    let task = rt
        .block_on(engine.coordinator.create_task(
            manager,
            CreateTaskRequest::new("Spike the importer").with_project(project),
        ))
        .expect("create task");
    rt.block_on(engine.sprints.add_tasks(manager, sprint.id(), &[task.id()]))
        .expect("add task");

    rt.block_on(engine.sprints.cancel(manager, sprint.id()))
        .expect("cancel sprint");
    let detached = rt
        .block_on(engine.store.find_task(task.id()))
        .expect("find task")
        .expect("task exists");
    assert!(detached.sprint().is_none());

    // The released window is claimed by a replacement sprint.
    let replacement = rt
        .block_on(
            engine
                .sprints
                .create(manager, sprint_window(project, "Second cut", 0, 14)),
        )
        .expect("create replacement");

    // Reopening the cancelled sprint now collides with the replacement.
    let reopen = rt.block_on(engine.sprints.reopen(manager, sprint.id()));
    assert!(matches!(
        reopen,
        Err(WorkflowError::Domain(WorkflowDomainError::OverlappingSprint { other, .. }))
            if other == replacement.id()
    ));

    // Once the replacement is cancelled the window frees up again.
    rt.block_on(engine.sprints.cancel(manager, replacement.id()))
        .expect("cancel replacement");
    let reopened = rt
        .block_on(engine.sprints.reopen(manager, sprint.id()))
        .expect("reopen sprint");
    assert_eq!(reopened.status(), SprintStatus::Planning);
}
