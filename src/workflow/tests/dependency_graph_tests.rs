//! Unit tests for dependency graph maintenance and cycle detection.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
#![expect(
    clippy::indexing_slicing,
    reason = "Test code indexes fixture vectors of known length"
)]

use crate::workflow::{
    domain::{
        ActorRole, DependencyKind, StatusTransitionTable, TaskId, TaskStatus, WorkflowDomainError,
        WorkflowEvent,
    },
    ports::{WorkflowStore, WorkflowStoreError},
    services::WorkflowError,
    tests::support::{self, Harness},
};
use eyre::ensure;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::collections::HashMap;

#[fixture]
fn harness() -> Harness {
    support::harness()
}

async fn seed_tasks(harness: &Harness, count: usize) -> Vec<TaskId> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let task = support::persisted_task(None, None, TaskStatus::InProgress, None);
        harness
            .store
            .insert_task(&task)
            .await
            .expect("task insert should succeed");
        ids.push(task.id());
    }
    ids
}

/// Returns whether the directed edge set admits a topological order.
fn has_topological_order(nodes: &[TaskId], edges: &[(TaskId, TaskId)]) -> bool {
    let mut indegree: HashMap<TaskId, usize> = nodes.iter().map(|&node| (node, 0)).collect();
    for &(_, blocking) in edges {
        if let Some(count) = indegree.get_mut(&blocking) {
            *count += 1;
        }
    }

    let mut ready: Vec<TaskId> = indegree
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&node, _)| node)
        .collect();
    let mut removed = 0_usize;

    while let Some(node) = ready.pop() {
        removed += 1;
        for &(dependent, blocking) in edges {
            if dependent != node {
                continue;
            }
            if let Some(count) = indegree.get_mut(&blocking) {
                *count -= 1;
                if *count == 0 {
                    ready.push(blocking);
                }
            }
        }
    }

    removed == nodes.len()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_edge_rejects_self_dependency(harness: Harness) {
    let actor = support::actor(ActorRole::Staff);
    let task = seed_tasks(&harness, 1).await[0];

    let result = harness
        .graph
        .add_edge(actor, task, task, DependencyKind::FinishToStart)
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(WorkflowDomainError::SelfDependency(id))) if id == task
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_edge_requires_both_tasks(harness: Harness) {
    let actor = support::actor(ActorRole::Staff);
    let known = seed_tasks(&harness, 1).await[0];
    let missing = TaskId::new();

    let result = harness
        .graph
        .add_edge(actor, known, missing, DependencyKind::FinishToStart)
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Store(WorkflowStoreError::TaskNotFound(id))) if id == missing
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_edge_rejects_duplicate_pair(harness: Harness) {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 2).await;

    harness
        .graph
        .add_edge(actor, ids[0], ids[1], DependencyKind::FinishToStart)
        .await
        .expect("first edge should insert");
    let result = harness
        .graph
        .add_edge(actor, ids[0], ids[1], DependencyKind::FinishToStart)
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(WorkflowDomainError::DuplicateEdge { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_edge_rejects_direct_reverse_edge(harness: Harness) {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 2).await;

    harness
        .graph
        .add_edge(actor, ids[0], ids[1], DependencyKind::FinishToStart)
        .await
        .expect("forward edge should insert");
    let result = harness
        .graph
        .add_edge(actor, ids[1], ids[0], DependencyKind::FinishToStart)
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(WorkflowDomainError::CycleDetected { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_edge_rejects_transitive_cycle(harness: Harness) {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 3).await;

    harness
        .graph
        .add_edge(actor, ids[0], ids[1], DependencyKind::FinishToStart)
        .await
        .expect("edge 0 -> 1 should insert");
    harness
        .graph
        .add_edge(actor, ids[1], ids[2], DependencyKind::FinishToStart)
        .await
        .expect("edge 1 -> 2 should insert");

    let result = harness
        .graph
        .add_edge(actor, ids[2], ids[0], DependencyKind::FinishToStart)
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(WorkflowDomainError::CycleDetected { .. }))
    ));
}

#[rstest]
#[case::chain(vec![(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)])]
#[case::diamond(vec![(0, 1), (0, 2), (1, 3), (2, 3), (3, 0), (3, 1)])]
#[case::dense(vec![(0, 1), (1, 2), (0, 2), (2, 0), (3, 0), (2, 3), (1, 3), (3, 1)])]
#[case::repeats(vec![(0, 1), (0, 1), (1, 0), (1, 2), (2, 0), (0, 2)])]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_edges_always_admit_a_topological_order(
    harness: Harness,
    #[case] attempts: Vec<(usize, usize)>,
) -> eyre::Result<()> {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 4).await;

    let mut accepted = Vec::new();
    for (from, to) in attempts {
        let dependent = *ids.get(from).expect("index in range");
        let blocking = *ids.get(to).expect("index in range");
        if harness
            .graph
            .add_edge(actor, dependent, blocking, DependencyKind::FinishToStart)
            .await
            .is_ok()
        {
            accepted.push((dependent, blocking));
        }
    }

    ensure!(has_topological_order(&ids, &accepted));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remove_edge_is_idempotent(harness: Harness) -> eyre::Result<()> {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 2).await;

    let edge = harness
        .graph
        .add_edge(actor, ids[0], ids[1], DependencyKind::FinishToStart)
        .await
        .expect("edge should insert");

    ensure!(harness.graph.remove_edge(actor, edge.id()).await?);
    ensure!(!harness.graph.remove_edge(actor, edge.id()).await?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_the_blocker_unblocks_on_next_read(harness: Harness) -> eyre::Result<()> {
    let actor = support::actor(ActorRole::Staff);
    let dependent = support::persisted_task(None, None, TaskStatus::Draft, None);
    let mut blocker = support::persisted_task(None, None, TaskStatus::InProgress, None);
    harness.store.insert_task(&dependent).await?;
    harness.store.insert_task(&blocker).await?;

    harness
        .graph
        .add_edge(
            actor,
            dependent.id(),
            blocker.id(),
            DependencyKind::FinishToStart,
        )
        .await?;

    let before = harness.graph.blocking_info(dependent.id()).await?;
    ensure!(before.is_blocked);
    ensure!(!before.can_start());
    ensure!(before.blocked_by == vec![blocker.id()]);

    blocker.change_status(
        TaskStatus::Completed,
        &StatusTransitionTable::default(),
        &DefaultClock,
    )?;
    harness.store.update_task(&blocker).await?;

    let after = harness.graph.blocking_info(dependent.id()).await?;
    ensure!(!after.is_blocked);
    ensure!(after.can_start());
    ensure!(after.blocked_by == vec![blocker.id()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn relates_to_edges_never_block(harness: Harness) -> eyre::Result<()> {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 2).await;

    harness
        .graph
        .add_edge(actor, ids[0], ids[1], DependencyKind::RelatesTo)
        .await?;

    let info = harness.graph.blocking_info(ids[0]).await?;
    ensure!(!info.is_blocked);
    ensure!(info.blocked_by.is_empty());

    let reverse = harness.graph.blocking_info(ids[1]).await?;
    ensure!(reverse.blocking.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blocking_view_lists_dependents_of_a_blocker(harness: Harness) -> eyre::Result<()> {
    let actor = support::actor(ActorRole::Staff);
    let ids = seed_tasks(&harness, 3).await;

    harness
        .graph
        .add_edge(actor, ids[0], ids[2], DependencyKind::FinishToStart)
        .await?;
    harness
        .graph
        .add_edge(actor, ids[1], ids[2], DependencyKind::FinishToStart)
        .await?;

    let mut info = harness.graph.blocking_info(ids[2]).await?;
    info.blocking.sort();
    let mut expected = vec![ids[0], ids[1]];
    expected.sort();
    ensure!(info.blocking == expected);
    ensure!(!info.is_blocked);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn add_edge_notifies_the_dependent_assignee(harness: Harness) -> eyre::Result<()> {
    let actor = support::actor(ActorRole::Lead);
    let dependent = support::persisted_task(None, None, TaskStatus::Assigned, None);
    let blocker = support::persisted_task(None, None, TaskStatus::Draft, None);
    harness.store.insert_task(&dependent).await?;
    harness.store.insert_task(&blocker).await?;

    harness
        .graph
        .add_edge(
            actor,
            dependent.id(),
            blocker.id(),
            DependencyKind::FinishToStart,
        )
        .await?;

    let events = harness.notifier.events();
    let Some(WorkflowEvent::DependencyAdded { recipient, .. }) = events.first() else {
        eyre::bail!("expected a dependency added event, got {events:?}");
    };
    ensure!(*recipient == dependent.assignee());

    let entries = harness.activity.entries();
    ensure!(entries.iter().any(|entry| entry.action == "dependency_added"));
    Ok(())
}
