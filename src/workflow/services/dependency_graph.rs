//! Dependency graph manager: edge maintenance, cycle detection, and the
//! derived blocking view.

use crate::workflow::{
    domain::{
        Actor, BlockingInfo, DependencyId, DependencyKind, Task, TaskDependency, TaskId,
        WorkflowDomainError, WorkflowEvent,
    },
    ports::{
        ActivityEntity, ActivityEntry, ActivityLog, WorkflowNotifier, WorkflowStore,
        WorkflowStoreError,
    },
    services::WorkflowResult,
};
use mockable::Clock;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Maintains the directed blocking graph over tasks.
///
/// The graph is stored as an edge list; every traversal step re-queries the
/// store rather than caching adjacency in memory, so reads always observe
/// the latest committed edges.
#[derive(Clone)]
pub struct DependencyGraphService<S, N, A, C>
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
}

impl<S, N, A, C> DependencyGraphService<S, N, A, C>
where
    S: WorkflowStore,
    N: WorkflowNotifier,
    A: ActivityLog,
    C: Clock + Send + Sync,
{
    /// Creates a new dependency graph service.
    #[must_use]
    pub const fn new(store: Arc<S>, notifier: Arc<N>, activity: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            store,
            notifier,
            activity,
            clock,
        }
    }

    /// Inserts the edge `dependent -> blocking` after validating the
    /// acyclicity invariant.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::SelfDependency`] when both ends are
    /// the same task, [`WorkflowStoreError::TaskNotFound`] when either task
    /// is missing, [`WorkflowDomainError::DuplicateEdge`] when the ordered
    /// pair already exists, and [`WorkflowDomainError::CycleDetected`] when
    /// the edge would close a cycle. A concurrent duplicate insert that
    /// slips past the check surfaces as [`WorkflowStoreError::Conflict`].
    pub async fn add_edge(
        &self,
        actor: Actor,
        dependent: TaskId,
        blocking: TaskId,
        kind: DependencyKind,
    ) -> WorkflowResult<TaskDependency> {
        if dependent == blocking {
            return Err(WorkflowDomainError::SelfDependency(dependent).into());
        }

        let dependent_task = self.require_task(dependent).await?;
        self.require_task(blocking).await?;

        if self.store.find_edge(dependent, blocking).await?.is_some() {
            return Err(WorkflowDomainError::DuplicateEdge {
                dependent,
                blocking,
            }
            .into());
        }

        // Direct reverse edge is the common cycle case; skip the traversal.
        if self.store.find_edge(blocking, dependent).await?.is_some() {
            return Err(WorkflowDomainError::CycleDetected {
                dependent,
                blocking,
            }
            .into());
        }

        if self.reaches(blocking, dependent).await? {
            return Err(WorkflowDomainError::CycleDetected {
                dependent,
                blocking,
            }
            .into());
        }

        let edge = TaskDependency::new(dependent, blocking, kind, &*self.clock)?;
        self.store.insert_edge(&edge).await?;

        self.notifier
            .publish(WorkflowEvent::DependencyAdded {
                dependent,
                blocking,
                actor: actor.id,
                recipient: dependent_task.assignee(),
            })
            .await;
        self.activity
            .record(
                ActivityEntry::new(
                    ActivityEntity::Dependency,
                    edge.id().into_inner(),
                    actor.id,
                    "dependency_added",
                    self.clock.utc(),
                )
                .with_new(json!({
                    "dependent": dependent,
                    "blocking": blocking,
                    "kind": kind,
                })),
            )
            .await;

        Ok(edge)
    }

    /// Deletes an edge by identifier. Idempotent; returns whether an edge
    /// was actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError`] variants when the store fails.
    pub async fn remove_edge(&self, actor: Actor, id: DependencyId) -> WorkflowResult<bool> {
        let removed = self.store.delete_edge(id).await?;
        if removed {
            self.activity
                .record(ActivityEntry::new(
                    ActivityEntity::Dependency,
                    id.into_inner(),
                    actor.id,
                    "dependency_removed",
                    self.clock.utc(),
                ))
                .await;
        }
        Ok(removed)
    }

    /// Derives the blocking view for a task.
    ///
    /// A task is blocked iff some blocking-kind edge points at a task that
    /// has not reached the terminal-complete status. The view is computed
    /// fresh from the store on every call; completing a blocker flips the
    /// dependent's `can_start` on the next read with no cache staleness.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowStoreError::TaskNotFound`] when the task or one of
    /// its blockers is missing.
    pub async fn blocking_info(&self, task_id: TaskId) -> WorkflowResult<BlockingInfo> {
        self.require_task(task_id).await?;

        let mut blocked_by = Vec::new();
        let mut is_blocked = false;
        for edge in self.store.find_edges_by_dependent(task_id).await? {
            if !edge.kind().blocks() {
                continue;
            }
            let blocker = self.require_task(edge.blocking()).await?;
            if !blocker.status().is_terminal_complete() {
                is_blocked = true;
            }
            blocked_by.push(edge.blocking());
        }

        let blocking = self
            .store
            .find_edges_by_blocking(task_id)
            .await?
            .into_iter()
            .filter(|edge| edge.kind().blocks())
            .map(|edge| edge.dependent())
            .collect();

        Ok(BlockingInfo {
            task_id,
            is_blocked,
            blocked_by,
            blocking,
        })
    }

    /// Returns whether `to` is reachable from `from` over the depends-on
    /// relation.
    ///
    /// Iterative depth-first traversal with a visited set; each step
    /// re-queries the store for the current task's outgoing edges. O(V+E)
    /// in the worst case, acceptable for project-sized graphs.
    async fn reaches(&self, from: TaskId, to: TaskId) -> WorkflowResult<bool> {
        let mut visited: HashSet<TaskId> = HashSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            for edge in self.store.find_edges_by_dependent(current).await? {
                if !visited.contains(&edge.blocking()) {
                    stack.push(edge.blocking());
                }
            }
        }

        Ok(false)
    }

    async fn require_task(&self, id: TaskId) -> WorkflowResult<Task> {
        Ok(self
            .store
            .find_task(id)
            .await?
            .ok_or(WorkflowStoreError::TaskNotFound(id))?)
    }
}
