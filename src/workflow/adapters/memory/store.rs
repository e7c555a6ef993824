//! In-memory store for workflow engine tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{DependencyId, ProjectId, Sprint, SprintId, SprintStatus, Task, TaskDependency, TaskId},
    ports::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};

/// Thread-safe in-memory workflow store.
///
/// Enforces the same uniqueness backstops the relational schema provides:
/// at most one edge per ordered task pair and at most one active sprint per
/// project, both surfaced as [`WorkflowStoreError::Conflict`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    tasks: HashMap<TaskId, Task>,
    sprints: HashMap<SprintId, Sprint>,
    edges: HashMap<DependencyId, TaskDependency>,
    edge_pairs: HashMap<(TaskId, TaskId), DependencyId>,
}

impl InMemoryWorkflowStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> WorkflowStoreResult<std::sync::RwLockReadGuard<'_, InMemoryState>> {
        self.state
            .read()
            .map_err(|err| WorkflowStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> WorkflowStoreResult<std::sync::RwLockWriteGuard<'_, InMemoryState>> {
        self.state
            .write()
            .map_err(|err| WorkflowStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn other_active_sprint(
    state: &InMemoryState,
    project: ProjectId,
    except: SprintId,
) -> Option<SprintId> {
    state
        .sprints
        .values()
        .find(|sprint| {
            sprint.project() == project
                && sprint.status() == SprintStatus::Active
                && sprint.id() != except
        })
        .map(Sprint::id)
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(WorkflowStoreError::Conflict(format!(
                "task {} already exists",
                task.id()
            )));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(WorkflowStoreError::TaskNotFound(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_tasks_by_sprint(&self, sprint: SprintId) -> WorkflowStoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .tasks
            .values()
            .filter(|task| task.sprint() == Some(sprint))
            .cloned()
            .collect())
    }

    async fn insert_sprint(&self, sprint: &Sprint) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        if state.sprints.contains_key(&sprint.id()) {
            return Err(WorkflowStoreError::Conflict(format!(
                "sprint {} already exists",
                sprint.id()
            )));
        }
        if sprint.status() == SprintStatus::Active
            && let Some(active) = other_active_sprint(&state, sprint.project(), sprint.id())
        {
            return Err(WorkflowStoreError::Conflict(format!(
                "project {} already has active sprint {active}",
                sprint.project()
            )));
        }
        state.sprints.insert(sprint.id(), sprint.clone());
        Ok(())
    }

    async fn update_sprint(&self, sprint: &Sprint) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        if !state.sprints.contains_key(&sprint.id()) {
            return Err(WorkflowStoreError::SprintNotFound(sprint.id()));
        }
        if sprint.status() == SprintStatus::Active
            && let Some(active) = other_active_sprint(&state, sprint.project(), sprint.id())
        {
            return Err(WorkflowStoreError::Conflict(format!(
                "project {} already has active sprint {active}",
                sprint.project()
            )));
        }
        state.sprints.insert(sprint.id(), sprint.clone());
        Ok(())
    }

    async fn find_sprint(&self, id: SprintId) -> WorkflowStoreResult<Option<Sprint>> {
        Ok(self.read()?.sprints.get(&id).cloned())
    }

    async fn find_sprints_by_project(
        &self,
        project: ProjectId,
    ) -> WorkflowStoreResult<Vec<Sprint>> {
        Ok(self
            .read()?
            .sprints
            .values()
            .filter(|sprint| sprint.project() == project)
            .cloned()
            .collect())
    }

    async fn find_active_sprint(&self, project: ProjectId) -> WorkflowStoreResult<Option<Sprint>> {
        Ok(self
            .read()?
            .sprints
            .values()
            .find(|sprint| {
                sprint.project() == project && sprint.status() == SprintStatus::Active
            })
            .cloned())
    }

    async fn insert_edge(&self, edge: &TaskDependency) -> WorkflowStoreResult<()> {
        let mut state = self.write()?;
        let pair = (edge.dependent(), edge.blocking());
        if state.edge_pairs.contains_key(&pair) {
            return Err(WorkflowStoreError::Conflict(format!(
                "dependency {} -> {} already exists",
                edge.dependent(),
                edge.blocking()
            )));
        }
        state.edge_pairs.insert(pair, edge.id());
        state.edges.insert(edge.id(), edge.clone());
        Ok(())
    }

    async fn delete_edge(&self, id: DependencyId) -> WorkflowStoreResult<bool> {
        let mut state = self.write()?;
        let Some(edge) = state.edges.remove(&id) else {
            return Ok(false);
        };
        state.edge_pairs.remove(&(edge.dependent(), edge.blocking()));
        Ok(true)
    }

    async fn find_edge(
        &self,
        dependent: TaskId,
        blocking: TaskId,
    ) -> WorkflowStoreResult<Option<TaskDependency>> {
        let state = self.read()?;
        Ok(state
            .edge_pairs
            .get(&(dependent, blocking))
            .and_then(|id| state.edges.get(id))
            .cloned())
    }

    async fn find_edges_by_dependent(
        &self,
        dependent: TaskId,
    ) -> WorkflowStoreResult<Vec<TaskDependency>> {
        Ok(self
            .read()?
            .edges
            .values()
            .filter(|edge| edge.dependent() == dependent)
            .cloned()
            .collect())
    }

    async fn find_edges_by_blocking(
        &self,
        blocking: TaskId,
    ) -> WorkflowStoreResult<Vec<TaskDependency>> {
        Ok(self
            .read()?
            .edges
            .values()
            .filter(|edge| edge.blocking() == blocking)
            .cloned()
            .collect())
    }
}
