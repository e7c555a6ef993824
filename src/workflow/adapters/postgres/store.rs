//! `PostgreSQL` store implementation for workflow persistence.

use super::{
    models::{
        DependencyRow, SprintRow, TaskRow, edge_to_row, row_to_edge, row_to_sprint, row_to_task,
        sprint_to_row, task_to_row,
    },
    schema::{sprints, task_dependencies, tasks},
};
use crate::workflow::{
    domain::{
        DependencyId, ProjectId, Sprint, SprintId, SprintStatus, Task, TaskDependency, TaskId,
    },
    ports::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::time::Duration;

/// `PostgreSQL` connection pool type used by workflow adapters.
pub type WorkflowPgPool = Pool<ConnectionManager<PgConnection>>;

/// Bounded retry attempts for transient store failures.
const MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay, doubled per attempt.
const BACKOFF_BASE_MS: u64 = 50;

/// `PostgreSQL`-backed workflow store.
///
/// Domain errors pass through untouched; transient failures (pool
/// exhaustion, closed connections) are retried with a small bounded backoff
/// and surface as [`WorkflowStoreError::Unavailable`] once retries exhaust,
/// so callers can tell an invalid request from "try again later".
#[derive(Debug, Clone)]
pub struct PostgresWorkflowStore {
    pool: WorkflowPgPool,
}

impl PostgresWorkflowStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkflowStoreResult<T>
    where
        F: Fn(&mut PgConnection) -> WorkflowStoreResult<T> + Clone + Send + Sync + 'static,
        T: Send + 'static,
    {
        let mut attempt: u32 = 1;
        loop {
            let pool = self.pool.clone();
            let op = f.clone();
            let result = tokio::task::spawn_blocking(move || {
                let mut connection = pool
                    .get()
                    .map_err(|err| WorkflowStoreError::Unavailable(err.to_string()))?;
                op(&mut connection)
            })
            .await
            .map_err(WorkflowStoreError::persistence)?;

            match result {
                Err(WorkflowStoreError::Unavailable(_)) if attempt < MAX_ATTEMPTS => {
                    tokio::time::sleep(Duration::from_millis(BACKOFF_BASE_MS << attempt)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn map_diesel_error(err: DieselError) -> WorkflowStoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            WorkflowStoreError::Conflict(
                info.constraint_name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| info.message().to_owned()),
            )
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            WorkflowStoreError::Unavailable(info.message().to_owned())
        }
        other => WorkflowStoreError::persistence(other),
    }
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        let row = task_to_row(task)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn update_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        let task_id = task.id();
        let row = task_to_row(task)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.filter(tasks::id.eq(row.id)))
                .set(&row)
                .execute(connection)
                .map_err(map_diesel_error)?;
            if updated == 0 {
                return Err(WorkflowStoreError::TaskNotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_tasks_by_sprint(&self, sprint: SprintId) -> WorkflowStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::sprint_id.eq(sprint.into_inner()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn insert_sprint(&self, sprint: &Sprint) -> WorkflowStoreResult<()> {
        let row = sprint_to_row(sprint)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(sprints::table)
                .values(&row)
                .execute(connection)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn update_sprint(&self, sprint: &Sprint) -> WorkflowStoreResult<()> {
        let sprint_id = sprint.id();
        let row = sprint_to_row(sprint)?;
        self.run_blocking(move |connection| {
            let updated = diesel::update(sprints::table.filter(sprints::id.eq(row.id)))
                .set(&row)
                .execute(connection)
                .map_err(map_diesel_error)?;
            if updated == 0 {
                return Err(WorkflowStoreError::SprintNotFound(sprint_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_sprint(&self, id: SprintId) -> WorkflowStoreResult<Option<Sprint>> {
        self.run_blocking(move |connection| {
            let row = sprints::table
                .filter(sprints::id.eq(id.into_inner()))
                .select(SprintRow::as_select())
                .first::<SprintRow>(connection)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_sprint).transpose()
        })
        .await
    }

    async fn find_sprints_by_project(
        &self,
        project: ProjectId,
    ) -> WorkflowStoreResult<Vec<Sprint>> {
        self.run_blocking(move |connection| {
            sprints::table
                .filter(sprints::project_id.eq(project.into_inner()))
                .select(SprintRow::as_select())
                .load::<SprintRow>(connection)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_sprint)
                .collect()
        })
        .await
    }

    async fn find_active_sprint(&self, project: ProjectId) -> WorkflowStoreResult<Option<Sprint>> {
        self.run_blocking(move |connection| {
            let row = sprints::table
                .filter(sprints::project_id.eq(project.into_inner()))
                .filter(sprints::status.eq(SprintStatus::Active.as_str()))
                .select(SprintRow::as_select())
                .first::<SprintRow>(connection)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_sprint).transpose()
        })
        .await
    }

    async fn insert_edge(&self, edge: &TaskDependency) -> WorkflowStoreResult<()> {
        let row = edge_to_row(edge);
        self.run_blocking(move |connection| {
            diesel::insert_into(task_dependencies::table)
                .values(&row)
                .execute(connection)
                .map_err(map_diesel_error)?;
            Ok(())
        })
        .await
    }

    async fn delete_edge(&self, id: DependencyId) -> WorkflowStoreResult<bool> {
        self.run_blocking(move |connection| {
            let deleted =
                diesel::delete(task_dependencies::table.filter(task_dependencies::id.eq(
                    id.into_inner(),
                )))
                .execute(connection)
                .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_edge(
        &self,
        dependent: TaskId,
        blocking: TaskId,
    ) -> WorkflowStoreResult<Option<TaskDependency>> {
        self.run_blocking(move |connection| {
            let row = task_dependencies::table
                .filter(task_dependencies::dependent_task_id.eq(dependent.into_inner()))
                .filter(task_dependencies::blocking_task_id.eq(blocking.into_inner()))
                .select(DependencyRow::as_select())
                .first::<DependencyRow>(connection)
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_edge).transpose()
        })
        .await
    }

    async fn find_edges_by_dependent(
        &self,
        dependent: TaskId,
    ) -> WorkflowStoreResult<Vec<TaskDependency>> {
        self.run_blocking(move |connection| {
            task_dependencies::table
                .filter(task_dependencies::dependent_task_id.eq(dependent.into_inner()))
                .select(DependencyRow::as_select())
                .load::<DependencyRow>(connection)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_edge)
                .collect()
        })
        .await
    }

    async fn find_edges_by_blocking(
        &self,
        blocking: TaskId,
    ) -> WorkflowStoreResult<Vec<TaskDependency>> {
        self.run_blocking(move |connection| {
            task_dependencies::table
                .filter(task_dependencies::blocking_task_id.eq(blocking.into_inner()))
                .select(DependencyRow::as_select())
                .load::<DependencyRow>(connection)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_edge)
                .collect()
        })
        .await
    }
}
