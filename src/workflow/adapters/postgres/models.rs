//! Diesel row models and domain conversions for workflow persistence.

use super::schema::{sprints, task_dependencies, tasks};
use crate::workflow::{
    domain::{
        DependencyId, DependencyKind, PersistedDependencyData, PersistedSprintData,
        PersistedTaskData, ProjectId, Sprint, SprintId, SprintStatus, StoryPoints, Task,
        TaskDependency, TaskId, TaskPriority, TaskStatus, UserId,
    },
    ports::{WorkflowStoreError, WorkflowStoreResult},
};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Row model for task records, used for both inserts and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Creator reference.
    pub creator_id: uuid::Uuid,
    /// Assignee reference.
    pub assignee_id: Option<uuid::Uuid>,
    /// Parent task reference.
    pub parent_task_id: Option<uuid::Uuid>,
    /// Owning project.
    pub project_id: Option<uuid::Uuid>,
    /// Containing sprint.
    pub sprint_id: Option<uuid::Uuid>,
    /// Whether elevated sign-off is required.
    pub requires_approval: bool,
    /// Approver reference.
    pub approved_by: Option<uuid::Uuid>,
    /// Rejection reason.
    pub rejection_reason: Option<String>,
    /// Story-point estimate.
    pub story_points: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for sprint records, used for both inserts and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = sprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct SprintRow {
    /// Sprint identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Sprint name.
    pub name: String,
    /// Sprint goal statement.
    pub goal: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// First day of the window, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the window, inclusive.
    pub end_date: NaiveDate,
    /// Planned capacity in story points.
    pub capacity: Option<i32>,
    /// Final velocity recorded on completion.
    pub velocity: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for dependency edges.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_dependencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DependencyRow {
    /// Edge identifier.
    pub id: uuid::Uuid,
    /// Task that is blocked.
    pub dependent_task_id: uuid::Uuid,
    /// Task that blocks.
    pub blocking_task_id: uuid::Uuid,
    /// Edge kind.
    pub kind: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Converts a task aggregate to its row representation.
pub fn task_to_row(task: &Task) -> WorkflowStoreResult<TaskRow> {
    Ok(TaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        creator_id: task.creator().into_inner(),
        assignee_id: task.assignee().map(UserId::into_inner),
        parent_task_id: task.parent().map(TaskId::into_inner),
        project_id: task.project().map(ProjectId::into_inner),
        sprint_id: task.sprint().map(SprintId::into_inner),
        requires_approval: task.requires_approval(),
        approved_by: task.approved_by().map(UserId::into_inner),
        rejection_reason: task.rejection_reason().map(str::to_owned),
        story_points: task
            .story_points()
            .map(|points| i32::try_from(points.value()))
            .transpose()
            .map_err(WorkflowStoreError::persistence)?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

/// Reconstructs a task aggregate from its row representation.
pub fn row_to_task(row: TaskRow) -> WorkflowStoreResult<Task> {
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(WorkflowStoreError::persistence)?;
    let priority =
        TaskPriority::try_from(row.priority.as_str()).map_err(WorkflowStoreError::persistence)?;
    let story_points = row
        .story_points
        .map(parse_points)
        .transpose()?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        status,
        priority,
        creator: UserId::from_uuid(row.creator_id),
        assignee: row.assignee_id.map(UserId::from_uuid),
        parent: row.parent_task_id.map(TaskId::from_uuid),
        project: row.project_id.map(ProjectId::from_uuid),
        sprint: row.sprint_id.map(SprintId::from_uuid),
        requires_approval: row.requires_approval,
        approved_by: row.approved_by.map(UserId::from_uuid),
        rejection_reason: row.rejection_reason,
        story_points,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Converts a sprint aggregate to its row representation.
pub fn sprint_to_row(sprint: &Sprint) -> WorkflowStoreResult<SprintRow> {
    Ok(SprintRow {
        id: sprint.id().into_inner(),
        project_id: sprint.project().into_inner(),
        name: sprint.name().to_owned(),
        goal: sprint.goal().map(str::to_owned),
        status: sprint.status().as_str().to_owned(),
        start_date: sprint.start_date(),
        end_date: sprint.end_date(),
        capacity: convert_count(sprint.capacity())?,
        velocity: convert_count(sprint.velocity())?,
        created_at: sprint.created_at(),
        updated_at: sprint.updated_at(),
    })
}

/// Reconstructs a sprint aggregate from its row representation.
pub fn row_to_sprint(row: SprintRow) -> WorkflowStoreResult<Sprint> {
    let status =
        SprintStatus::try_from(row.status.as_str()).map_err(WorkflowStoreError::persistence)?;

    Ok(Sprint::from_persisted(PersistedSprintData {
        id: SprintId::from_uuid(row.id),
        project: ProjectId::from_uuid(row.project_id),
        name: row.name,
        goal: row.goal,
        status,
        start_date: row.start_date,
        end_date: row.end_date,
        capacity: parse_count(row.capacity)?,
        velocity: parse_count(row.velocity)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Converts a dependency edge to its row representation.
#[must_use]
pub fn edge_to_row(edge: &TaskDependency) -> DependencyRow {
    DependencyRow {
        id: edge.id().into_inner(),
        dependent_task_id: edge.dependent().into_inner(),
        blocking_task_id: edge.blocking().into_inner(),
        kind: edge.kind().as_str().to_owned(),
        created_at: edge.created_at(),
    }
}

/// Reconstructs a dependency edge from its row representation.
pub fn row_to_edge(row: DependencyRow) -> WorkflowStoreResult<TaskDependency> {
    let kind =
        DependencyKind::try_from(row.kind.as_str()).map_err(WorkflowStoreError::persistence)?;

    Ok(TaskDependency::from_persisted(PersistedDependencyData {
        id: DependencyId::from_uuid(row.id),
        dependent: TaskId::from_uuid(row.dependent_task_id),
        blocking: TaskId::from_uuid(row.blocking_task_id),
        kind,
        created_at: row.created_at,
    }))
}

fn parse_points(value: i32) -> WorkflowStoreResult<StoryPoints> {
    let raw = u32::try_from(value).map_err(WorkflowStoreError::persistence)?;
    StoryPoints::new(raw).map_err(WorkflowStoreError::persistence)
}

fn parse_count(value: Option<i32>) -> WorkflowStoreResult<Option<u32>> {
    value
        .map(|raw| u32::try_from(raw).map_err(WorkflowStoreError::persistence))
        .transpose()
}

fn convert_count(value: Option<u32>) -> WorkflowStoreResult<Option<i32>> {
    value
        .map(|raw| i32::try_from(raw).map_err(WorkflowStoreError::persistence))
        .transpose()
}
