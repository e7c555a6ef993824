//! Diesel schema for workflow persistence.
//!
//! The migrations also create two indexes the engine relies on as
//! correctness backstops under concurrent writers:
//! `uq_task_dependencies_pair` (unique on the ordered task pair) and
//! `uq_sprints_one_active_per_project` (partial unique on `project_id`
//! where `status = 'active'`).

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Free-form description.
        description -> Nullable<Text>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Priority.
        #[max_length = 50]
        priority -> Varchar,
        /// Creator reference.
        creator_id -> Uuid,
        /// Assignee reference.
        assignee_id -> Nullable<Uuid>,
        /// Parent task reference for subtasks.
        parent_task_id -> Nullable<Uuid>,
        /// Owning project; null for personal tasks.
        project_id -> Nullable<Uuid>,
        /// Containing sprint; null while in the backlog.
        sprint_id -> Nullable<Uuid>,
        /// Whether elevated sign-off is required.
        requires_approval -> Bool,
        /// Approver reference.
        approved_by -> Nullable<Uuid>,
        /// Rejection reason; set only while status is rejected.
        rejection_reason -> Nullable<Text>,
        /// Story-point estimate.
        story_points -> Nullable<Int4>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Sprint records.
    sprints (id) {
        /// Sprint identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Sprint name.
        #[max_length = 255]
        name -> Varchar,
        /// Sprint goal statement.
        goal -> Nullable<Text>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// First day of the window, inclusive.
        start_date -> Date,
        /// Last day of the window, inclusive.
        end_date -> Date,
        /// Planned capacity in story points.
        capacity -> Nullable<Int4>,
        /// Final velocity recorded on completion.
        velocity -> Nullable<Int4>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed dependency edges between tasks.
    task_dependencies (id) {
        /// Edge identifier.
        id -> Uuid,
        /// Task that is blocked.
        dependent_task_id -> Uuid,
        /// Task that blocks.
        blocking_task_id -> Uuid,
        /// Edge kind.
        #[max_length = 50]
        kind -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
