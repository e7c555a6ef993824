//! Domain model for the workflow consistency engine.
//!
//! The domain models task status transitions, the directed task-dependency
//! graph, and sprint lifecycles while keeping all infrastructure concerns
//! outside of the domain boundary. Transition legality and actor authority
//! are held as data tables so deployments can reshape them without touching
//! call sites.

mod dependency;
mod error;
mod events;
mod ids;
mod role;
mod sprint;
mod status;
mod task;

pub use dependency::{
    BlockingInfo, DependencyKind, ParseDependencyKindError, PersistedDependencyData,
    TaskDependency,
};
pub use error::{ParseSprintStatusError, ParseTaskStatusError, WorkflowDomainError};
pub use events::WorkflowEvent;
pub use ids::{DependencyId, ProjectId, SprintId, StoryPoints, TaskId, UserId};
pub use role::{Actor, ActorRole, AuthorityTable};
pub use sprint::{NewSprintParams, PersistedSprintData, Sprint, SprintPolicy, SprintStatus};
pub use status::{StatusTransitionTable, TaskStatus};
pub use task::{NewTaskParams, PersistedTaskData, Task, TaskPriority};
