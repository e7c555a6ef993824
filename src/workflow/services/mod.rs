//! Application services for the workflow consistency engine.
//!
//! The three managers are stateless logic over externally-owned data: each
//! mutating operation fetches a snapshot from the store, validates the
//! invariant, writes, and only then notifies collaborators.

mod coordinator;
mod dependency_graph;
mod sprint_lifecycle;

pub use coordinator::{Assignee, CreateTaskRequest, TaskWorkflowCoordinator};
pub use dependency_graph::DependencyGraphService;
pub use sprint_lifecycle::SprintLifecycleService;

use crate::workflow::domain::WorkflowDomainError;
use crate::workflow::ports::WorkflowStoreError;
use thiserror::Error;

/// Service-level errors for workflow operations.
///
/// All variants are expected, recoverable-by-the-caller conditions; the
/// services never retry them. Only [`WorkflowStoreError::Unavailable`]
/// signals "try again later" rather than "your request was invalid".
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Domain invariant validation failed.
    #[error(transparent)]
    Domain(#[from] WorkflowDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] WorkflowStoreError),
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
