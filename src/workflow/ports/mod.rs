//! Port contracts for the workflow engine.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow
//! services: the transactional store, the notification fan-out, and the
//! activity log.

pub mod activity;
pub mod notifier;
pub mod store;

pub use activity::{ActivityEntity, ActivityEntry, ActivityLog};
pub use notifier::WorkflowNotifier;
pub use store::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult};

#[cfg(test)]
pub use store::MockWorkflowStore;
