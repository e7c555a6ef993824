//! Notification port for domain event fan-out.

use crate::workflow::domain::WorkflowEvent;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Consumer of workflow events.
///
/// The engine fires events after the state mutation commits. The port is
/// infallible: delivery and retry are the adapter's concern, and a delivery
/// failure must never roll back the mutation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkflowNotifier: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: WorkflowEvent);
}
