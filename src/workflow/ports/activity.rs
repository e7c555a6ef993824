//! Activity log port for audit trails and reporting replay.

use crate::workflow::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Entity kinds referenced by activity entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEntity {
    /// A task record.
    Task,
    /// A sprint record.
    Sprint,
    /// A dependency edge.
    Dependency,
}

/// One accepted mutation, with enough structure for the reporting
/// collaborator to replay cycle-time and burndown projections exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Kind of entity mutated.
    pub entity: ActivityEntity,
    /// Identifier of the mutated entity.
    pub entity_id: Uuid,
    /// Actor who performed the mutation.
    pub actor: UserId,
    /// Short machine-readable action name.
    pub action: String,
    /// Value before the mutation, JSON-encoded.
    pub previous_value: Option<Value>,
    /// Value after the mutation, JSON-encoded.
    pub new_value: Option<Value>,
    /// When the mutation was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Creates an entry with no recorded values.
    #[must_use]
    pub fn new(
        entity: ActivityEntity,
        entity_id: Uuid,
        actor: UserId,
        action: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity,
            entity_id,
            actor,
            action: action.into(),
            previous_value: None,
            new_value: None,
            recorded_at,
        }
    }

    /// Sets the value before the mutation.
    #[must_use]
    pub fn with_previous(mut self, value: Value) -> Self {
        self.previous_value = Some(value);
        self
    }

    /// Sets the value after the mutation.
    #[must_use]
    pub fn with_new(mut self, value: Value) -> Self {
        self.new_value = Some(value);
        self
    }
}

/// Consumer of activity entries.
///
/// Infallible for the same reason as the notifier port: a logging failure
/// must never roll back an accepted mutation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Records one accepted mutation.
    async fn record(&self, entry: ActivityEntry);
}
