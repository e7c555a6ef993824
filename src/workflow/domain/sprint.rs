//! Sprint aggregate root, lifecycle states, and scheduling policy.

use super::{ParseSprintStatusError, ProjectId, SprintId, WorkflowDomainError};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sprint lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    /// Sprint is being planned; tasks may be added freely.
    Planning,
    /// Sprint is under way. At most one per project.
    Active,
    /// Sprint finished normally.
    Completed,
    /// Sprint was abandoned.
    Cancelled,
}

impl SprintStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether task membership may still change.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns whether the sprint occupies its date window for overlap
    /// checks. Completed and cancelled sprints release their window.
    #[must_use]
    pub const fn occupies_window(self) -> bool {
        matches!(self, Self::Planning | Self::Active)
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SprintStatus {
    type Error = ParseSprintStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseSprintStatusError(value.to_owned())),
        }
    }
}

/// Deployment policy knobs for sprint scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintPolicy {
    /// Whether a cancelled sprint may be reopened into planning.
    pub allow_reopen: bool,
    /// Whether sprints may be created entirely in the past, for backfilled
    /// historical data.
    pub allow_past_dates: bool,
}

impl Default for SprintPolicy {
    fn default() -> Self {
        Self {
            allow_reopen: true,
            allow_past_dates: false,
        }
    }
}

impl SprintPolicy {
    /// Returns whether the lifecycle edge `from -> to` is permitted.
    #[must_use]
    pub const fn permits(self, from: SprintStatus, to: SprintStatus) -> bool {
        match (from, to) {
            (SprintStatus::Planning, SprintStatus::Active | SprintStatus::Cancelled)
            | (SprintStatus::Active, SprintStatus::Completed | SprintStatus::Cancelled) => true,
            (SprintStatus::Cancelled, SprintStatus::Planning) => self.allow_reopen,
            _ => false,
        }
    }
}

/// Parameter object for creating a new sprint aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSprintParams {
    /// Owning project.
    pub project: ProjectId,
    /// Sprint name.
    pub name: String,
    /// Sprint goal statement.
    pub goal: Option<String>,
    /// First day of the sprint window, inclusive.
    pub start_date: NaiveDate,
    /// Last day of the sprint window, inclusive.
    pub end_date: NaiveDate,
    /// Planned capacity in story points.
    pub capacity: Option<u32>,
}

/// Parameter object for reconstructing a persisted sprint aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSprintData {
    /// Persisted sprint identifier.
    pub id: SprintId,
    /// Persisted owning project.
    pub project: ProjectId,
    /// Persisted name.
    pub name: String,
    /// Persisted goal.
    pub goal: Option<String>,
    /// Persisted status.
    pub status: SprintStatus,
    /// Persisted window start.
    pub start_date: NaiveDate,
    /// Persisted window end.
    pub end_date: NaiveDate,
    /// Persisted capacity.
    pub capacity: Option<u32>,
    /// Persisted final velocity.
    pub velocity: Option<u32>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Sprint aggregate root.
///
/// Tasks reference a sprint through a nullable field on the task side;
/// closing a sprint detaches or reassigns its tasks, never deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    id: SprintId,
    project: ProjectId,
    name: String,
    goal: Option<String>,
    status: SprintStatus,
    start_date: NaiveDate,
    end_date: NaiveDate,
    capacity: Option<u32>,
    velocity: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a new sprint in `Planning` status.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidDateRange`] when the window is
    /// empty or inverted, or ends in the past while the policy forbids
    /// backfilled sprints.
    pub fn new(
        params: NewSprintParams,
        policy: SprintPolicy,
        clock: &impl Clock,
    ) -> Result<Self, WorkflowDomainError> {
        let timestamp = clock.utc();
        let today = timestamp.date_naive();
        if params.start_date >= params.end_date
            || (!policy.allow_past_dates && params.end_date < today)
        {
            return Err(WorkflowDomainError::InvalidDateRange {
                start: params.start_date,
                end: params.end_date,
            });
        }

        Ok(Self {
            id: SprintId::new(),
            project: params.project,
            name: params.name,
            goal: params.goal,
            status: SprintStatus::Planning,
            start_date: params.start_date,
            end_date: params.end_date,
            capacity: params.capacity,
            velocity: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a sprint from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSprintData) -> Self {
        Self {
            id: data.id,
            project: data.project,
            name: data.name,
            goal: data.goal,
            status: data.status,
            start_date: data.start_date,
            end_date: data.end_date,
            capacity: data.capacity,
            velocity: data.velocity,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the sprint identifier.
    #[must_use]
    pub const fn id(&self) -> SprintId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project(&self) -> ProjectId {
        self.project
    }

    /// Returns the sprint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sprint goal, if any.
    #[must_use]
    pub fn goal(&self) -> Option<&str> {
        self.goal.as_deref()
    }

    /// Returns the sprint status.
    #[must_use]
    pub const fn status(&self) -> SprintStatus {
        self.status
    }

    /// Returns the first day of the window, inclusive.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the last day of the window, inclusive.
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns the planned capacity, if any.
    #[must_use]
    pub const fn capacity(&self) -> Option<u32> {
        self.capacity
    }

    /// Returns the final velocity recorded on completion.
    #[must_use]
    pub const fn velocity(&self) -> Option<u32> {
        self.velocity
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether this sprint's inclusive window intersects `other`'s.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// Moves the sprint along a permitted lifecycle edge.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidSprintTransition`] when the
    /// policy does not permit the edge.
    pub fn transition_to(
        &mut self,
        target: SprintStatus,
        policy: SprintPolicy,
        clock: &impl Clock,
    ) -> Result<SprintStatus, WorkflowDomainError> {
        if !policy.permits(self.status, target) {
            return Err(WorkflowDomainError::InvalidSprintTransition {
                sprint_id: self.id,
                from: self.status,
                to: target,
            });
        }
        let previous = self.status;
        self.status = target;
        self.touch(clock);
        Ok(previous)
    }

    /// Records the final velocity while completing the sprint.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidSprintTransition`] when the
    /// sprint is not active.
    pub fn complete(
        &mut self,
        velocity: u32,
        policy: SprintPolicy,
        clock: &impl Clock,
    ) -> Result<SprintStatus, WorkflowDomainError> {
        let previous = self.transition_to(SprintStatus::Completed, policy, clock)?;
        self.velocity = Some(velocity);
        Ok(previous)
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
