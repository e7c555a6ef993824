//! Actor roles and the data-driven authority lattice.

use super::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Role an actor holds, resolved by the upstream authentication layer.
///
/// The engine trusts this input and does not re-authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// Individual contributor.
    Staff,
    /// Team lead; may act on staff but cannot approve.
    Lead,
    /// Department manager; elevated.
    Manager,
    /// Administrator; elevated.
    Admin,
}

impl ActorRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Lead => "lead",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Returns whether the role carries elevated sign-off authority.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Authenticated caller of a mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Resolved user identifier.
    pub id: UserId,
    /// Resolved role.
    pub role: ActorRole,
}

impl Actor {
    /// Creates an actor from resolved identity data.
    #[must_use]
    pub const fn new(id: UserId, role: ActorRole) -> Self {
        Self { id, role }
    }
}

/// Which roles may act upon which, held as data like the status transition
/// table so the lattice can be reshaped per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityTable {
    grants: HashMap<ActorRole, BTreeSet<ActorRole>>,
}

impl AuthorityTable {
    /// Creates an empty table granting no authority.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    /// Grants `actor` authority over `subject`.
    #[must_use]
    pub fn grant(mut self, actor: ActorRole, subject: ActorRole) -> Self {
        self.grants.entry(actor).or_default().insert(subject);
        self
    }

    /// Returns whether `actor` may act upon a subject holding `subject`.
    #[must_use]
    pub fn may_act_on(&self, actor: ActorRole, subject: ActorRole) -> bool {
        self.grants
            .get(&actor)
            .is_some_and(|set| set.contains(&subject))
    }
}

impl Default for AuthorityTable {
    /// Builds the default lattice: admins act on everyone, managers on
    /// anyone below them, leads on staff, staff on nobody.
    fn default() -> Self {
        Self::empty()
            .grant(ActorRole::Admin, ActorRole::Staff)
            .grant(ActorRole::Admin, ActorRole::Lead)
            .grant(ActorRole::Admin, ActorRole::Manager)
            .grant(ActorRole::Admin, ActorRole::Admin)
            .grant(ActorRole::Manager, ActorRole::Staff)
            .grant(ActorRole::Manager, ActorRole::Lead)
            .grant(ActorRole::Manager, ActorRole::Manager)
            .grant(ActorRole::Lead, ActorRole::Staff)
    }
}
