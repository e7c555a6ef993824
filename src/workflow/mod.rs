//! Workflow consistency engine.
//!
//! Guarantees three cross-entity invariants under concurrent mutation of
//! the task/sprint/project graph:
//!
//! 1. Task statuses only move along permitted edges of a data-driven
//!    transition table, gated by actor authority.
//! 2. The task-dependency graph never contains a cycle, and "can this task
//!    start" is derived from transitive blocking state.
//! 3. A project has at most one active sprint, and sprint lifecycle
//!    transitions carry side effects on the tasks they contain.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
