//! Gantt: workflow consistency engine for project management.
//!
//! This crate provides the invariant-enforcing core of a project-management
//! system: task status state machines, the acyclic task-dependency graph,
//! and sprint lifecycles with the one-active-sprint-per-project rule.
//! Surrounding concerns (HTTP transport, authentication, notification
//! delivery, reporting) are external collaborators behind ports.
//!
//! # Architecture
//!
//! Gantt follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, recorders)
//!
//! # Modules
//!
//! - [`workflow`]: The workflow consistency engine

pub mod workflow;
