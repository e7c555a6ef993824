//! In-memory adapters for tests and examples.

mod collaborators;
mod store;

pub use collaborators::{RecordingActivityLog, RecordingNotifier};
pub use store::InMemoryWorkflowStore;
