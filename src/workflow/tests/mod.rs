//! Unit tests for the workflow consistency engine.

mod dependency_graph_tests;
mod support;
