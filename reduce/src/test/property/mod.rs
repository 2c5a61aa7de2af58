//! Property-based tests for catalog construction and selection.

pub mod generators;
