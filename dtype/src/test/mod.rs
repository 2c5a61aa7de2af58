//! Test support for dtypes.
//!
//! `generators` is public behind the `proptest` feature so downstream crates
//! can reuse the strategies.
