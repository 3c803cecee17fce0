//! Extractors for Kubernetes object data.
//!
//! Helper functions to pull specific data out of resources for use in checks.

pub mod container;
pub mod quantity;

pub use container::*;
pub use quantity::*;
