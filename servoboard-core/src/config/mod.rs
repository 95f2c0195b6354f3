//! Configuration types
//!
//! Board-agnostic configuration structures, optionally (de)serializable
//! with serde for host-side board files.

pub mod types;

pub use types::*;
