//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Local filesystem (one JSON document per key) for KeyValueStorage
//! - In-process map for KeyValueStorage in tests and ephemeral sessions

pub mod file;
pub mod memory;
