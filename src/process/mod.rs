//! Process-related modules: permission decoding, memory regions and the registry.
//!
//! This module provides:
//! - `permissions`: Decoding of the four character access string
//! - `region`: A single mapping and its access classification
//! - `memory`: Region collections with an address-ordered view
//! - `registry`: Process entities, per-process aggregates and the pid registry

pub mod memory;
pub mod permissions;
pub mod region;
pub mod registry;

// Re-export commonly used types
pub use memory::MemoryStats;
pub use permissions::AccessFlags;
pub use region::{AccessClass, Counter, MemoryRegion, Sharing};
pub use registry::{
    Process, ProcessRegistry, PssBuckets, BUCKET_EXCLUDED_NAMES, HEAP_NAME, STACK_NAME,
};
