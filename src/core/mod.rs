//! Core administrative routines.
//!
//! This module contains:
//! - Purge: Deletion of every record of a library
//! - Linker: Random parent/child linking between tiers
//! - Generator: Synthetic library generation

pub mod generator;
pub mod linker;
pub mod purge;

// Re-export commonly used types
pub use generator::{rng_for, GenerateError, GenerationReport, Generator};
pub use linker::{fan_out, link_in_containers, plan_links, LinkError, LinkPlan};
pub use purge::{delete_library, PurgeError, PurgeReport};
