//! libseed - Generate and purge large synthetic content libraries
//!
//! Administrative tooling for a content-library data model: one routine
//! builds a large library of sections, subsections, units and components with
//! random parent/child links; the other deletes every record a library left
//! behind.
//!
//! # Architecture
//!
//! Routines never touch storage directly:
//! - Every authoring call goes through the `LibraryApi` trait
//! - Deletion goes through the `LibraryPurger` trait
//! - Randomness is an explicit `rand::Rng` parameter
//!
//! so tests can substitute a fake platform and a seeded generator.
//!
//! # Modules
//!
//! - `adapters`: Platform interfaces and the SQLite-backed store
//! - `core`: Generator, linker and purge routines
//! - `domain`: Keys and entities (Library, Container, Component)
//! - `config`: Configuration loading and generation plans
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Register the acting user, then generate a library
//! libseed user add edx@example.com
//! libseed generate --seed 43
//!
//! # Delete it again
//! libseed purge lib:SampleLibraryOrg:sample_large_library_1
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{ApiError, LibraryApi, LibraryPurger, SqliteStore};
pub use config::{GenerateConfig, TierConfig};
pub use self::core::{delete_library, GenerationReport, Generator, PurgeReport};
pub use domain::{ComponentType, ContainerKey, ContainerType, EntityKey, LibraryKey, UsageKey};
