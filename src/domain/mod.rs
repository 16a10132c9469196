//! Domain types for the content-library data model.
//!
//! This module contains:
//! - Keys: Library, container and component identifiers
//! - Entities: Organizations, users, containers, components

pub mod entities;
pub mod keys;

// Re-export commonly used types
pub use entities::{
    Component, ComponentType, Container, ContainerType, Library, Organization, RecordSet, User,
};
pub use keys::{is_valid_slug, ContainerKey, EntityKey, KeyParseError, LibraryKey, UsageKey};
