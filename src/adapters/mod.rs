//! Adapter interfaces for the library-authoring platform.
//!
//! The generator and purge routines never talk to storage directly; every
//! side effect goes through these traits so a fake can stand in for tests.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    Component, ComponentType, Container, ContainerKey, ContainerType, EntityKey, Library,
    LibraryKey, Organization, RecordSet, User,
};

// Re-export the SQLite store
pub use sqlite::{LibraryStats, SqliteStore};

/// Errors raised by authoring platform calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already exists: {key}")]
    AlreadyExists { kind: &'static str, key: String },

    #[error("{child} cannot be a child of {parent}")]
    InvalidChild { parent: String, child: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl ApiError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        ApiError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Library-authoring operations consumed by the generator
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// Look up a user by email
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    /// Return the organization with this name, creating it if missing.
    /// The flag is `true` when a new record was created.
    async fn get_or_create_organization(
        &self,
        name: &str,
        short_name: &str,
    ) -> ApiResult<(Organization, bool)>;

    /// Create a new library owned by `org`
    async fn create_library(&self, org: &Organization, slug: &str, title: &str)
        -> ApiResult<Library>;

    /// Create an empty container; the platform picks a slug when `slug` is `None`
    async fn create_container(
        &self,
        library_key: &LibraryKey,
        container_type: ContainerType,
        slug: Option<&str>,
        title: &str,
        user_id: i64,
    ) -> ApiResult<Container>;

    /// Create a leaf component
    async fn create_library_block(
        &self,
        library_key: &LibraryKey,
        block_type: ComponentType,
        definition_id: &str,
        user_id: i64,
    ) -> ApiResult<Component>;

    /// Replace a container's child list with `children`, in order
    async fn update_container_children(
        &self,
        container_key: &ContainerKey,
        children: &[EntityKey],
        user_id: i64,
    ) -> ApiResult<()>;
}

/// Bulk deletion of the records that make up a library
#[async_trait]
pub trait LibraryPurger: Send + Sync {
    /// Delete one record set scoped to `library_key`, returning rows removed
    async fn delete_records(&self, set: RecordSet, library_key: &str) -> ApiResult<usize>;
}
