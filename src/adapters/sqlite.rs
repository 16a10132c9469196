//! SQLite-backed implementation of the authoring platform.
//!
//! Models the subset of the content-library schema the generator and the
//! purge routine touch. Foreign keys are enforced, and the tables that point
//! at a package's entities from the outside (`content_libraries`,
//! `entity_list_rows`, `draft_side_effects`) restrict deletion, so a package
//! can only be dropped once its dependents are gone.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{ApiError, ApiResult, LibraryApi, LibraryPurger};
use crate::domain::{
    is_valid_slug, Component, ComponentType, Container, ContainerKey, ContainerType, EntityKey,
    Library, LibraryKey, Organization, RecordSet, UsageKey, User,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS organizations (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    short_name  TEXT NOT NULL,
    created     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    username    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS learning_packages (
    id          INTEGER PRIMARY KEY,
    key         TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    created     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS content_libraries (
    id                   INTEGER PRIMARY KEY,
    org_id               INTEGER NOT NULL REFERENCES organizations(id),
    slug                 TEXT NOT NULL,
    learning_package_id  INTEGER REFERENCES learning_packages(id) ON DELETE RESTRICT,
    UNIQUE (org_id, slug)
);

CREATE TABLE IF NOT EXISTS publishable_entities (
    id                   INTEGER PRIMARY KEY,
    uuid                 TEXT NOT NULL UNIQUE,
    learning_package_id  INTEGER NOT NULL REFERENCES learning_packages(id) ON DELETE CASCADE,
    key                  TEXT NOT NULL,
    created              TEXT NOT NULL,
    created_by           INTEGER REFERENCES users(id),
    UNIQUE (learning_package_id, key)
);

CREATE TABLE IF NOT EXISTS containers (
    entity_id       INTEGER PRIMARY KEY REFERENCES publishable_entities(id) ON DELETE CASCADE,
    container_type  TEXT NOT NULL,
    slug            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS components (
    entity_id      INTEGER PRIMARY KEY REFERENCES publishable_entities(id) ON DELETE CASCADE,
    block_type     TEXT NOT NULL,
    definition_id  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entity_lists (
    id  INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS entity_list_rows (
    id              INTEGER PRIMARY KEY,
    entity_list_id  INTEGER NOT NULL REFERENCES entity_lists(id) ON DELETE CASCADE,
    entity_id       INTEGER NOT NULL REFERENCES publishable_entities(id) ON DELETE RESTRICT,
    order_num       INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS container_versions (
    id              INTEGER PRIMARY KEY,
    container_id    INTEGER NOT NULL REFERENCES containers(entity_id) ON DELETE CASCADE,
    version_num     INTEGER NOT NULL,
    title           TEXT NOT NULL,
    entity_list_id  INTEGER NOT NULL REFERENCES entity_lists(id) ON DELETE RESTRICT,
    created         TEXT NOT NULL,
    created_by      INTEGER REFERENCES users(id),
    UNIQUE (container_id, version_num)
);

CREATE TABLE IF NOT EXISTS draft_change_logs (
    id                   INTEGER PRIMARY KEY,
    learning_package_id  INTEGER NOT NULL REFERENCES learning_packages(id) ON DELETE CASCADE,
    changed_at           TEXT NOT NULL,
    changed_by           INTEGER REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS draft_change_log_records (
    id                   INTEGER PRIMARY KEY,
    draft_change_log_id  INTEGER NOT NULL REFERENCES draft_change_logs(id) ON DELETE CASCADE,
    entity_id            INTEGER NOT NULL REFERENCES publishable_entities(id) ON DELETE CASCADE,
    old_version_num      INTEGER,
    new_version_num      INTEGER
);

CREATE TABLE IF NOT EXISTS draft_side_effects (
    id         INTEGER PRIMARY KEY,
    cause_id   INTEGER NOT NULL REFERENCES draft_change_log_records(id) ON DELETE RESTRICT,
    effect_id  INTEGER NOT NULL REFERENCES draft_change_log_records(id) ON DELETE RESTRICT,
    UNIQUE (cause_id, effect_id)
);
"#;

/// Row counts for one library, grouped by table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub learning_packages: usize,
    pub content_libraries: usize,
    pub entities: usize,
    pub containers: usize,
    pub components: usize,
    pub container_versions: usize,
    pub entity_list_rows: usize,
    pub change_logs: usize,
    pub change_log_records: usize,
    pub side_effects: usize,
}

impl LibraryStats {
    /// True when no record of the library remains
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Authoring platform backed by a single SQLite database
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and migrate) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> ApiResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> ApiResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> ApiResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves SQLite itself consistent
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a user that authoring calls can act as
    pub fn add_user(&self, email: &str, username: &str) -> ApiResult<User> {
        let conn = self.lock();
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1 OR username = ?2)",
            params![email, username],
            |row| row.get(0),
        )?;
        if exists {
            return Err(ApiError::AlreadyExists {
                kind: "user",
                key: email.to_string(),
            });
        }
        conn.execute(
            "INSERT INTO users (email, username) VALUES (?1, ?2)",
            params![email, username],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            email: email.to_string(),
            username: username.to_string(),
        })
    }

    /// Number of organizations with this name
    pub fn count_organizations(&self, name: &str) -> ApiResult<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM organizations WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Latest persisted child list of a container
    pub fn list_children(&self, container_key: &ContainerKey) -> ApiResult<Vec<EntityKey>> {
        let conn = self.lock();
        let package_id = package_id(&conn, container_key.library())?;
        let container_id = container_entity_id(&conn, package_id, container_key)?;

        let mut stmt = conn.prepare(
            "SELECT c.container_type, c.slug, b.block_type, b.definition_id
             FROM entity_list_rows r
             JOIN container_versions v ON v.entity_list_id = r.entity_list_id
             LEFT JOIN containers c ON c.entity_id = r.entity_id
             LEFT JOIN components b ON b.entity_id = r.entity_id
             WHERE v.container_id = ?1
               AND v.version_num = (SELECT MAX(version_num) FROM container_versions
                                    WHERE container_id = ?1)
             ORDER BY r.order_num",
        )?;
        let rows = stmt.query_map(params![container_id], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let library = container_key.library();
        let mut children = Vec::new();
        for row in rows {
            match row? {
                (Some(container_type), Some(slug), _, _) => {
                    let container_type: ContainerType = container_type
                        .parse()
                        .map_err(|e: anyhow::Error| ApiError::InvalidInput(e.to_string()))?;
                    children.push(EntityKey::Container(ContainerKey::new(
                        library.clone(),
                        container_type,
                        slug,
                    )));
                }
                (_, _, Some(block_type), Some(definition_id)) => {
                    children.push(EntityKey::Component(UsageKey::new(
                        library.clone(),
                        block_type,
                        definition_id,
                    )));
                }
                _ => {
                    return Err(ApiError::InvalidInput(format!(
                        "child list of {} references an unknown entity",
                        container_key
                    )))
                }
            }
        }
        Ok(children)
    }

    /// Row counts of every table scoped to `library_key`
    pub fn library_stats(&self, library_key: &str) -> ApiResult<LibraryStats> {
        let conn = self.lock();
        let count = |sql: &str| -> ApiResult<usize> {
            let n: i64 = conn.query_row(sql, params![library_key], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(LibraryStats {
            learning_packages: count("SELECT COUNT(*) FROM learning_packages WHERE key = ?1")?,
            content_libraries: count(
                "SELECT COUNT(*) FROM content_libraries l
                 JOIN learning_packages p ON p.id = l.learning_package_id WHERE p.key = ?1",
            )?,
            entities: count(
                "SELECT COUNT(*) FROM publishable_entities e
                 JOIN learning_packages p ON p.id = e.learning_package_id WHERE p.key = ?1",
            )?,
            containers: count(
                "SELECT COUNT(*) FROM containers c
                 JOIN publishable_entities e ON e.id = c.entity_id
                 JOIN learning_packages p ON p.id = e.learning_package_id WHERE p.key = ?1",
            )?,
            components: count(
                "SELECT COUNT(*) FROM components c
                 JOIN publishable_entities e ON e.id = c.entity_id
                 JOIN learning_packages p ON p.id = e.learning_package_id WHERE p.key = ?1",
            )?,
            container_versions: count(
                "SELECT COUNT(*) FROM container_versions v
                 JOIN publishable_entities e ON e.id = v.container_id
                 JOIN learning_packages p ON p.id = e.learning_package_id WHERE p.key = ?1",
            )?,
            entity_list_rows: count(
                "SELECT COUNT(*) FROM entity_list_rows r
                 JOIN publishable_entities e ON e.id = r.entity_id
                 JOIN learning_packages p ON p.id = e.learning_package_id WHERE p.key = ?1",
            )?,
            change_logs: count(
                "SELECT COUNT(*) FROM draft_change_logs l
                 JOIN learning_packages p ON p.id = l.learning_package_id WHERE p.key = ?1",
            )?,
            change_log_records: count(
                "SELECT COUNT(*) FROM draft_change_log_records r
                 JOIN draft_change_logs l ON l.id = r.draft_change_log_id
                 JOIN learning_packages p ON p.id = l.learning_package_id WHERE p.key = ?1",
            )?,
            side_effects: count(
                "SELECT COUNT(*) FROM draft_side_effects s
                 JOIN draft_change_log_records r ON r.id = s.cause_id
                 JOIN draft_change_logs l ON l.id = r.draft_change_log_id
                 JOIN learning_packages p ON p.id = l.learning_package_id WHERE p.key = ?1",
            )?,
        })
    }

    /// Entity lists no row and no container version refers to
    pub fn orphaned_entity_lists(&self) -> ApiResult<usize> {
        let conn = self.lock();
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM entity_lists WHERE {}", ORPHANED_LIST_FILTER),
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

const ORPHANED_LIST_FILTER: &str = "NOT EXISTS (SELECT 1 FROM entity_list_rows r
                                                WHERE r.entity_list_id = entity_lists.id)
    AND NOT EXISTS (SELECT 1 FROM container_versions v
                    WHERE v.entity_list_id = entity_lists.id)";

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Lowercase `title`, replacing runs of other characters with `-`
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "container".to_string()
    } else {
        slug
    }
}

fn package_id(conn: &Connection, library_key: &LibraryKey) -> ApiResult<i64> {
    conn.query_row(
        "SELECT id FROM learning_packages WHERE key = ?1",
        params![library_key.to_string()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ApiError::not_found("library", library_key))
}

fn entity_exists(conn: &Connection, package_id: i64, local_key: &str) -> ApiResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM publishable_entities
                        WHERE learning_package_id = ?1 AND key = ?2)",
        params![package_id, local_key],
        |row| row.get(0),
    )?)
}

fn entity_id(conn: &Connection, package_id: i64, key: &EntityKey) -> ApiResult<i64> {
    conn.query_row(
        "SELECT id FROM publishable_entities WHERE learning_package_id = ?1 AND key = ?2",
        params![package_id, key.local_key()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ApiError::not_found("entity", key))
}

fn container_entity_id(
    conn: &Connection,
    package_id: i64,
    container_key: &ContainerKey,
) -> ApiResult<i64> {
    conn.query_row(
        "SELECT e.id FROM publishable_entities e
         JOIN containers c ON c.entity_id = e.id
         WHERE e.learning_package_id = ?1 AND e.key = ?2",
        params![package_id, container_key.local_key()],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| ApiError::not_found("container", container_key))
}

fn insert_entity(
    conn: &Connection,
    package_id: i64,
    local_key: &str,
    user_id: i64,
) -> ApiResult<i64> {
    conn.execute(
        "INSERT INTO publishable_entities (uuid, learning_package_id, key, created, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![Uuid::new_v4().to_string(), package_id, local_key, now(), user_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Open a change log and record one entity version change in it
fn record_change(
    conn: &Connection,
    package_id: i64,
    entity_id: i64,
    old_version: Option<i64>,
    new_version: i64,
    user_id: i64,
) -> ApiResult<i64> {
    conn.execute(
        "INSERT INTO draft_change_logs (learning_package_id, changed_at, changed_by)
         VALUES (?1, ?2, ?3)",
        params![package_id, now(), user_id],
    )?;
    let log_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO draft_change_log_records
             (draft_change_log_id, entity_id, old_version_num, new_version_num)
         VALUES (?1, ?2, ?3, ?4)",
        params![log_id, entity_id, old_version, new_version],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_entity_list(conn: &Connection, entity_ids: &[i64]) -> ApiResult<i64> {
    conn.execute("INSERT INTO entity_lists DEFAULT VALUES", [])?;
    let list_id = conn.last_insert_rowid();
    for (order_num, entity_id) in entity_ids.iter().enumerate() {
        conn.execute(
            "INSERT INTO entity_list_rows (entity_list_id, entity_id, order_num)
             VALUES (?1, ?2, ?3)",
            params![list_id, entity_id, order_num as i64],
        )?;
    }
    Ok(list_id)
}

fn check_child_tier(parent: &ContainerKey, child: &EntityKey) -> ApiResult<()> {
    let allowed = match (parent.container_type().child_tier(), child) {
        (Some(tier), EntityKey::Container(key)) => key.container_type() == tier,
        (None, EntityKey::Component(_)) => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::InvalidChild {
            parent: parent.to_string(),
            child: child.to_string(),
        })
    }
}

#[async_trait]
impl LibraryApi for SqliteStore {
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let conn = self.lock();
        Ok(conn
            .query_row(
                "SELECT id, email, username FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        username: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    async fn get_or_create_organization(
        &self,
        name: &str,
        short_name: &str,
    ) -> ApiResult<(Organization, bool)> {
        let conn = self.lock();
        let existing = conn
            .query_row(
                "SELECT id, name, short_name FROM organizations WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Organization {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        short_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        if let Some(org) = existing {
            return Ok((org, false));
        }

        conn.execute(
            "INSERT INTO organizations (name, short_name, created) VALUES (?1, ?2, ?3)",
            params![name, short_name, now()],
        )?;
        let org = Organization {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            short_name: short_name.to_string(),
        };
        debug!(org = %org, "Inserted organization");
        Ok((org, true))
    }

    async fn create_library(
        &self,
        org: &Organization,
        slug: &str,
        title: &str,
    ) -> ApiResult<Library> {
        if !is_valid_slug(slug) || !is_valid_slug(&org.short_name) {
            return Err(ApiError::InvalidInput(format!(
                "invalid library slug '{}' for organization '{}'",
                slug, org.short_name
            )));
        }
        let key = LibraryKey::new(&org.short_name, slug);

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM content_libraries WHERE org_id = ?1 AND slug = ?2)
                 OR EXISTS (SELECT 1 FROM learning_packages WHERE key = ?3)",
            params![org.id, slug, key.to_string()],
            |row| row.get(0),
        )?;
        if exists {
            return Err(ApiError::AlreadyExists {
                kind: "library",
                key: key.to_string(),
            });
        }

        tx.execute(
            "INSERT INTO learning_packages (key, title, created) VALUES (?1, ?2, ?3)",
            params![key.to_string(), title, now()],
        )?;
        let package_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO content_libraries (org_id, slug, learning_package_id) VALUES (?1, ?2, ?3)",
            params![org.id, slug, package_id],
        )?;
        tx.commit()?;

        Ok(Library {
            key,
            title: title.to_string(),
        })
    }

    async fn create_container(
        &self,
        library_key: &LibraryKey,
        container_type: ContainerType,
        slug: Option<&str>,
        title: &str,
        user_id: i64,
    ) -> ApiResult<Container> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let package_id = package_id(&tx, library_key)?;

        let slug = match slug {
            Some(slug) => {
                if !is_valid_slug(slug) {
                    return Err(ApiError::InvalidInput(format!("invalid container slug '{}'", slug)));
                }
                let key = ContainerKey::new(library_key.clone(), container_type, slug);
                if entity_exists(&tx, package_id, &key.local_key())? {
                    return Err(ApiError::AlreadyExists {
                        kind: "container",
                        key: key.to_string(),
                    });
                }
                slug.to_string()
            }
            None => {
                let base = slugify(title);
                let mut candidate = base.clone();
                let mut suffix = 2;
                while entity_exists(&tx, package_id, &format!("{}:{}", container_type, candidate))? {
                    candidate = format!("{}-{}", base, suffix);
                    suffix += 1;
                }
                candidate
            }
        };
        let key = ContainerKey::new(library_key.clone(), container_type, slug);

        let entity_id = insert_entity(&tx, package_id, &key.local_key(), user_id)?;
        tx.execute(
            "INSERT INTO containers (entity_id, container_type, slug) VALUES (?1, ?2, ?3)",
            params![entity_id, container_type.as_str(), key.slug()],
        )?;
        let list_id = insert_entity_list(&tx, &[])?;
        tx.execute(
            "INSERT INTO container_versions
                 (container_id, version_num, title, entity_list_id, created, created_by)
             VALUES (?1, 1, ?2, ?3, ?4, ?5)",
            params![entity_id, title, list_id, now(), user_id],
        )?;
        record_change(&tx, package_id, entity_id, None, 1, user_id)?;
        tx.commit()?;

        Ok(Container {
            key,
            title: title.to_string(),
        })
    }

    async fn create_library_block(
        &self,
        library_key: &LibraryKey,
        block_type: ComponentType,
        definition_id: &str,
        user_id: i64,
    ) -> ApiResult<Component> {
        if !is_valid_slug(definition_id) {
            return Err(ApiError::InvalidInput(format!(
                "invalid definition id '{}'",
                definition_id
            )));
        }
        let usage_key = UsageKey::new(library_key.clone(), block_type.as_str(), definition_id);

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let package_id = package_id(&tx, library_key)?;
        if entity_exists(&tx, package_id, &usage_key.local_key())? {
            return Err(ApiError::AlreadyExists {
                kind: "component",
                key: usage_key.to_string(),
            });
        }

        let entity_id = insert_entity(&tx, package_id, &usage_key.local_key(), user_id)?;
        tx.execute(
            "INSERT INTO components (entity_id, block_type, definition_id) VALUES (?1, ?2, ?3)",
            params![entity_id, block_type.as_str(), definition_id],
        )?;
        record_change(&tx, package_id, entity_id, None, 1, user_id)?;
        tx.commit()?;

        Ok(Component { usage_key })
    }

    async fn update_container_children(
        &self,
        container_key: &ContainerKey,
        children: &[EntityKey],
        user_id: i64,
    ) -> ApiResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let package_id = package_id(&tx, container_key.library())?;
        let container_id = container_entity_id(&tx, package_id, container_key)?;

        let mut child_ids = Vec::with_capacity(children.len());
        for child in children {
            check_child_tier(container_key, child)?;
            if child.library() != container_key.library() {
                return Err(ApiError::InvalidChild {
                    parent: container_key.to_string(),
                    child: child.to_string(),
                });
            }
            child_ids.push(entity_id(&tx, package_id, child)?);
        }

        let (version_num, title): (i64, String) = tx.query_row(
            "SELECT version_num, title FROM container_versions
             WHERE container_id = ?1 ORDER BY version_num DESC LIMIT 1",
            params![container_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let list_id = insert_entity_list(&tx, &child_ids)?;
        tx.execute(
            "INSERT INTO container_versions
                 (container_id, version_num, title, entity_list_id, created, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![container_id, version_num + 1, title, list_id, now(), user_id],
        )?;
        let effect_id = record_change(
            &tx,
            package_id,
            container_id,
            Some(version_num),
            version_num + 1,
            user_id,
        )?;

        // Each child's latest change is a cause of the container's new version
        for child_id in &child_ids {
            let cause_id: Option<i64> = tx.query_row(
                "SELECT MAX(id) FROM draft_change_log_records WHERE entity_id = ?1",
                params![child_id],
                |row| row.get(0),
            )?;
            if let Some(cause_id) = cause_id {
                tx.execute(
                    "INSERT OR IGNORE INTO draft_side_effects (cause_id, effect_id) VALUES (?1, ?2)",
                    params![cause_id, effect_id],
                )?;
            }
        }
        tx.commit()?;

        Ok(())
    }
}

#[async_trait]
impl LibraryPurger for SqliteStore {
    async fn delete_records(&self, set: RecordSet, library_key: &str) -> ApiResult<usize> {
        let conn = self.lock();
        let deleted = match set {
            RecordSet::ContentLibrary => conn.execute(
                "DELETE FROM content_libraries WHERE learning_package_id IN
                     (SELECT id FROM learning_packages WHERE key = ?1)",
                params![library_key],
            )?,
            RecordSet::EntityListRows => conn.execute(
                "DELETE FROM entity_list_rows WHERE entity_id IN
                     (SELECT e.id FROM publishable_entities e
                      JOIN learning_packages p ON p.id = e.learning_package_id
                      WHERE p.key = ?1)",
                params![library_key],
            )?,
            RecordSet::OrphanedEntityLists => conn.execute(
                &format!("DELETE FROM entity_lists WHERE {}", ORPHANED_LIST_FILTER),
                [],
            )?,
            RecordSet::DraftSideEffects => conn.execute(
                "DELETE FROM draft_side_effects WHERE cause_id IN
                     (SELECT r.id FROM draft_change_log_records r
                      JOIN draft_change_logs l ON l.id = r.draft_change_log_id
                      JOIN learning_packages p ON p.id = l.learning_package_id
                      WHERE p.key = ?1)",
                params![library_key],
            )?,
            RecordSet::LearningPackage => conn.execute(
                "DELETE FROM learning_packages WHERE key = ?1",
                params![library_key],
            )?,
        };
        Ok(deleted)
    }
}
