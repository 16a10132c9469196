//! Opaque keys identifying libraries and their entities.
//!
//! Key formats:
//! - library:   `lib:{org}:{slug}`
//! - container: `lct:{org}:{slug}:{container_type}:{container_slug}`
//! - component: `lb:{org}:{slug}:{block_type}:{definition_id}`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::ContainerType;

/// Error returned when a key string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} key: {value}")]
pub struct KeyParseError {
    pub kind: &'static str,
    pub value: String,
}

impl KeyParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Whether `s` can be used as an organization short name or slug
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Split `s` into exactly `n` colon-separated, non-empty parts after `prefix:`
fn split_key<'a>(s: &'a str, prefix: &str, n: usize) -> Option<Vec<&'a str>> {
    let rest = s.strip_prefix(prefix)?.strip_prefix(':')?;
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() != n || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

/// Library identifier (`lib:{org}:{slug}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryKey {
    org: String,
    slug: String,
}

impl LibraryKey {
    pub fn new(org: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            slug: slug.into(),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl fmt::Display for LibraryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lib:{}:{}", self.org, self.slug)
    }
}

impl FromStr for LibraryKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_key(s, "lib", 2).ok_or_else(|| KeyParseError::new("library", s))?;
        Ok(Self::new(parts[0], parts[1]))
    }
}

impl TryFrom<String> for LibraryKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LibraryKey> for String {
    fn from(key: LibraryKey) -> Self {
        key.to_string()
    }
}

/// Container identifier (`lct:{org}:{slug}:{type}:{container_slug}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerKey {
    library: LibraryKey,
    container_type: ContainerType,
    slug: String,
}

impl ContainerKey {
    pub fn new(library: LibraryKey, container_type: ContainerType, slug: impl Into<String>) -> Self {
        Self {
            library,
            container_type,
            slug: slug.into(),
        }
    }

    pub fn library(&self) -> &LibraryKey {
        &self.library
    }

    pub fn container_type(&self) -> ContainerType {
        self.container_type
    }

    /// Slug of the container, unique within its library
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Entity key local to the owning package (`{type}:{slug}`)
    pub fn local_key(&self) -> String {
        format!("{}:{}", self.container_type, self.slug)
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lct:{}:{}:{}:{}",
            self.library.org, self.library.slug, self.container_type, self.slug
        )
    }
}

impl FromStr for ContainerKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_key(s, "lct", 4).ok_or_else(|| KeyParseError::new("container", s))?;
        let container_type = parts[2]
            .parse()
            .map_err(|_| KeyParseError::new("container", s))?;
        Ok(Self::new(
            LibraryKey::new(parts[0], parts[1]),
            container_type,
            parts[3],
        ))
    }
}

impl TryFrom<String> for ContainerKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContainerKey> for String {
    fn from(key: ContainerKey) -> Self {
        key.to_string()
    }
}

/// Component identifier (`lb:{org}:{slug}:{block_type}:{definition_id}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsageKey {
    library: LibraryKey,
    block_type: String,
    definition_id: String,
}

impl UsageKey {
    pub fn new(
        library: LibraryKey,
        block_type: impl Into<String>,
        definition_id: impl Into<String>,
    ) -> Self {
        Self {
            library,
            block_type: block_type.into(),
            definition_id: definition_id.into(),
        }
    }

    pub fn library(&self) -> &LibraryKey {
        &self.library
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    /// Entity key local to the owning package (`xblock.v1:{type}:{id}`)
    pub fn local_key(&self) -> String {
        format!("xblock.v1:{}:{}", self.block_type, self.definition_id)
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lb:{}:{}:{}:{}",
            self.library.org, self.library.slug, self.block_type, self.definition_id
        )
    }
}

impl FromStr for UsageKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_key(s, "lb", 4).ok_or_else(|| KeyParseError::new("usage", s))?;
        Ok(Self::new(LibraryKey::new(parts[0], parts[1]), parts[2], parts[3]))
    }
}

impl TryFrom<String> for UsageKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UsageKey> for String {
    fn from(key: UsageKey) -> Self {
        key.to_string()
    }
}

/// Anything that can sit in a container's child list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Container(ContainerKey),
    Component(UsageKey),
}

impl EntityKey {
    pub fn library(&self) -> &LibraryKey {
        match self {
            EntityKey::Container(key) => key.library(),
            EntityKey::Component(key) => key.library(),
        }
    }

    pub fn local_key(&self) -> String {
        match self {
            EntityKey::Container(key) => key.local_key(),
            EntityKey::Component(key) => key.local_key(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Container(key) => key.fmt(f),
            EntityKey::Component(key) => key.fmt(f),
        }
    }
}

impl FromStr for EntityKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("lct:") {
            s.parse().map(EntityKey::Container)
        } else if s.starts_with("lb:") {
            s.parse().map(EntityKey::Component)
        } else {
            Err(KeyParseError::new("entity", s))
        }
    }
}

impl From<ContainerKey> for EntityKey {
    fn from(key: ContainerKey) -> Self {
        EntityKey::Container(key)
    }
}

impl From<UsageKey> for EntityKey {
    fn from(key: UsageKey) -> Self {
        EntityKey::Component(key)
    }
}
