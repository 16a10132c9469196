//! Entities of the content-library data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::keys::{ContainerKey, LibraryKey, UsageKey};

/// Container tier
///
/// Tiers form a strict hierarchy: Section → Subsection → Unit → Component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    Section,
    Subsection,
    Unit,
}

impl ContainerType {
    pub const ALL: [ContainerType; 3] = [
        ContainerType::Section,
        ContainerType::Subsection,
        ContainerType::Unit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::Section => "section",
            ContainerType::Subsection => "subsection",
            ContainerType::Unit => "unit",
        }
    }

    /// Container tier allowed directly below this one (`None` means components)
    pub fn child_tier(&self) -> Option<ContainerType> {
        match self {
            ContainerType::Section => Some(ContainerType::Subsection),
            ContainerType::Subsection => Some(ContainerType::Unit),
            ContainerType::Unit => None,
        }
    }

    /// Display title for the `index`-th (1-based) container of this tier
    pub fn title(&self, index: usize) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => format!("{}{} {}", first.to_uppercase(), chars.as_str(), index),
            None => index.to_string(),
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "section" => Ok(ContainerType::Section),
            "subsection" => Ok(ContainerType::Subsection),
            "unit" => Ok(ContainerType::Unit),
            _ => anyhow::bail!("Unknown container type: {}", s),
        }
    }
}

/// Leaf component block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Html,
    Video,
    Problem,
}

impl ComponentType {
    pub const ALL: [ComponentType; 3] = [
        ComponentType::Html,
        ComponentType::Video,
        ComponentType::Problem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Html => "html",
            ComponentType::Video => "video",
            ComponentType::Problem => "problem",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "html" => Ok(ComponentType::Html),
            "video" => Ok(ComponentType::Video),
            "problem" => Ok(ComponentType::Problem),
            _ => anyhow::bail!("Unknown component type: {}", s),
        }
    }
}

/// Namespace owner for libraries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub short_name: String,
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.short_name)
    }
}

/// Acting user for authoring calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
}

/// A content library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub key: LibraryKey,
    pub title: String,
}

/// A section, subsection or unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub key: ContainerKey,
    pub title: String,
}

impl Container {
    pub fn container_type(&self) -> ContainerType {
        self.key.container_type()
    }
}

/// A leaf content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub usage_key: UsageKey,
}

/// Record sets removed when purging a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSet {
    /// Library registration pointing at the package
    ContentLibrary,
    /// Child-list rows whose entity belongs to the package
    EntityListRows,
    /// Entity lists with no rows and no container version
    OrphanedEntityLists,
    /// Side effects caused by the package's change logs
    DraftSideEffects,
    /// The package itself
    LearningPackage,
}

impl RecordSet {
    /// Deletion order; dependents come before the package
    pub const PURGE_ORDER: [RecordSet; 5] = [
        RecordSet::ContentLibrary,
        RecordSet::EntityListRows,
        RecordSet::OrphanedEntityLists,
        RecordSet::DraftSideEffects,
        RecordSet::LearningPackage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSet::ContentLibrary => "content_library",
            RecordSet::EntityListRows => "entity_list_rows",
            RecordSet::OrphanedEntityLists => "orphaned_entity_lists",
            RecordSet::DraftSideEffects => "draft_side_effects",
            RecordSet::LearningPackage => "learning_package",
        }
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
