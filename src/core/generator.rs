//! Synthetic library generation.
//!
//! Builds a library tier by tier: sections, then subsections linked under
//! sections, units linked under subsections, and components linked under
//! units. Every entity goes through the authoring API; any failed call aborts
//! the run and leaves whatever was already created in place.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::{ApiError, LibraryApi};
use crate::config::{ConfigError, GenerateConfig};
use crate::domain::{ContainerKey, ContainerType, LibraryKey, UsageKey, User};

use super::linker::{link_in_containers, LinkError};

/// Generation failures
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid generation plan: {0}")]
    Config(#[from] ConfigError),

    #[error("no user with email {email}")]
    UserNotFound { email: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to link {tier}s: {source}")]
    Link {
        tier: &'static str,
        #[source]
        source: LinkError,
    },
}

/// Summary of a finished generation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub library_key: LibraryKey,
    pub organization: String,
    pub organization_created: bool,
    pub sections: usize,
    pub subsections: usize,
    pub units: usize,
    pub components: usize,
    /// Links written per child tier (duplicates included)
    pub subsection_links: usize,
    pub unit_links: usize,
    pub component_links: usize,
}

/// Random source for a run: seeded when `seed` is set, from entropy otherwise
pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Populates one library through a [`LibraryApi`]
pub struct Generator<'a> {
    api: &'a dyn LibraryApi,
    config: GenerateConfig,
}

impl<'a> Generator<'a> {
    pub fn new(api: &'a dyn LibraryApi, config: GenerateConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Run every generation step in order
    #[instrument(skip(self, rng), fields(library = %self.config.library_slug))]
    pub async fn run<R>(&self, rng: &mut R) -> Result<GenerationReport, GenerateError>
    where
        R: Rng + Send,
    {
        self.config.validate()?;
        let config = &self.config;

        let user = self
            .api
            .find_user_by_email(&config.user_email)
            .await?
            .ok_or_else(|| GenerateError::UserNotFound {
                email: config.user_email.clone(),
            })?;

        info!("Generating or retrieving sample Organization...");
        let (org, org_created) = self
            .api
            .get_or_create_organization(&config.org_name, &config.org_name)
            .await?;
        info!("{} {}", if org_created { "Created" } else { "Retrieved" }, org);

        info!("Creating the sample large library...");
        let library = self
            .api
            .create_library(&org, &config.library_slug, &config.library_title)
            .await?;
        let library_key = library.key;
        info!("Created {}", config.library_title);

        let sections = self
            .create_containers(&library_key, ContainerType::Section, config.sections, &user)
            .await?;

        // Subsections are created unlinked, then attached to sections
        let subsections = self
            .create_containers(
                &library_key,
                ContainerType::Subsection,
                config.subsections.count,
                &user,
            )
            .await?;
        info!("Linking subsections to sections...");
        let subsection_plan = link_in_containers(
            self.api,
            &sections,
            &subsections,
            config.subsections.fan_out(),
            &mut *rng,
            user.id,
        )
        .await
        .map_err(|source| GenerateError::Link {
            tier: "subsection",
            source,
        })?;
        info!("Linked subsections to sections");

        let units = self
            .create_containers(&library_key, ContainerType::Unit, config.units.count, &user)
            .await?;
        info!("Linking units to subsections...");
        let unit_plan = link_in_containers(
            self.api,
            &subsections,
            &units,
            config.units.fan_out(),
            &mut *rng,
            user.id,
        )
        .await
        .map_err(|source| GenerateError::Link {
            tier: "unit",
            source,
        })?;
        info!("Linked units to subsections");

        let components = self.create_components(&library_key, &user, &mut *rng).await?;
        info!("Linking components to units...");
        let component_plan = link_in_containers(
            self.api,
            &units,
            &components,
            config.components.fan_out(),
            &mut *rng,
            user.id,
        )
        .await
        .map_err(|source| GenerateError::Link {
            tier: "component",
            source,
        })?;
        info!("Linked components to units");

        Ok(GenerationReport {
            library_key,
            organization: org.name,
            organization_created: org_created,
            sections: sections.len(),
            subsections: subsections.len(),
            units: units.len(),
            components: components.len(),
            subsection_links: subsection_plan.link_count(),
            unit_links: unit_plan.link_count(),
            component_links: component_plan.link_count(),
        })
    }

    /// Create `count` empty containers titled "{Tier} {i}"
    async fn create_containers(
        &self,
        library_key: &LibraryKey,
        container_type: ContainerType,
        count: usize,
        user: &User,
    ) -> Result<Vec<ContainerKey>, ApiError> {
        info!("Creating {} {}s...", count, container_type);
        let mut keys = Vec::with_capacity(count);
        for i in 1..=count {
            let container = self
                .api
                .create_container(
                    library_key,
                    container_type,
                    None,
                    &container_type.title(i),
                    user.id,
                )
                .await?;
            keys.push(container.key);
        }
        info!("Created {} {}s", count, container_type);
        Ok(keys)
    }

    /// Create the configured components with uniformly drawn block types
    async fn create_components<R>(
        &self,
        library_key: &LibraryKey,
        user: &User,
        rng: &mut R,
    ) -> Result<Vec<UsageKey>, GenerateError>
    where
        R: Rng + Send,
    {
        let count = self.config.components.count;
        info!("Creating {} components...", count);
        let mut keys = Vec::with_capacity(count);
        for i in 1..=count {
            let block_type = *self
                .config
                .component_types
                .choose(&mut *rng)
                .ok_or(ConfigError::NoComponentTypes)?;
            let definition_id = format!("{}_component_{}", self.config.library_slug, i);
            let component = self
                .api
                .create_library_block(library_key, block_type, &definition_id, user.id)
                .await?;
            keys.push(component.usage_key);
        }
        info!("Created {} components", count);
        Ok(keys)
    }
}
