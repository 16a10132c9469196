//! Random hierarchical linking between two tiers.
//!
//! Every child is appended to `fan_out` parents drawn uniformly *with
//! replacement*, so the same child can land under one parent several times.
//! Links are computed entirely in memory and then written with exactly one
//! `update_container_children` call per parent, in parent creation order,
//! including parents that were never drawn.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::{ApiError, LibraryApi};
use crate::domain::{ContainerKey, EntityKey};

/// Linking failures
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("cannot draw {fan_out} parent(s) per child from an empty parent tier")]
    NoParents { fan_out: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Parent draws per child: `floor(child_count * link_rate)`
pub fn fan_out(child_count: usize, link_rate: f64) -> usize {
    let draws = (child_count as f64 * link_rate).floor();
    if draws.is_finite() && draws > 0.0 {
        draws as usize
    } else {
        0
    }
}

/// Pending child lists, one entry per parent in parent order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPlan {
    entries: Vec<(ContainerKey, Vec<EntityKey>)>,
}

impl LinkPlan {
    /// Plan with an empty child list for every parent
    pub fn new(parents: &[ContainerKey]) -> Self {
        Self {
            entries: parents.iter().map(|p| (p.clone(), Vec::new())).collect(),
        }
    }

    pub fn entries(&self) -> &[(ContainerKey, Vec<EntityKey>)] {
        &self.entries
    }

    /// Child list planned for `parent`
    pub fn children_of(&self, parent: &ContainerKey) -> Option<&[EntityKey]> {
        self.entries
            .iter()
            .find(|(key, _)| key == parent)
            .map(|(_, children)| children.as_slice())
    }

    /// Total number of links (duplicates included)
    pub fn link_count(&self) -> usize {
        self.entries.iter().map(|(_, children)| children.len()).sum()
    }

    /// Number of parents that end up with an empty list
    pub fn empty_parents(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, children)| children.is_empty())
            .count()
    }

    /// Write every parent's child list, one call per parent
    pub async fn persist(&self, api: &dyn LibraryApi, user_id: i64) -> Result<(), ApiError> {
        for (parent, children) in &self.entries {
            info!("Saving children of {}...", parent);
            api.update_container_children(parent, children, user_id)
                .await?;
            info!("Saved children of {}", parent);
        }
        Ok(())
    }
}

/// Assign each child to `fan_out` parents drawn uniformly with replacement
pub fn plan_links<R, C>(
    parents: &[ContainerKey],
    children: &[C],
    fan_out: usize,
    rng: &mut R,
) -> Result<LinkPlan, LinkError>
where
    R: Rng,
    C: Clone + Into<EntityKey>,
{
    let mut plan = LinkPlan::new(parents);
    if fan_out == 0 || children.is_empty() {
        return Ok(plan);
    }
    if parents.is_empty() {
        return Err(LinkError::NoParents { fan_out });
    }

    for child in children {
        let child: EntityKey = child.clone().into();
        for _ in 0..fan_out {
            let idx = rng.gen_range(0..plan.entries.len());
            plan.entries[idx].1.push(child.clone());
        }
        debug!(child = %child, fan_out, "Planned links");
    }

    Ok(plan)
}

/// Plan links, then persist them
pub async fn link_in_containers<R, C>(
    api: &dyn LibraryApi,
    parents: &[ContainerKey],
    children: &[C],
    fan_out: usize,
    rng: &mut R,
    user_id: i64,
) -> Result<LinkPlan, LinkError>
where
    R: Rng + Send,
    C: Clone + Into<EntityKey> + Sync,
{
    let plan = plan_links(parents, children, fan_out, rng)?;
    plan.persist(api, user_id).await?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContainerType, LibraryKey, UsageKey};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn containers(container_type: ContainerType, n: usize) -> Vec<ContainerKey> {
        let library = LibraryKey::new("org", "lib");
        (1..=n)
            .map(|i| {
                ContainerKey::new(library.clone(), container_type, format!("{}-{}", container_type, i))
            })
            .collect()
    }

    #[test]
    fn test_fan_out_floors() {
        assert_eq!(fan_out(30, 0.5), 15);
        assert_eq!(fan_out(3, 0.5), 1);
        assert_eq!(fan_out(1, 0.5), 0);
        assert_eq!(fan_out(2, 1.0), 2);
        assert_eq!(fan_out(0, 10.0), 0);
        assert_eq!(fan_out(10, 0.0), 0);
        assert_eq!(fan_out(10, -1.0), 0);
        assert_eq!(fan_out(10, f64::NAN), 0);
    }

    #[test]
    fn test_each_child_drawn_fan_out_times() {
        let mut rng = StdRng::seed_from_u64(43);
        let parents = containers(ContainerType::Section, 5);
        let children = containers(ContainerType::Subsection, 8);

        let plan = plan_links(&parents, &children, 4, &mut rng).unwrap();

        assert_eq!(plan.entries().len(), 5);
        assert_eq!(plan.link_count(), 8 * 4);
        for child in &children {
            let child = EntityKey::from(child.clone());
            let draws: usize = plan
                .entries()
                .iter()
                .map(|(_, list)| list.iter().filter(|c| **c == child).count())
                .sum();
            assert_eq!(draws, 4);
        }
    }

    #[test]
    fn test_plan_keeps_parent_order_and_empty_parents() {
        let mut rng = StdRng::seed_from_u64(1);
        let parents = containers(ContainerType::Unit, 6);
        let children = vec![UsageKey::new(LibraryKey::new("org", "lib"), "html", "c1")];

        let plan = plan_links(&parents, &children, 1, &mut rng).unwrap();

        let order: Vec<&ContainerKey> = plan.entries().iter().map(|(k, _)| k).collect();
        assert_eq!(order, parents.iter().collect::<Vec<_>>());
        assert_eq!(plan.empty_parents(), 5);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let parents = containers(ContainerType::Section, 4);
        let children = containers(ContainerType::Subsection, 10);

        let a = plan_links(&parents, &children, 3, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = plan_links(&parents, &children, 3, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_parents_with_positive_fan_out() {
        let mut rng = StdRng::seed_from_u64(0);
        let children = containers(ContainerType::Unit, 2);

        let result = plan_links(&[], &children, 1, &mut rng);
        assert!(matches!(result, Err(LinkError::NoParents { fan_out: 1 })));

        // Nothing to draw is not an error
        let plan = plan_links(&[], &children, 0, &mut rng).unwrap();
        assert_eq!(plan.link_count(), 0);
    }
}
