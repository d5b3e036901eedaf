//! Reference resolution.
//!
//! Turns a [`ResourceModel`] into a [`DependencyGraph`]: every explicit
//! reference and every `{{ref.<id>}}` attribute token becomes a depends-on
//! edge, dangling targets are rejected, and the per-kind reference rules are
//! checked once every resource's kind is known.

mod graph;
mod references;

pub use graph::DependencyGraph;
pub use references::{collect_attribute_references, rewrite_references};

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::model::{Resource, ResourceModel};

/// Resolves a model with the default resolver.
///
/// # Errors
///
/// See [`ReferenceResolver::resolve`].
pub fn resolve(model: &ResourceModel) -> Result<DependencyGraph, ResolveError> {
    ReferenceResolver::new().resolve(model)
}

/// Resolver for building dependency graphs from resource models.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver {
    /// Whether per-kind reference rules are enforced.
    check_reference_rules: bool,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceResolver {
    /// Creates a resolver that enforces reference rules.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            check_reference_rules: true,
        }
    }

    /// Enables or disables per-kind reference rules.
    ///
    /// Dangling references are always rejected.
    #[must_use]
    pub const fn with_reference_rules(mut self, enabled: bool) -> Self {
        self.check_reference_rules = enabled;
        self
    }

    /// Resolves all references in the model into a dependency graph.
    ///
    /// Resources are visited in id order, so the first error reported is the
    /// same on every run.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::DanglingReference`] if a reference targets an
    /// id not in the model, or [`ResolveError::InvalidReferences`] if a
    /// resource breaks its kind's reference rules.
    pub fn resolve(&self, model: &ResourceModel) -> Result<DependencyGraph, ResolveError> {
        let sorted = model.sorted();
        let mut edges = Vec::new();

        for resource in &sorted {
            for target in Self::targets(resource) {
                if !model.contains(&target) {
                    return Err(ResolveError::DanglingReference {
                        from: resource.id.clone(),
                        to: target,
                    });
                }
                edges.push((resource.id.as_str(), target));
            }
        }

        if self.check_reference_rules {
            for resource in &sorted {
                Self::check_rules(resource, model)?;
            }
        }

        let mut graph = DependencyGraph::with_nodes(sorted.iter().map(|r| (*r).clone()));
        for (from, to) in &edges {
            graph.add_edge(from, to);
        }

        info!(
            "Resolved model '{}': {} resources, {} edges",
            model.name(),
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Every id a resource depends on, explicit references first, deduplicated.
    fn targets(resource: &Resource) -> Vec<String> {
        let mut seen = BTreeSet::new();
        resource
            .references
            .iter()
            .cloned()
            .chain(collect_attribute_references(&resource.attributes))
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Checks a resource's reference counts against its kind's rules.
    fn check_rules(resource: &Resource, model: &ResourceModel) -> Result<(), ResolveError> {
        let targets = Self::targets(resource);

        for rule in resource.kind.reference_rules() {
            let found = targets
                .iter()
                .filter_map(|id| model.get(id))
                .filter(|target| target.kind == rule.target)
                .count();

            if !rule.accepts(found) {
                debug!(
                    "Resource '{}' has {found} {} references, rule wants {}",
                    resource.id,
                    rule.target,
                    rule.expectation()
                );
                return Err(ResolveError::InvalidReferences {
                    id: resource.id.clone(),
                    kind: resource.kind,
                    target_kind: rule.target,
                    expected: rule.expectation(),
                    found,
                });
            }
        }

        Ok(())
    }
}
