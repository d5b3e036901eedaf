//! Diff engine for incremental re-planning.
//!
//! This module compares a previously applied model with the desired one by
//! resource hash and turns the difference into a [`ChangePlan`]: a teardown
//! of removed resources followed by an apply of new and changed ones.

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::Result;
use crate::model::{ModelHasher, ResourceModel};
use crate::resolver::ReferenceResolver;

use super::plan::{Plan, PlanDirection};
use super::topo::build_plan;

/// Engine for computing diffs between two resource models.
#[derive(Debug, Default)]
pub struct DiffEngine {
    /// Resource hasher.
    hasher: ModelHasher,
}

/// Difference for a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDiff {
    /// Resource id.
    pub id: String,
    /// Type of difference.
    pub diff_type: DiffType,
    /// Previous hash (if the resource existed).
    pub old_hash: Option<String>,
    /// New hash (if the resource is still desired).
    pub new_hash: Option<String>,
}

/// Type of difference detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    /// Resource needs to be created.
    Create,
    /// Resource needs to be updated.
    Update,
    /// Resource needs to be deleted.
    Delete,
    /// Resource is unchanged.
    NoChange,
}

/// Complete diff result, sorted by resource id.
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// All resource diffs.
    pub diffs: Vec<ResourceDiff>,
    /// Number of resources to create.
    pub creates: usize,
    /// Number of resources to update.
    pub updates: usize,
    /// Number of resources to delete.
    pub deletes: usize,
    /// Number of unchanged resources.
    pub unchanged: usize,
}

/// Ordered plans that move a deployment from one model to another.
#[derive(Debug, Clone)]
pub struct ChangePlan {
    /// Teardown of resources removed from the model.
    pub teardown: Plan,
    /// Apply of created and updated resources.
    pub apply: Plan,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hasher: ModelHasher::new(),
        }
    }

    /// Computes the diff between the previous and desired models.
    #[must_use]
    pub fn compute_diff(&self, previous: &ResourceModel, desired: &ResourceModel) -> DiffResult {
        let mut diffs = Vec::new();

        for resource in desired.sorted() {
            let new_hash = self.hasher.hash_resource(resource);
            let diff = match previous.get(&resource.id) {
                None => {
                    debug!("Resource {} needs to be created", resource.id);
                    ResourceDiff {
                        id: resource.id.clone(),
                        diff_type: DiffType::Create,
                        old_hash: None,
                        new_hash: Some(new_hash),
                    }
                }
                Some(old) => {
                    let old_hash = self.hasher.hash_resource(old);
                    let diff_type = if old_hash == new_hash {
                        DiffType::NoChange
                    } else {
                        debug!("Resource {} changed", resource.id);
                        DiffType::Update
                    };
                    ResourceDiff {
                        id: resource.id.clone(),
                        diff_type,
                        old_hash: Some(old_hash),
                        new_hash: Some(new_hash),
                    }
                }
            };
            diffs.push(diff);
        }

        for resource in previous.sorted() {
            if !desired.contains(&resource.id) {
                debug!("Resource {} was removed", resource.id);
                diffs.push(ResourceDiff {
                    id: resource.id.clone(),
                    diff_type: DiffType::Delete,
                    old_hash: Some(self.hasher.hash_resource(resource)),
                    new_hash: None,
                });
            }
        }

        diffs.sort_by(|a, b| a.id.cmp(&b.id));

        let count = |t: DiffType| diffs.iter().filter(|d| d.diff_type == t).count();
        let creates = count(DiffType::Create);
        let updates = count(DiffType::Update);
        let deletes = count(DiffType::Delete);
        let unchanged = count(DiffType::NoChange);

        DiffResult {
            diffs,
            creates,
            updates,
            deletes,
            unchanged,
        }
    }
}

impl DiffResult {
    /// Returns true if there are any changes.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.creates > 0 || self.updates > 0 || self.deletes > 0
    }

    /// Returns the total number of changes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.creates + self.updates + self.deletes
    }

    /// Ids whose diff type is one of `types`.
    #[must_use]
    pub fn ids_of(&self, types: &[DiffType]) -> BTreeSet<String> {
        self.diffs
            .iter()
            .filter(|d| types.contains(&d.diff_type))
            .map(|d| d.id.clone())
            .collect()
    }
}

impl ChangePlan {
    /// Builds the change plan for a diff.
    ///
    /// Removed resources are torn down in the order the previous model's
    /// graph dictates; created and updated resources are applied in the
    /// order of the desired model's graph.
    ///
    /// # Errors
    ///
    /// Returns an error if either model fails to resolve or plan.
    pub fn build(
        diff: &DiffResult,
        previous: &ResourceModel,
        desired: &ResourceModel,
        resolver: &ReferenceResolver,
    ) -> Result<Self> {
        let deleted = diff.ids_of(&[DiffType::Delete]);
        let teardown = if deleted.is_empty() {
            Plan::empty(PlanDirection::Teardown)
        } else {
            let graph = resolver.resolve(previous)?;
            build_plan(&graph, PlanDirection::Teardown)?.retain_ids(&deleted)
        };

        let changed = diff.ids_of(&[DiffType::Create, DiffType::Update]);
        let apply = if changed.is_empty() {
            Plan::empty(PlanDirection::Apply)
        } else {
            let graph = resolver.resolve(desired)?;
            build_plan(&graph, PlanDirection::Apply)?.retain_ids(&changed)
        };

        Ok(Self { teardown, apply })
    }

    /// Returns true if neither plan schedules anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.teardown.is_empty() && self.apply.is_empty()
    }
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

impl std::fmt::Display for ResourceDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.diff_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Resource, ResourceKind};

    fn model(version: &str) -> ResourceModel {
        let mut model = ResourceModel::new("svc");
        model
            .add(Resource::new("vpc", ResourceKind::Network).with_attribute("max_zones", 2))
            .unwrap();
        model
            .add(Resource::new("cluster", ResourceKind::Cluster).with_reference("vpc"))
            .unwrap();
        model
            .add(
                Resource::new("role", ResourceKind::Role)
                    .with_attribute("assumed_by", "ecs-tasks.amazonaws.com"),
            )
            .unwrap();
        model
            .add(
                Resource::new("task", ResourceKind::TaskDefinition)
                    .with_attribute("cpu", 512)
                    .with_attribute("memory_mib", 2048)
                    .with_attribute("version", version)
                    .with_reference("role"),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_identical_models_have_no_changes() {
        let engine = DiffEngine::new();
        let diff = engine.compute_diff(&model("1"), &model("1"));

        assert!(!diff.has_changes());
        assert_eq!(diff.unchanged, 4);

        let plan = ChangePlan::build(&diff, &model("1"), &model("1"), &ReferenceResolver::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_single_attribute_change_is_one_update() {
        let engine = DiffEngine::new();
        let diff = engine.compute_diff(&model("1"), &model("2"));

        assert_eq!(diff.updates, 1);
        assert_eq!(diff.total_changes(), 1);
        assert_eq!(diff.ids_of(&[DiffType::Update]), BTreeSet::from(["task".to_string()]));

        let plan = ChangePlan::build(&diff, &model("1"), &model("2"), &ReferenceResolver::new()).unwrap();
        assert!(plan.teardown.is_empty());
        assert_eq!(plan.apply.batch_ids(), vec![vec!["task"]]);
    }

    #[test]
    fn test_create_and_delete() {
        let previous = model("1");
        let mut desired = ResourceModel::new("svc");
        desired
            .add(Resource::new("vpc", ResourceKind::Network).with_attribute("max_zones", 2))
            .unwrap();
        desired
            .add(Resource::new("cluster-b", ResourceKind::Cluster).with_reference("vpc"))
            .unwrap();

        let diff = DiffEngine::new().compute_diff(&previous, &desired);
        assert_eq!(diff.creates, 1);
        assert_eq!(diff.deletes, 3);
        assert_eq!(diff.unchanged, 1);

        let plan = ChangePlan::build(&diff, &previous, &desired, &ReferenceResolver::new()).unwrap();
        // task goes before role: it depends on it.
        assert_eq!(
            plan.teardown.batch_ids(),
            vec![vec!["cluster", "task"], vec!["role"]]
        );
        assert_eq!(plan.apply.batch_ids(), vec![vec!["cluster-b"]]);
    }

    #[test]
    fn test_diff_display() {
        let diff = ResourceDiff {
            id: "vpc".to_string(),
            diff_type: DiffType::NoChange,
            old_hash: None,
            new_hash: None,
        };
        assert_eq!(diff.to_string(), "vpc: no change");
    }
}
