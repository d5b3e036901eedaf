//! End-to-end compilation.
//!
//! [`Compiler`] chains the stages: resolve the model into a dependency
//! graph, order it into batches, and emit the IR document.

use tracing::{debug, info, info_span};

use crate::emitter::{PlanEmitter, SerializedDocument};
use crate::error::Result;
use crate::model::{ModelHasher, ResourceModel};
use crate::planner::{build_plan, ChangePlan, DiffEngine, Plan};
use crate::resolver::ReferenceResolver;
use crate::settings::CompilerSettings;

/// Compiles resource models into provisioning plans.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler {
    /// Settings for this compiler.
    settings: CompilerSettings,
}

impl Compiler {
    /// Creates a compiler with the given settings.
    #[must_use]
    pub const fn new(settings: CompilerSettings) -> Self {
        Self { settings }
    }

    /// Returns the compiler settings.
    #[must_use]
    pub const fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Compiles a model into a serialized IR document.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by resolution, planning or emission.
    pub fn compile(&self, model: &ResourceModel) -> Result<SerializedDocument> {
        let _span = info_span!("compile", model = model.name()).entered();
        let plan = self.plan_only(model)?;
        let document = PlanEmitter::new()
            .with_pretty(self.settings.pretty)
            .emit(&plan)?;

        info!(
            "Compiled '{}' ({}): document {}",
            model.name(),
            self.settings.direction,
            ModelHasher::new().short_hash(&document.fingerprint())
        );
        Ok(document)
    }

    /// Resolves and plans a model without emitting it.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by resolution or planning.
    pub fn plan_only(&self, model: &ResourceModel) -> Result<Plan> {
        let hasher = ModelHasher::new();
        debug!(
            "Compiling '{}' (model {})",
            model.name(),
            hasher.short_hash(&hasher.hash_model(model))
        );

        let graph = self.resolver().resolve(model)?;
        let plan = build_plan(&graph, self.settings.direction)?;
        Ok(plan)
    }

    /// Plans the changes needed to move from `previous` to `desired`.
    ///
    /// The configured direction is ignored: removals are always torn down
    /// and additions always applied.
    ///
    /// # Errors
    ///
    /// Returns an error if either model fails to resolve or plan.
    pub fn plan_changes(&self, previous: &ResourceModel, desired: &ResourceModel) -> Result<ChangePlan> {
        let diff = DiffEngine::new().compute_diff(previous, desired);
        info!(
            "Model diff: {} to create, {} to update, {} to delete, {} unchanged",
            diff.creates, diff.updates, diff.deletes, diff.unchanged
        );
        ChangePlan::build(&diff, previous, desired, &self.resolver())
    }

    const fn resolver(&self) -> ReferenceResolver {
        ReferenceResolver::new().with_reference_rules(self.settings.validate_references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::ContainerServiceBlueprint;
    use crate::error::{PlanError, ResolveError, StackError};
    use crate::model::{Resource, ResourceKind};
    use crate::planner::PlanDirection;

    fn network_and_cluster() -> ResourceModel {
        let mut model = ResourceModel::new("svc");
        model
            .add(Resource::new("vpc", ResourceKind::Network).with_attribute("max_zones", 2))
            .unwrap();
        model
            .add(Resource::new("cluster", ResourceKind::Cluster).with_attribute("vpc", "{{ref.vpc}}"))
            .unwrap();
        model
    }

    #[test]
    fn test_compile_is_deterministic() {
        let compiler = Compiler::default();
        let a = compiler.compile(&network_and_cluster()).unwrap();
        let b = compiler.compile(&network_and_cluster()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(
            a.parse().unwrap().batch_ids(),
            vec![vec!["vpc"], vec!["cluster"]]
        );
    }

    #[test]
    fn test_insertion_order_does_not_change_output() {
        let forward = ContainerServiceBlueprint::new("svc").build().unwrap();
        let mut reversed = ResourceModel::new("svc");
        let resources: Vec<Resource> = forward.iter().cloned().collect();
        for resource in resources.into_iter().rev() {
            reversed.add(resource).unwrap();
        }

        let compiler = Compiler::default();
        let a = compiler.compile(&forward).unwrap();
        let b = compiler.compile(&reversed).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_dangling_reference_wins_over_cycle() {
        let mut model = ResourceModel::new("broken");
        model
            .add(Resource::new("a", ResourceKind::Cluster).with_reference("b"))
            .unwrap();
        model
            .add(Resource::new("b", ResourceKind::Cluster).with_reference("a"))
            .unwrap();
        model
            .add(Resource::new("c", ResourceKind::Cluster).with_attribute("parent", "{{ref.ghost}}"))
            .unwrap();

        let compiler = Compiler::new(CompilerSettings::default().with_validate_references(false));
        let err = compiler.compile(&model).unwrap_err();
        assert!(matches!(
            err,
            StackError::Resolve(ResolveError::DanglingReference { ref from, ref to })
                if from == "c" && to == "ghost"
        ));
    }

    #[test]
    fn test_compile_teardown() {
        let compiler = Compiler::new(CompilerSettings::default().with_direction(PlanDirection::Teardown));
        let document = compiler.compile(&network_and_cluster()).unwrap().parse().unwrap();
        assert_eq!(document.direction, PlanDirection::Teardown);
        assert_eq!(document.batch_ids(), vec![vec!["cluster"], vec!["vpc"]]);
    }

    #[test]
    fn test_reference_rules_can_be_disabled() {
        let mut model = ResourceModel::new("loose");
        model.add(Resource::new("cluster", ResourceKind::Cluster)).unwrap();

        let err = Compiler::default().plan_only(&model).unwrap_err();
        assert!(matches!(
            err,
            StackError::Resolve(ResolveError::InvalidReferences { .. })
        ));

        let lenient = Compiler::new(CompilerSettings::default().with_validate_references(false));
        assert_eq!(lenient.plan_only(&model).unwrap().resource_count(), 1);
    }

    #[test]
    fn test_cycle_surfaces_as_plan_error() {
        let mut model = ResourceModel::new("loop");
        model
            .add(Resource::new("a", ResourceKind::Cluster).with_reference("b"))
            .unwrap();
        model
            .add(Resource::new("b", ResourceKind::Cluster).with_reference("a"))
            .unwrap();

        let compiler = Compiler::new(CompilerSettings::default().with_validate_references(false));
        let err = compiler.compile(&model).unwrap_err();
        assert!(matches!(err, StackError::Plan(PlanError::CycleDetected { .. })));
        assert_eq!(err.resource_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_plan_changes() {
        let previous = network_and_cluster();
        let mut desired = network_and_cluster();
        desired
            .add(Resource::new("cluster-2", ResourceKind::Cluster).with_reference("vpc"))
            .unwrap();

        let changes = Compiler::default().plan_changes(&previous, &desired).unwrap();
        assert!(changes.teardown.is_empty());
        assert_eq!(changes.apply.batch_ids(), vec![vec!["cluster-2"]]);
    }
}
