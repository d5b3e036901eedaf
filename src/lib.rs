// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # stackplan
//!
//! A deterministic compiler from a declarative container-service topology to
//! an ordered, provider-neutral provisioning plan.
//!
//! ## Overview
//!
//! A [`ResourceModel`] declares resources (network, roles, cluster, task
//! definition, container, service, health check, scaling policy) and the
//! references between them. Compilation runs in three stages:
//!
//! 1. **Resolve**: references and `{{ref.<id>}}` attribute tokens become
//!    edges of a [`DependencyGraph`]; dangling and ill-formed references are
//!    rejected.
//! 2. **Plan**: the graph is ordered into batches of independent resources,
//!    dependencies first for apply and dependents first for teardown.
//! 3. **Emit**: the plan is serialized into a versioned JSON document with
//!    every reference token rewritten to the id it names.
//!
//! The same model always produces byte-identical output.
//!
//! ## Modules
//!
//! - [`model`]: Resource kinds, resources and the model container
//! - [`resolver`]: Reference resolution and the dependency graph
//! - [`planner`]: Batch ordering, model diffs and change plans
//! - [`emitter`]: IR document serialization
//! - [`compiler`]: The end-to-end pipeline
//! - [`blueprint`]: A ready-made load-balanced container service
//! - [`settings`]: Compiler settings from YAML and the environment
//! - [`output`]: Plan tables and JSON for display
//! - [`telemetry`]: Logging setup
//!
//! ## Example
//!
//! ```
//! use stackplan::{Compiler, ContainerServiceBlueprint};
//!
//! let model = ContainerServiceBlueprint::new("ecs-fargate").build()?;
//! let document = Compiler::default().compile(&model)?;
//!
//! assert!(document.as_str().starts_with(r#"{"version":1,"direction":"apply""#));
//! # Ok::<(), stackplan::StackError>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod blueprint;
pub mod compiler;
pub mod emitter;
pub mod error;
pub mod model;
pub mod output;
pub mod planner;
pub mod resolver;
pub mod settings;
pub mod telemetry;

// ============================================================================
// Re-exports
// ============================================================================

pub use blueprint::ContainerServiceBlueprint;
pub use compiler::Compiler;
pub use emitter::{emit, IrDocument, IrResource, PlanEmitter, SerializedDocument, IR_VERSION};
pub use error::{EmitError, ModelError, PlanError, ResolveError, Result, SettingsError, StackError};
pub use model::{Attributes, ModelHasher, ReferenceRule, Resource, ResourceKind, ResourceModel};
pub use output::{OutputFormat, PlanFormatter};
pub use planner::{
    build_plan, plan, plan_teardown, Batch, ChangePlan, DiffEngine, DiffResult, DiffType, Plan,
    PlanDirection, PlannedResource, ResourceDiff,
};
pub use resolver::{resolve, DependencyGraph, ReferenceResolver};
pub use settings::{CompilerSettings, SettingsLoader};
pub use telemetry::init_logging;
