//! Resource model for the topology compiler.
//!
//! This module holds the compiler's input types:
//! - Resource kinds and their required attributes and reference rules
//! - Resources and the model that collects them
//! - Content hashing used for change detection

mod hash;
mod kind;
mod resource;

pub use hash::ModelHasher;
pub use kind::{ReferenceRule, ResourceKind};
pub use resource::{Attributes, Resource, ResourceModel};
