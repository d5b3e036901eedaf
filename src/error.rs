//! Error types for the stackplan compiler.
//!
//! Each compilation stage has its own error enum: model construction,
//! reference resolution, planning, emission, and settings loading. They are
//! aggregated into [`StackError`] so callers can use a single `Result` type
//! across the whole pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ResourceKind;

/// The main error type for the stackplan compiler.
#[derive(Debug, Error)]
pub enum StackError {
    /// Resource model construction errors.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Reference resolution errors.
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IR emission errors.
    #[error("Emit error: {0}")]
    Emit(#[from] EmitError),

    /// Settings loading errors.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Errors raised while building a resource model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A resource with this id already exists in the model.
    #[error("Duplicate resource id: {id}")]
    DuplicateId {
        /// The duplicated id.
        id: String,
    },

    /// The resource id is empty or whitespace.
    #[error("Resource id must not be empty")]
    EmptyId,

    /// The resource id has leading or trailing whitespace.
    #[error("Resource id '{id}' must not start or end with whitespace")]
    PaddedId {
        /// The rejected id.
        id: String,
    },

    /// The resource is missing attributes required by its kind.
    #[error("Resource '{id}' ({kind}) is missing required attributes: {}", missing.join(", "))]
    InvalidAttributes {
        /// Offending resource id.
        id: String,
        /// Kind of the resource.
        kind: ResourceKind,
        /// Names of the missing attributes.
        missing: Vec<String>,
    },
}

/// Errors raised while resolving references into a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A resource references an id that is not in the model.
    #[error("Resource '{from}' references unknown resource '{to}'")]
    DanglingReference {
        /// The referencing resource.
        from: String,
        /// The missing target id.
        to: String,
    },

    /// A resource references the wrong number of resources of some kind.
    #[error("Resource '{id}' ({kind}) must reference {expected} {target_kind}, found {found}")]
    InvalidReferences {
        /// Offending resource id.
        id: String,
        /// Kind of the offending resource.
        kind: ResourceKind,
        /// Kind of the referenced resources being counted.
        target_kind: ResourceKind,
        /// Human-readable expectation (e.g. "exactly 1").
        expected: String,
        /// Number of references found.
        found: usize,
    },
}

/// Errors raised while ordering the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The dependency graph contains a cycle.
    #[error("Dependency cycle detected involving: {}", involved_ids.join(", "))]
    CycleDetected {
        /// Ids on the detected cycle, sorted.
        involved_ids: Vec<String>,
    },
}

/// Errors raised while serializing or parsing the IR document.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The document declares a schema version this crate does not understand.
    #[error("Unsupported IR version: expected {expected}, found {found}")]
    UnsupportedVersion {
        /// The version this crate emits.
        expected: u32,
        /// The version found in the document.
        found: u32,
    },

    /// JSON or YAML (de)serialization failed.
    #[error("IR serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },
}

/// Errors raised while loading compiler settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file was not found.
    #[error("Settings file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The settings file could not be read or parsed.
    #[error("Failed to parse settings: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// An environment override holds a value that cannot be used.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvValue {
        /// Name of the environment variable.
        name: String,
        /// The rejected value.
        value: String,
    },
}

/// Result type alias for stackplan operations.
pub type Result<T> = std::result::Result<T, StackError>;

impl StackError {
    /// Returns the resource ids this error is about, if any.
    ///
    /// Lets callers point at the offending part of their model without
    /// matching on every stage's error type.
    #[must_use]
    pub fn resource_ids(&self) -> Vec<&str> {
        match self {
            Self::Model(
                ModelError::DuplicateId { id }
                | ModelError::PaddedId { id }
                | ModelError::InvalidAttributes { id, .. },
            )
            | Self::Resolve(ResolveError::InvalidReferences { id, .. }) => vec![id.as_str()],
            Self::Resolve(ResolveError::DanglingReference { from, to }) => {
                vec![from.as_str(), to.as_str()]
            }
            Self::Plan(PlanError::CycleDetected { involved_ids }) => {
                involved_ids.iter().map(String::as_str).collect()
            }
            Self::Model(ModelError::EmptyId) | Self::Emit(_) | Self::Settings(_) => vec![],
        }
    }
}

impl EmitError {
    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_ids() {
        let err = PlanError::CycleDetected {
            involved_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Dependency cycle detected involving: a, b");
    }

    #[test]
    fn test_resource_ids_for_dangling_reference() {
        let err = StackError::from(ResolveError::DanglingReference {
            from: "svc".to_string(),
            to: "ghost".to_string(),
        });
        assert_eq!(err.resource_ids(), vec!["svc", "ghost"]);
    }

    #[test]
    fn test_invalid_attributes_message() {
        let err = ModelError::InvalidAttributes {
            id: "task".to_string(),
            kind: ResourceKind::TaskDefinition,
            missing: vec!["cpu".to_string(), "memory_mib".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Resource 'task' (task_definition) is missing required attributes: cpu, memory_mib"
        );
    }
}
