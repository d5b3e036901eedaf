//! Resource hashing for change detection.
//!
//! Hashes are computed over a canonical byte stream (kind, attributes sorted
//! by key, references sorted and deduplicated) so two resources that mean
//! the same thing hash the same regardless of how they were built.

use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use super::resource::{Resource, ResourceModel};

/// Hasher for computing resource and model hashes.
#[derive(Debug, Default)]
pub struct ModelHasher;

impl ModelHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a hash of the whole model.
    ///
    /// Resources are hashed in id order, so insertion order does not matter.
    #[must_use]
    pub fn hash_model(&self, model: &ResourceModel) -> String {
        let mut hasher = Sha256::new();

        for resource in model.sorted() {
            hasher.update(resource.id.as_bytes());
            hasher.update([0u8]);
            hasher.update(self.hash_resource(resource).as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a hash for a single resource.
    ///
    /// The id is part of the hash; renaming a resource is a delete plus a create.
    #[must_use]
    pub fn hash_resource(&self, resource: &Resource) -> String {
        let mut hasher = Sha256::new();

        hasher.update(resource.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(resource.kind.as_str().as_bytes());
        hasher.update([0u8]);

        // BTreeMap iteration is already key-ordered
        for (key, value) in &resource.attributes {
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.to_string().as_bytes());
            hasher.update([0u8]);
        }

        let references: BTreeSet<&str> = resource.references.iter().map(String::as_str).collect();
        for reference in references {
            hasher.update([b'>']);
            hasher.update(reference.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;

    fn role(id: &str) -> Resource {
        Resource::new(id, ResourceKind::Role).with_attribute("assumed_by", "ecs-tasks.amazonaws.com")
    }

    #[test]
    fn test_resource_hash_deterministic() {
        let hasher = ModelHasher::new();
        let resource = role("task-role");

        assert_eq!(hasher.hash_resource(&resource), hasher.hash_resource(&resource));
        assert_eq!(hasher.hash_resource(&resource).len(), 64);
    }

    #[test]
    fn test_attribute_change_changes_hash() {
        let hasher = ModelHasher::new();
        let before = role("task-role");
        let after = role("task-role").with_attribute("assumed_by", "lambda.amazonaws.com");

        assert_ne!(hasher.hash_resource(&before), hasher.hash_resource(&after));
    }

    #[test]
    fn test_reference_order_does_not_matter() {
        let hasher = ModelHasher::new();
        let a = Resource::new("svc", ResourceKind::Service)
            .with_reference("cluster")
            .with_reference("task");
        let b = Resource::new("svc", ResourceKind::Service)
            .with_reference("task")
            .with_reference("cluster")
            .with_reference("task");

        assert_eq!(hasher.hash_resource(&a), hasher.hash_resource(&b));
    }

    #[test]
    fn test_model_hash_ignores_insertion_order() {
        let hasher = ModelHasher::new();
        let mut first = ResourceModel::new("m");
        first.add(role("a")).unwrap();
        first.add(role("b")).unwrap();
        let mut second = ResourceModel::new("m");
        second.add(role("b")).unwrap();
        second.add(role("a")).unwrap();

        assert_eq!(hasher.hash_model(&first), hasher.hash_model(&second));
    }

    #[test]
    fn test_short_hash() {
        let hasher = ModelHasher::new();
        assert_eq!(hasher.short_hash("abcdef1234567890"), "abcdef12");
    }
}
