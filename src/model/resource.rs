//! Resource and resource model types.
//!
//! A [`ResourceModel`] is the compiler's input: a flat collection of
//! uniquely-identified [`Resource`]s. Construction validates ids and the
//! attributes required by each kind; references are only checked later by
//! the resolver, once every resource is known.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::ModelError;

use super::kind::ResourceKind;

/// Attribute map of a resource. Ordered by key so serialization is stable.
pub type Attributes = BTreeMap<String, Value>;

/// A single infrastructure resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Unique id within the model.
    pub id: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Opaque attributes. String values may embed `{{ref.<id>}}` tokens.
    #[serde(default)]
    pub attributes: Attributes,
    /// Ids of resources that must be provisioned before this one.
    #[serde(default)]
    pub references: Vec<String>,
}

/// A collection of resources to compile.
#[derive(Debug, Clone, Default)]
pub struct ResourceModel {
    /// Human-readable model name.
    name: String,
    /// Resources in insertion order.
    resources: Vec<Resource>,
    /// Position of each resource in `resources`, by id.
    index: HashMap<String, usize>,
}

impl Resource {
    /// Creates a resource with no attributes and no references.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
            attributes: Attributes::new(),
            references: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Adds a reference to another resource.
    #[must_use]
    pub fn with_reference(mut self, id: impl Into<String>) -> Self {
        self.references.push(id.into());
        self
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns the required attributes of this resource's kind that are absent.
    #[must_use]
    pub fn missing_attributes(&self) -> Vec<String> {
        self.kind
            .required_attributes()
            .iter()
            .filter(|key| !self.attributes.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect()
    }
}

impl ResourceModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds a resource built from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty, padded with whitespace or already
    /// present, or if an attribute required by `kind` is missing.
    pub fn add_resource(
        &mut self,
        id: impl Into<String>,
        kind: ResourceKind,
        attributes: Attributes,
        references: Vec<String>,
    ) -> Result<(), ModelError> {
        self.add(Resource {
            id: id.into(),
            kind,
            attributes,
            references,
        })
    }

    /// Adds a fully-built resource.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceModel::add_resource`].
    pub fn add(&mut self, resource: Resource) -> Result<(), ModelError> {
        if resource.id.trim().is_empty() {
            return Err(ModelError::EmptyId);
        }
        if resource.id.trim() != resource.id {
            return Err(ModelError::PaddedId { id: resource.id });
        }
        if self.index.contains_key(&resource.id) {
            return Err(ModelError::DuplicateId { id: resource.id });
        }

        let missing = resource.missing_attributes();
        if !missing.is_empty() {
            return Err(ModelError::InvalidAttributes {
                id: resource.id,
                kind: resource.kind,
                missing,
            });
        }

        debug!("Adding {} resource '{}'", resource.kind, resource.id);
        self.index.insert(resource.id.clone(), self.resources.len());
        self.resources.push(resource);
        Ok(())
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a resource by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.index.get(id).map(|&i| &self.resources[i])
    }

    /// Returns true if a resource with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of resources.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the model has no resources.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterates over resources in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Returns resources sorted by id.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Resource> {
        let mut sorted: Vec<&Resource> = self.resources.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        sorted
    }
}
