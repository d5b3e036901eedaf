//! Plan emission.
//!
//! Serializes a [`Plan`] into the provider-neutral IR consumed by
//! provisioning executors:
//!
//! ```json
//! {
//!   "version": 1,
//!   "direction": "apply",
//!   "batches": [[{ "id": "vpc", "kind": "network", "attributes": {}, "depends_on": [] }]]
//! }
//! ```
//!
//! Reference tokens in attributes are rewritten to the ids they resolve to,
//! so no placeholder survives into the document. Attribute maps are ordered
//! by key, which keeps the output byte-identical across runs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::EmitError;
use crate::model::{Attributes, ResourceKind};
use crate::planner::{Plan, PlanDirection, PlannedResource};
use crate::resolver::rewrite_references;

/// Current version of the IR schema.
pub const IR_VERSION: u32 = 1;

/// The IR document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IrDocument {
    /// Schema version.
    pub version: u32,
    /// Direction the batches run in.
    pub direction: PlanDirection,
    /// Batches in execution order.
    pub batches: Vec<Vec<IrResource>>,
}

/// A resource entry in the IR.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IrResource {
    /// Resource id.
    pub id: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Attributes with reference tokens rewritten to ids.
    pub attributes: Attributes,
    /// Ids that must be provisioned first, sorted.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A serialized IR document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedDocument {
    /// The JSON text.
    json: String,
}

/// Serializes a plan as compact JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn emit(plan: &Plan) -> Result<SerializedDocument, EmitError> {
    PlanEmitter::new().emit(plan)
}

/// Emitter for IR documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanEmitter {
    /// Whether to pretty-print the JSON.
    pretty: bool,
}

impl PlanEmitter {
    /// Creates an emitter producing compact JSON.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Enables or disables pretty-printed output.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Serializes a plan.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn emit(&self, plan: &Plan) -> Result<SerializedDocument, EmitError> {
        let document = IrDocument::from_plan(plan);
        let json = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        }
        .map_err(|e| EmitError::serialization(e.to_string()))?;

        debug!(
            "Emitted IR v{IR_VERSION}: {} batches, {} bytes",
            document.batches.len(),
            json.len()
        );
        Ok(SerializedDocument { json })
    }
}

impl IrDocument {
    /// Builds the IR for a plan.
    #[must_use]
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            version: IR_VERSION,
            direction: plan.direction,
            batches: plan
                .batches
                .iter()
                .map(|batch| batch.resources.iter().map(IrResource::from).collect())
                .collect(),
        }
    }

    /// Parses an IR document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the version is unsupported.
    pub fn parse(json: &str) -> Result<Self, EmitError> {
        let document: Self =
            serde_json::from_str(json).map_err(|e| EmitError::serialization(e.to_string()))?;

        if document.version != IR_VERSION {
            return Err(EmitError::UnsupportedVersion {
                expected: IR_VERSION,
                found: document.version,
            });
        }
        Ok(document)
    }

    /// Batches as lists of ids.
    #[must_use]
    pub fn batch_ids(&self) -> Vec<Vec<&str>> {
        self.batches
            .iter()
            .map(|batch| batch.iter().map(|r| r.id.as_str()).collect())
            .collect()
    }

    /// Renders the document as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, EmitError> {
        serde_yaml::to_string(self).map_err(|e| EmitError::serialization(e.to_string()))
    }
}

impl From<&PlannedResource> for IrResource {
    fn from(resource: &PlannedResource) -> Self {
        Self {
            id: resource.id.clone(),
            kind: resource.kind,
            attributes: resource
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), rewrite_references(value)))
                .collect(),
            depends_on: resource.depends_on.clone(),
        }
    }
}

impl SerializedDocument {
    /// The JSON text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// The JSON bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }

    /// Consumes the document, returning the JSON text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.json
    }

    /// SHA-256 of the document bytes, hex-encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.json.as_bytes()))
    }

    /// Parses the document back into its structured form.
    ///
    /// # Errors
    ///
    /// See [`IrDocument::parse`].
    pub fn parse(&self) -> Result<IrDocument, EmitError> {
        IrDocument::parse(&self.json)
    }
}

impl std::fmt::Display for SerializedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Batch;
    use serde_json::json;

    fn sample_plan() -> Plan {
        let mut attributes = Attributes::new();
        attributes.insert("execution_role".to_string(), json!("{{ref.exec-role}}"));
        attributes.insert("cpu".to_string(), json!(512));
        Plan {
            direction: PlanDirection::Apply,
            batches: vec![Batch {
                resources: vec![PlannedResource {
                    id: "task".to_string(),
                    kind: ResourceKind::TaskDefinition,
                    attributes,
                    depends_on: vec!["exec-role".to_string()],
                }],
            }],
        }
    }

    #[test]
    fn test_emit_shape() {
        let document = emit(&sample_plan()).unwrap();
        assert_eq!(
            document.as_str(),
            r#"{"version":1,"direction":"apply","batches":[[{"id":"task","kind":"task_definition","attributes":{"cpu":512,"execution_role":"exec-role"},"depends_on":["exec-role"]}]]}"#
        );
    }

    #[test]
    fn test_no_placeholders_survive() {
        let document = emit(&sample_plan()).unwrap();
        assert!(!document.as_str().contains("{{"));
    }

    #[test]
    fn test_parse_back() {
        let document = PlanEmitter::new().with_pretty(true).emit(&sample_plan()).unwrap();
        let parsed = document.parse().unwrap();
        assert_eq!(parsed.version, IR_VERSION);
        assert_eq!(parsed.batch_ids(), vec![vec!["task"]]);
        assert_eq!(parsed, IrDocument::from_plan(&sample_plan()));
    }

    #[test]
    fn test_unsupported_version() {
        let err = IrDocument::parse(r#"{"version":7,"direction":"apply","batches":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            EmitError::UnsupportedVersion {
                expected: 1,
                found: 7
            }
        ));
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = emit(&sample_plan()).unwrap();
        let b = emit(&sample_plan()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_yaml_rendering() {
        let yaml = IrDocument::from_plan(&sample_plan()).to_yaml().unwrap();
        assert!(yaml.contains("kind: task_definition"));
        assert!(yaml.contains("execution_role: exec-role"));
    }
}
