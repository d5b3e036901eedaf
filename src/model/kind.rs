//! Resource kinds and their per-kind requirements.
//!
//! Every kind has a fixed set of required attribute keys and a set of
//! reference rules. Both are plain lookup tables: nothing here dispatches on
//! behaviour, the resolver just reads the rules back.

use serde::{Deserialize, Serialize};

/// Kind of an infrastructure resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Virtual network the cluster lives in.
    Network,
    /// Identity role assumed by tasks.
    Role,
    /// Container cluster.
    Cluster,
    /// Task definition (cpu, memory, roles).
    TaskDefinition,
    /// Container inside a task definition.
    Container,
    /// Load-balanced service running a task definition.
    Service,
    /// Autoscaling policy attached to a service.
    ScalingPolicy,
    /// Health check attached to a service.
    HealthCheck,
}

/// A constraint on how many resources of `target` a resource must reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRule {
    /// Kind of the referenced resources being counted.
    pub target: ResourceKind,
    /// Minimum number of references.
    pub min: usize,
    /// Maximum number of references (`None` = unbounded).
    pub max: Option<usize>,
}

const NO_RULES: &[ReferenceRule] = &[];

const CLUSTER_RULES: &[ReferenceRule] = &[ReferenceRule::exactly_one(ResourceKind::Network)];

const TASK_DEFINITION_RULES: &[ReferenceRule] = &[ReferenceRule {
    target: ResourceKind::Role,
    min: 1,
    max: None,
}];

const CONTAINER_RULES: &[ReferenceRule] =
    &[ReferenceRule::exactly_one(ResourceKind::TaskDefinition)];

const SERVICE_RULES: &[ReferenceRule] = &[
    ReferenceRule::exactly_one(ResourceKind::Cluster),
    ReferenceRule::exactly_one(ResourceKind::TaskDefinition),
];

const SERVICE_ATTACHMENT_RULES: &[ReferenceRule] =
    &[ReferenceRule::exactly_one(ResourceKind::Service)];

impl ResourceKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Network,
        Self::Role,
        Self::Cluster,
        Self::TaskDefinition,
        Self::Container,
        Self::Service,
        Self::ScalingPolicy,
        Self::HealthCheck,
    ];

    /// Attribute keys every resource of this kind must carry.
    #[must_use]
    pub const fn required_attributes(self) -> &'static [&'static str] {
        match self {
            Self::Network => &["max_zones"],
            Self::Role => &["assumed_by"],
            Self::Cluster | Self::Service => &[],
            Self::TaskDefinition => &["cpu", "memory_mib"],
            Self::Container => &["image"],
            Self::HealthCheck => &["path"],
            Self::ScalingPolicy => &["min_capacity", "max_capacity"],
        }
    }

    /// Reference rules checked once the whole model is known.
    #[must_use]
    pub const fn reference_rules(self) -> &'static [ReferenceRule] {
        match self {
            Self::Network | Self::Role => NO_RULES,
            Self::Cluster => CLUSTER_RULES,
            Self::TaskDefinition => TASK_DEFINITION_RULES,
            Self::Container => CONTAINER_RULES,
            Self::Service => SERVICE_RULES,
            Self::ScalingPolicy | Self::HealthCheck => SERVICE_ATTACHMENT_RULES,
        }
    }

    /// Stable snake_case name, as used in the IR.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Role => "role",
            Self::Cluster => "cluster",
            Self::TaskDefinition => "task_definition",
            Self::Container => "container",
            Self::Service => "service",
            Self::ScalingPolicy => "scaling_policy",
            Self::HealthCheck => "health_check",
        }
    }
}

impl ReferenceRule {
    /// Rule requiring exactly one reference to `target`.
    #[must_use]
    pub const fn exactly_one(target: ResourceKind) -> Self {
        Self {
            target,
            min: 1,
            max: Some(1),
        }
    }

    /// Returns true if `count` references satisfy this rule.
    #[must_use]
    pub const fn accepts(&self, count: usize) -> bool {
        if count < self.min {
            return false;
        }
        match self.max {
            Some(max) => count <= max,
            None => true,
        }
    }

    /// Describes the expected count, e.g. "exactly 1" or "at least 1".
    #[must_use]
    pub fn expectation(&self) -> String {
        match self.max {
            Some(max) if max == self.min => format!("exactly {max}"),
            Some(max) => format!("between {} and {max}", self.min),
            None => format!("at least {}", self.min),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_policy_requires_one_service() {
        let rules = ResourceKind::ScalingPolicy.reference_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].target, ResourceKind::Service);
        assert!(rules[0].accepts(1));
        assert!(!rules[0].accepts(0));
        assert!(!rules[0].accepts(2));
    }

    #[test]
    fn test_expectation_text() {
        assert_eq!(
            ReferenceRule::exactly_one(ResourceKind::Cluster).expectation(),
            "exactly 1"
        );
        assert_eq!(
            ResourceKind::TaskDefinition.reference_rules()[0].expectation(),
            "at least 1"
        );
    }

    #[test]
    fn test_kind_serde_matches_display() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
