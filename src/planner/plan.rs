//! Plan types.
//!
//! A [`Plan`] is an ordered list of [`Batch`]es. Resources inside a batch
//! have no dependency on each other and may be provisioned concurrently;
//! batches must run strictly one after another.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{Attributes, ResourceKind};

/// Whether a plan creates resources or tears them down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanDirection {
    /// Dependencies first.
    #[default]
    Apply,
    /// Dependents first.
    Teardown,
}

/// A resource scheduled in a batch, with its resolved dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedResource {
    /// Resource id.
    pub id: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Attributes as declared (reference tokens not yet rewritten).
    pub attributes: Attributes,
    /// Resolved dependency ids, sorted.
    pub depends_on: Vec<String>,
}

/// A set of resources with no dependencies among them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// Resources sorted by id.
    pub resources: Vec<PlannedResource>,
}

/// An ordered provisioning plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Direction the plan runs in.
    pub direction: PlanDirection,
    /// Batches in execution order.
    pub batches: Vec<Batch>,
}

impl Batch {
    /// Resource ids in this batch, in order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.id.as_str()).collect()
    }

    /// Number of resources in this batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Plan {
    /// Creates an empty plan.
    #[must_use]
    pub const fn empty(direction: PlanDirection) -> Self {
        Self {
            direction,
            batches: Vec::new(),
        }
    }

    /// Returns true if the plan schedules nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of batches.
    #[must_use]
    pub const fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Total number of scheduled resources.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    /// Size of the largest batch.
    #[must_use]
    pub fn max_parallelism(&self) -> usize {
        self.batches.iter().map(Batch::len).max().unwrap_or(0)
    }

    /// Batches as lists of ids.
    #[must_use]
    pub fn batch_ids(&self) -> Vec<Vec<&str>> {
        self.batches.iter().map(Batch::ids).collect()
    }

    /// Index of the batch that schedules `id`.
    #[must_use]
    pub fn batch_of(&self, id: &str) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.resources.iter().any(|r| r.id == id))
    }

    /// Keeps only the resources whose id is in `keep`, dropping empty batches.
    ///
    /// Relative order is preserved, so the result still respects every
    /// dependency between kept resources.
    #[must_use]
    pub fn retain_ids(&self, keep: &BTreeSet<String>) -> Self {
        let batches = self
            .batches
            .iter()
            .map(|batch| Batch {
                resources: batch
                    .resources
                    .iter()
                    .filter(|r| keep.contains(&r.id))
                    .cloned()
                    .collect(),
            })
            .filter(|batch| !batch.is_empty())
            .collect();

        Self {
            direction: self.direction,
            batches,
        }
    }
}

impl std::fmt::Display for PlanDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Apply => "apply",
            Self::Teardown => "teardown",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PlanDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apply" => Ok(Self::Apply),
            "teardown" | "destroy" => Ok(Self::Teardown),
            other => Err(format!("Invalid plan direction: {other}. Expected: apply or teardown")),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.batches.is_empty() {
            return write!(f, "Nothing to {}", self.direction);
        }

        writeln!(
            f,
            "{} plan ({} resources in {} batches):",
            self.direction,
            self.resource_count(),
            self.batches.len()
        )?;
        for (i, batch) in self.batches.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, batch.ids().join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(id: &str) -> PlannedResource {
        PlannedResource {
            id: id.to_string(),
            kind: ResourceKind::Cluster,
            attributes: Attributes::new(),
            depends_on: vec![],
        }
    }

    fn sample() -> Plan {
        Plan {
            direction: PlanDirection::Apply,
            batches: vec![
                Batch {
                    resources: vec![planned("A")],
                },
                Batch {
                    resources: vec![planned("B"), planned("C")],
                },
            ],
        }
    }

    #[test]
    fn test_counts() {
        let plan = sample();
        assert_eq!(plan.batch_count(), 2);
        assert_eq!(plan.resource_count(), 3);
        assert_eq!(plan.max_parallelism(), 2);
        assert_eq!(plan.batch_of("C"), Some(1));
        assert_eq!(plan.batch_of("Z"), None);
    }

    #[test]
    fn test_retain_drops_empty_batches() {
        let keep: BTreeSet<String> = ["C".to_string()].into();
        let filtered = sample().retain_ids(&keep);
        assert_eq!(filtered.batch_ids(), vec![vec!["C"]]);
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.starts_with("apply plan (3 resources in 2 batches):"));
        assert!(text.contains("2. B, C"));
        assert_eq!(Plan::empty(PlanDirection::Teardown).to_string(), "Nothing to teardown");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("Teardown".parse::<PlanDirection>(), Ok(PlanDirection::Teardown));
        assert_eq!("destroy".parse::<PlanDirection>(), Ok(PlanDirection::Teardown));
        assert!("sideways".parse::<PlanDirection>().is_err());
    }
}
