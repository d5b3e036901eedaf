//! Topological planning.
//!
//! Batched Kahn's algorithm: every node whose remaining in-degree is zero
//! goes into the next batch, then its edges are removed. Batches are sorted
//! by id. When the residual graph stalls, a depth-first search for a
//! back-edge pins down the ids on a cycle.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::error::PlanError;
use crate::resolver::DependencyGraph;

use super::plan::{Batch, Plan, PlanDirection, PlannedResource};

type Adjacency = BTreeMap<String, BTreeSet<String>>;

/// Produces the apply plan: every resource after all of its dependencies.
///
/// # Errors
///
/// Returns [`PlanError::CycleDetected`] if the graph has a cycle.
pub fn plan(graph: &DependencyGraph) -> Result<Plan, PlanError> {
    build_plan(graph, PlanDirection::Apply)
}

/// Produces the teardown plan: every resource after all of its dependents.
///
/// # Errors
///
/// Returns [`PlanError::CycleDetected`] if the graph has a cycle.
pub fn plan_teardown(graph: &DependencyGraph) -> Result<Plan, PlanError> {
    build_plan(graph, PlanDirection::Teardown)
}

/// Produces a plan in the given direction.
///
/// # Errors
///
/// Returns [`PlanError::CycleDetected`] if the graph has a cycle.
pub fn build_plan(graph: &DependencyGraph, direction: PlanDirection) -> Result<Plan, PlanError> {
    // `blockers[n]` must be done before `n`; `releases[n]` are waiting on `n`.
    let (blockers, releases) = match direction {
        PlanDirection::Apply => (graph.dependency_map(), graph.dependent_map()),
        PlanDirection::Teardown => (graph.dependent_map(), graph.dependency_map()),
    };

    let mut remaining: BTreeMap<&str, usize> = blockers
        .iter()
        .map(|(id, waits_on)| (id.as_str(), waits_on.len()))
        .collect();

    let mut ready: Vec<&str> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut batches = Vec::new();
    while !ready.is_empty() {
        for id in &ready {
            remaining.remove(id);
        }

        let mut next: BTreeSet<&str> = BTreeSet::new();
        for id in &ready {
            let Some(waiting) = releases.get(*id) else {
                continue;
            };
            for follower in waiting {
                if let Some(count) = remaining.get_mut(follower.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        next.insert(follower.as_str());
                    }
                }
            }
        }

        debug!("Batch {}: {}", batches.len() + 1, ready.join(", "));
        batches.push(make_batch(graph, &ready));
        ready = next.into_iter().collect();
    }

    if !remaining.is_empty() {
        let residual: BTreeSet<&str> = remaining.keys().copied().collect();
        let involved_ids = find_cycle(blockers, &residual);
        return Err(PlanError::CycleDetected { involved_ids });
    }

    info!(
        "Planned {direction}: {} resources in {} batches",
        graph.len(),
        batches.len()
    );
    Ok(Plan { direction, batches })
}

fn make_batch(graph: &DependencyGraph, ids: &[&str]) -> Batch {
    let resources = ids
        .iter()
        .filter_map(|id| graph.resource(id))
        .map(|resource| PlannedResource {
            id: resource.id.clone(),
            kind: resource.kind,
            attributes: resource.attributes.clone(),
            depends_on: graph
                .dependencies_of(&resource.id)
                .map(|deps| deps.iter().cloned().collect())
                .unwrap_or_default(),
        })
        .collect();
    Batch { resources }
}

/// Finds a cycle among the residual nodes, returning its ids sorted.
///
/// Every residual node still waits on another residual node, so a walk from
/// any of them must close a loop.
fn find_cycle(edges: &Adjacency, residual: &BTreeSet<&str>) -> Vec<String> {
    let mut visited = BTreeSet::new();

    for start in residual {
        if visited.contains(start) {
            continue;
        }
        if let Some(mut cycle) = walk(*start, edges, residual, &mut visited) {
            cycle.sort();
            return cycle;
        }
    }

    residual.iter().map(ToString::to_string).collect()
}

type Neighbours<'a> = std::iter::Flatten<std::option::IntoIter<&'a BTreeSet<String>>>;

fn neighbours<'a>(edges: &'a Adjacency, node: &str) -> Neighbours<'a> {
    edges.get(node).into_iter().flatten()
}

/// Depth-first walk with an explicit frame stack.
///
/// `on_path` maps every node on the current path to its index in `path`, so
/// a back-edge yields the cycle slice directly.
fn walk<'a>(
    start: &'a str,
    edges: &'a Adjacency,
    residual: &BTreeSet<&str>,
    visited: &mut BTreeSet<&'a str>,
) -> Option<Vec<String>> {
    let mut path: Vec<&'a str> = vec![start];
    let mut frames: Vec<Neighbours<'a>> = vec![neighbours(edges, start)];
    let mut on_path: BTreeMap<&'a str, usize> = BTreeMap::from([(start, 0)]);
    visited.insert(start);

    while let Some(frame) = frames.last_mut() {
        let Some(next) = frame.next() else {
            frames.pop();
            if let Some(done) = path.pop() {
                on_path.remove(done);
            }
            continue;
        };

        let next = next.as_str();
        if !residual.contains(next) {
            continue;
        }
        if let Some(&index) = on_path.get(next) {
            return Some(path[index..].iter().map(ToString::to_string).collect());
        }
        if visited.insert(next) {
            on_path.insert(next, path.len());
            path.push(next);
            frames.push(neighbours(edges, next));
        }
    }

    None
}
