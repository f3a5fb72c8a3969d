//! Conflict detection and resolution over a dependency graph.
//!
//! Direct conflicts drop the lower-priority agent. Capability overlaps only
//! produce a warning: both agents stay and a human decides.

use crate::graph::DependencyGraph;
use crate::resolution::{ResolutionWarning, WarningKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ---------------------------------------------------------------------------
// ConflictRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictRecord {
    Direct {
        agent_a: String,
        agent_b: String,
    },
    CapabilityOverlap {
        agent_a: String,
        agent_b: String,
        shared: BTreeSet<String>,
    },
}

impl ConflictRecord {
    pub fn agents(&self) -> (&str, &str) {
        match self {
            ConflictRecord::Direct { agent_a, agent_b }
            | ConflictRecord::CapabilityOverlap {
                agent_a, agent_b, ..
            } => (agent_a.as_str(), agent_b.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Scan the graph for direct conflicts, then for capability overlaps.
///
/// A pair that declares the conflict in both directions yields two direct
/// records; overlaps are reported once per unordered pair.
pub fn detect(graph: &DependencyGraph) -> Vec<ConflictRecord> {
    let mut records = Vec::new();

    for node in graph.iter() {
        for other in &node.conflicts {
            if graph.contains(other) {
                records.push(ConflictRecord::Direct {
                    agent_a: node.id.clone(),
                    agent_b: other.clone(),
                });
            }
        }
    }

    let nodes: Vec<_> = graph.iter().collect();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let shared: BTreeSet<String> = a.provides.intersection(&b.provides).cloned().collect();
            if !shared.is_empty() {
                records.push(ConflictRecord::CapabilityOverlap {
                    agent_a: a.id.clone(),
                    agent_b: b.id.clone(),
                    shared,
                });
            }
        }
    }

    tracing::debug!(count = records.len(), "conflict detection complete");
    records
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Agents dropped from the graph, in removal order.
    pub removed: Vec<String>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Apply `conflicts` to `graph` in detection order.
///
/// Records naming an agent that is no longer in the graph are treated as
/// already resolved. Dependents of a dropped agent are left in place; the
/// caller decides what to do with the dangling requirement.
pub fn resolve(conflicts: &[ConflictRecord], graph: &mut DependencyGraph) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen: HashSet<String> = HashSet::new();

    for record in conflicts {
        let (a, b) = record.agents();
        if !graph.contains(a) || !graph.contains(b) {
            continue;
        }

        let warning = match record {
            ConflictRecord::Direct { agent_a, agent_b } => {
                let (keep, drop) = pick_winner(graph, agent_a, agent_b);
                graph.remove(&drop);
                tracing::warn!(kept = %keep, dropped = %drop, "direct conflict resolved");
                resolution.removed.push(drop.clone());
                ResolutionWarning::new(
                    WarningKind::ConflictResolved,
                    format!("'{drop}' conflicts with '{keep}'; dropped '{drop}', kept '{keep}'"),
                )
            }
            ConflictRecord::CapabilityOverlap {
                agent_a,
                agent_b,
                shared,
            } => {
                let tags: Vec<&str> = shared.iter().map(String::as_str).collect();
                ResolutionWarning::new(
                    WarningKind::CapabilityOverlap,
                    format!(
                        "'{agent_a}' and '{agent_b}' both provide {}; keeping both",
                        tags.join(", ")
                    ),
                )
            }
        };

        if seen.insert(warning.message.clone()) {
            resolution.warnings.push(warning);
        }
    }

    resolution
}

/// Higher priority wins; ties keep the lexicographically earlier id.
fn pick_winner(graph: &DependencyGraph, a: &str, b: &str) -> (String, String) {
    let pa = graph.get(a).map(|n| n.priority).unwrap_or_default();
    let pb = graph.get(b).map(|n| n.priority).unwrap_or_default();
    let a_wins = pa > pb || (pa == pb && a < b);
    if a_wins {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
