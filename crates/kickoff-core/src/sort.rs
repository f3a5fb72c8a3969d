//! Depth-first topological ordering of a dependency graph.

use crate::error::{KickoffError, Result};
use crate::graph::DependencyGraph;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Order `graph` so every agent comes after the agents it requires.
///
/// Roots are taken in graph insertion order and requirements in their sorted
/// order, so the output is a pure function of the graph. Requirements that
/// are not graph nodes are ignored. A back-edge into an in-progress node
/// fails with [`KickoffError::CircularDependency`] naming that node; no
/// partial order is ever returned.
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
    let mut ordered = Vec::with_capacity(graph.len());

    for id in graph.ids() {
        visit(graph, id, &mut marks, &mut ordered)?;
    }

    Ok(ordered)
}

fn visit<'g>(
    graph: &'g DependencyGraph,
    id: &'g str,
    marks: &mut HashMap<&'g str, Mark>,
    ordered: &mut Vec<String>,
) -> Result<()> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            return Err(KickoffError::CircularDependency(id.to_string()));
        }
        None => {}
    }

    let Some(node) = graph.get(id) else {
        return Ok(());
    };

    marks.insert(id, Mark::InProgress);
    for dep in &node.requires {
        if graph.contains(dep) {
            visit(graph, dep.as_str(), marks, ordered)?;
        }
    }
    marks.insert(id, Mark::Done);
    ordered.push(id.to_string());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
