//! Dependency graph of agents, closed under `requires`.
//!
//! Nodes keep their insertion order. The sorter and conflict detector iterate
//! in that order, which is what makes resolution output reproducible.

use crate::catalog::{AgentDescriptor, Catalog};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    order: Vec<String>,
    nodes: HashMap<String, AgentDescriptor>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Returns false (and leaves the graph untouched) when a
    /// node with the same id already exists.
    pub fn insert(&mut self, descriptor: AgentDescriptor) -> bool {
        if self.nodes.contains_key(&descriptor.id) {
            return false;
        }
        self.order.push(descriptor.id.clone());
        self.nodes.insert(descriptor.id.clone(), descriptor);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<AgentDescriptor> {
        let removed = self.nodes.remove(id)?;
        self.order.retain(|n| n != id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&AgentDescriptor> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// `(node, missing_requirement)` pairs, in node order then requirement
    /// order. Empty for a closed graph.
    pub fn dangling_requirements(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for node in self.iter() {
            for dep in &node.requires {
                if !self.contains(dep) {
                    dangling.push((node.id.clone(), dep.clone()));
                }
            }
        }
        dangling
    }

    pub fn is_closed(&self) -> bool {
        self.dangling_requirements().is_empty()
    }

    /// Point every `requires` edge at `from` to `to` instead. Returns the ids
    /// of the nodes that were rewired.
    pub fn replace_requirement(&mut self, from: &str, to: &str) -> Vec<String> {
        let mut rewired = Vec::new();
        for id in &self.order {
            if id == to {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(id) {
                if node.requires.remove(from) {
                    node.requires.insert(to.to_string());
                    rewired.push(id.clone());
                }
            }
        }
        rewired
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

pub struct GraphBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Build a closed graph from the requested ids.
    pub fn build(&self, requested: &[String]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        self.extend(&mut graph, requested);
        graph
    }

    /// Pull `ids` and everything they transitively require into `graph`.
    /// Nodes already present are not revisited.
    pub fn extend(&self, graph: &mut DependencyGraph, ids: &[String]) {
        for id in ids {
            self.visit(graph, id);
        }
    }

    // Pre-order: a node lands in the graph before its requirements, and its
    // presence doubles as the visited mark so self-references and cycles
    // terminate.
    fn visit(&self, graph: &mut DependencyGraph, id: &str) {
        if graph.contains(id) {
            return;
        }
        let descriptor = match self.catalog.lookup(id) {
            Some(d) => d.clone(),
            None => {
                tracing::debug!(agent = id, "agent not in catalog, treating as leaf");
                AgentDescriptor::leaf(id)
            }
        };
        let requires: Vec<String> = descriptor.requires.iter().cloned().collect();
        graph.insert(descriptor);
        for dep in &requires {
            self.visit(graph, dep);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
