use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::relationships::{ColumnRef, FkLookup};
use crate::schema::{Reference, SchemaCatalog};

/// Summary of FK graph structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySummary {
    pub nodes: usize,
    /// Distinct parent -> child edges before cycle breaking.
    pub edges: usize,
}

/// Parent -> child dependency between two distinct tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub parent: String,
    pub child: String,
}

/// Generation order for a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyOrder {
    pub summary: DependencySummary,
    /// Every catalog table, parents before children.
    pub order: Vec<String>,
    /// Edges dropped to break cycles, in removal order.
    pub removed_edges: Vec<DependencyEdge>,
    /// Foreign-key columns pointing back at their own table.
    pub self_references: Vec<ColumnRef>,
    /// Attribute-reference parents that could not be placed before their
    /// child without closing a cycle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unordered_attribute_edges: Vec<DependencyEdge>,
}

impl DependencyOrder {
    pub fn position(&self, table: &str) -> Option<usize> {
        self.order.iter().position(|name| name == table)
    }

    pub fn is_removed(&self, parent: &str, child: &str) -> bool {
        self.removed_edges
            .iter()
            .any(|edge| edge.parent == parent && edge.child == child)
    }

    pub fn has_cycles(&self) -> bool {
        !self.removed_edges.is_empty()
    }
}

/// Order catalog tables so every foreign-key parent precedes its children.
///
/// Self-references are kept out of the graph and reported separately. Cycles
/// between distinct tables are broken by repeatedly dropping the cycle edge
/// whose child name sorts first (parent name breaks ties). Among tables that
/// are ready at the same time the smallest name goes first.
pub fn order_tables(catalog: &SchemaCatalog, fk_lookup: &FkLookup) -> DependencyOrder {
    order_tables_with_attributes(catalog, fk_lookup, &[])
}

/// [`order_tables`], additionally placing the parent of every attribute
/// reference before its child where that is possible.
///
/// Attribute links never override foreign-key edges: they are added only after
/// foreign-key cycles are broken, in `(child, parent)` name order, and a link
/// that would close a cycle is left out and listed in
/// `unordered_attribute_edges`.
pub fn order_tables_with_attributes(
    catalog: &SchemaCatalog,
    fk_lookup: &FkLookup,
    attribute_refs: &[Reference],
) -> DependencyOrder {
    let mut graph = TableGraph::new(catalog.table_names());
    let mut self_references = Vec::new();

    for (child, parent) in fk_lookup.iter() {
        if child.table == parent.table {
            if graph.node(&child.table).is_some() {
                self_references.push(child.clone());
            }
            continue;
        }
        match (graph.node(&parent.table), graph.node(&child.table)) {
            (Some(parent_id), Some(child_id)) => graph.add_edge(parent_id, child_id),
            _ => debug!(child = %child, parent = %parent, "foreign key outside catalog, ignoring"),
        }
    }

    let summary = DependencySummary {
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
    };

    let mut removed_edges = Vec::new();
    while let Some((parent_id, child_id)) = graph.next_cycle_edge() {
        graph.edges.remove(&(parent_id, child_id));
        let edge = DependencyEdge {
            parent: graph.nodes[parent_id].clone(),
            child: graph.nodes[child_id].clone(),
        };
        warn!(parent = %edge.parent, child = %edge.child, "breaking foreign key cycle");
        removed_edges.push(edge);
    }

    let mut preferences = BTreeSet::new();
    for reference in attribute_refs {
        if reference.is_self_reference() {
            continue;
        }
        if let (Some(parent_id), Some(child_id)) = (
            graph.node(&reference.target_table),
            graph.node(&reference.source_table),
        ) {
            preferences.insert((
                reference.source_table.as_str(),
                reference.target_table.as_str(),
                parent_id,
                child_id,
            ));
        }
    }

    let mut unordered_attribute_edges = Vec::new();
    for (child, parent, parent_id, child_id) in preferences {
        if graph.edges.contains(&(parent_id, child_id)) {
            continue;
        }
        if graph.reaches(child_id, parent_id) {
            debug!(parent, child, "attribute link would close a cycle, not ordering it");
            unordered_attribute_edges.push(DependencyEdge {
                parent: parent.to_string(),
                child: child.to_string(),
            });
            continue;
        }
        graph.add_edge(parent_id, child_id);
    }

    let order = graph.toposort();
    debug!(order = ?order, "dependency order resolved");

    DependencyOrder {
        summary,
        order,
        removed_edges,
        self_references,
        unordered_attribute_edges,
    }
}

/// Arena of table names plus a parent -> child edge set over their indices.
#[derive(Debug)]
struct TableGraph {
    nodes: Vec<String>,
    index: BTreeMap<String, usize>,
    edges: BTreeSet<(usize, usize)>,
}

impl TableGraph {
    fn new(names: Vec<&str>) -> Self {
        let mut nodes = Vec::with_capacity(names.len());
        let mut index = BTreeMap::new();
        for name in names {
            if !index.contains_key(name) {
                index.insert(name.to_string(), nodes.len());
                nodes.push(name.to_string());
            }
        }
        Self {
            nodes,
            index,
            edges: BTreeSet::new(),
        }
    }

    fn node(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn add_edge(&mut self, parent: usize, child: usize) {
        self.edges.insert((parent, child));
    }

    fn adjacency(&self, reversed: bool) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for &(parent, child) in &self.edges {
            if reversed {
                adjacency[child].push(parent);
            } else {
                adjacency[parent].push(child);
            }
        }
        adjacency
    }

    /// Whether `to` is reachable from `from` along parent -> child edges.
    fn reaches(&self, from: usize, to: usize) -> bool {
        let forward = self.adjacency(false);
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if std::mem::replace(&mut seen[node], true) {
                continue;
            }
            stack.extend(forward[node].iter().copied());
        }
        false
    }

    /// Cycle edge with the smallest `(child name, parent name)`, if any.
    fn next_cycle_edge(&self) -> Option<(usize, usize)> {
        let components = self.strongly_connected_components();
        self.edges
            .iter()
            .filter(|(parent, child)| components[*parent] == components[*child])
            .min_by(|a, b| {
                (&self.nodes[a.1], &self.nodes[a.0]).cmp(&(&self.nodes[b.1], &self.nodes[b.0]))
            })
            .copied()
    }

    /// Component id per node (Kosaraju, iterative).
    fn strongly_connected_components(&self) -> Vec<usize> {
        let n = self.nodes.len();
        let forward = self.adjacency(false);
        let backward = self.adjacency(true);

        let mut finished = Vec::with_capacity(n);
        let mut seen = vec![false; n];
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![(start, 0_usize)];
            while let Some((node, next)) = stack.pop() {
                if let Some(&target) = forward[node].get(next) {
                    stack.push((node, next + 1));
                    if !seen[target] {
                        seen[target] = true;
                        stack.push((target, 0));
                    }
                } else {
                    finished.push(node);
                }
            }
        }

        let mut component = vec![usize::MAX; n];
        let mut next_id = 0;
        for &start in finished.iter().rev() {
            if component[start] != usize::MAX {
                continue;
            }
            component[start] = next_id;
            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                for &source in &backward[node] {
                    if component[source] == usize::MAX {
                        component[source] = next_id;
                        stack.push(source);
                    }
                }
            }
            next_id += 1;
        }

        component
    }

    /// Kahn's algorithm; ready nodes leave in name order. The graph must be acyclic.
    fn toposort(&self) -> Vec<String> {
        let forward = self.adjacency(false);
        let mut indegree = vec![0_usize; self.nodes.len()];
        for &(_, child) in &self.edges {
            indegree[child] += 1;
        }

        let mut ready: BTreeSet<(&str, usize)> = indegree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| (self.nodes[id].as_str(), id))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some((name, id)) = ready.pop_first() {
            order.push(name.to_string());
            for &child in &forward[id] {
                indegree[child] = indegree[child].saturating_sub(1);
                if indegree[child] == 0 {
                    ready.insert((self.nodes[child].as_str(), child));
                }
            }
        }

        order
    }
}
