//! Call-graph queries over the function registry
//!
//! All traversals follow project-internal edges only: a call counts as an
//! edge when its target name is a key in the registry. External and library
//! calls never appear in components, flows, or rendered graphs.
//!
//! Global invariants enforced:
//! - Deterministic iteration: nodes and edges are kept in sorted order
//! - Queries never mutate the registry

use crate::registry::FunctionRegistry;
use std::collections::{BTreeMap, BTreeSet};

/// Directed project-internal edges over function names.
///
/// Records sharing a name merge their outgoing edges; self-edges are kept
/// (direct recursion is a real cycle).
pub fn internal_edges(registry: &FunctionRegistry) -> BTreeMap<String, BTreeSet<String>> {
    let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in registry.all() {
        let targets = registry.project_calls_of(record);
        edges
            .entry(record.name.clone())
            .or_default()
            .extend(targets);
    }
    edges
}

/// Connected-components analysis result
#[derive(Debug, Clone)]
pub struct ComponentReport {
    /// Components of size > 1, sorted by descending size, then by first
    /// member name; members sorted within each component
    pub components: Vec<Vec<String>>,
    /// Functions with no project-internal edges at all
    pub isolated: usize,
}

/// Compute connected components of the call graph, treated as undirected.
///
/// Depth-first traversal seeded from each unvisited node, following both
/// outgoing and incoming project-internal edges.
pub fn connected_components(registry: &FunctionRegistry) -> ComponentReport {
    let edges = internal_edges(registry);

    // Undirected adjacency
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for name in edges.keys() {
        adjacency.entry(name).or_default();
    }
    for (caller, callees) in &edges {
        for callee in callees {
            adjacency.entry(caller).or_default().insert(callee);
            adjacency.entry(callee).or_default().insert(caller);
        }
    }

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components: Vec<Vec<String>> = Vec::new();
    let mut isolated = 0usize;

    let nodes: Vec<&str> = adjacency.keys().copied().collect();
    for start in nodes {
        if visited.contains(start) {
            continue;
        }

        // Iterative DFS
        let mut component: BTreeSet<&str> = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            component.insert(node);
            if let Some(neighbors) = adjacency.get(node) {
                for &neighbor in neighbors {
                    if !visited.contains(neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
        }

        // A node alone with no neighbors (or only a self-edge) is isolated
        let has_edges = adjacency
            .get(start)
            .is_some_and(|n| n.iter().any(|&other| other != start));
        if component.len() > 1 || has_edges {
            components.push(component.into_iter().map(|s| s.to_string()).collect());
        } else {
            isolated += 1;
        }
    }

    // Size > 1 groups only, largest first
    components.retain(|c| c.len() > 1);
    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    ComponentReport {
        components,
        isolated,
    }
}

/// One node of a traced call flow
#[derive(Debug, Clone)]
pub struct FlowNode {
    pub name: String,
    /// Argument text of the call that reached this node; empty at the root
    pub args: Vec<String>,
    /// True when this name already occurs on the current path; the node is
    /// not expanded further
    pub circular: bool,
    pub children: Vec<FlowNode>,
}

/// Trace project-internal calls from a start function, depth-first.
///
/// The visited set is per-path: a diamond-shaped graph is shown in full on
/// each branch, while a true cycle is marked circular and cut. Traversal
/// stops expanding at `max_depth`.
///
/// Returns `None` when the start function is not in the registry.
pub fn trace_flow(registry: &FunctionRegistry, start: &str, max_depth: usize) -> Option<FlowNode> {
    let record = registry.resolve(start)?;
    let mut path = Vec::new();
    Some(expand(registry, &record.name, Vec::new(), 0, max_depth, &mut path))
}

fn expand(
    registry: &FunctionRegistry,
    name: &str,
    args: Vec<String>,
    depth: usize,
    max_depth: usize,
    path: &mut Vec<String>,
) -> FlowNode {
    if path.iter().any(|seen| seen == name) {
        return FlowNode {
            name: name.to_string(),
            args,
            circular: true,
            children: Vec::new(),
        };
    }

    let mut children = Vec::new();
    if depth < max_depth {
        if let Some(record) = registry.resolve(name) {
            path.push(name.to_string());
            for call in &record.calls {
                if !registry.contains_name(&call.callee) {
                    continue;
                }
                children.push(expand(
                    registry,
                    &call.callee,
                    call.args.clone(),
                    depth + 1,
                    max_depth,
                    path,
                ));
            }
            path.pop();
        }
    }

    FlowNode {
        name: name.to_string(),
        args,
        circular: false,
        children,
    }
}

/// Output format for dependency-graph rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Mermaid,
    Dot,
}

/// Render the project-internal call graph, whole or scoped to the edges
/// touching one function
pub fn render_graph(
    registry: &FunctionRegistry,
    scope: Option<&str>,
    format: GraphFormat,
) -> String {
    let edges = internal_edges(registry);

    // Flatten to sorted (caller, callee) pairs, optionally scoped
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    for (caller, callees) in &edges {
        for callee in callees {
            if let Some(name) = scope {
                if caller != name && callee != name {
                    continue;
                }
            }
            pairs.push((caller, callee));
        }
    }

    match format {
        GraphFormat::Text => {
            let mut out = String::new();
            for (caller, callee) in &pairs {
                out.push_str(&format!("{} -> {}\n", caller, callee));
            }
            if pairs.is_empty() {
                out.push_str("(no project-internal calls)\n");
            }
            out
        }
        GraphFormat::Mermaid => {
            let mut out = String::from("graph TD\n");
            for (caller, callee) in &pairs {
                out.push_str(&format!(
                    "    {}[\"{}\"] --> {}[\"{}\"]\n",
                    mermaid_id(caller),
                    caller,
                    mermaid_id(callee),
                    callee
                ));
            }
            out
        }
        GraphFormat::Dot => {
            let mut out = String::from("digraph calls {\n");
            for (caller, callee) in &pairs {
                out.push_str(&format!("  \"{}\" -> \"{}\";\n", caller, callee));
            }
            out.push_str("}\n");
            out
        }
    }
}

/// Mermaid node ids allow word characters only
fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
