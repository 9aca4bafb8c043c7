//! Layering of the item/recipe flow graph.
//!
//! Steps are projected onto a bipartite graph: an item node links to each
//! recipe that consumes it (its `parents`) and a recipe node links to each
//! item it outputs (its `outputs`). Each node's depth is its longest path
//! from a source, with one unit per edge. Cycles are tolerated by dropping
//! the edges that close them. Edges leaving a loop still count, so rows
//! downstream of a loop layer below it.

use std::collections::{HashMap, HashSet, VecDeque};

use slotmap::{SecondaryMap, SlotMap, new_key_type};
use tracing::trace;

use crate::id::{ItemId, RecipeId, StepId};
use crate::step::Step;

new_key_type! {
    /// Identifies a node in the flow graph.
    pub struct FlowNodeId;

    /// Identifies an edge in the flow graph.
    pub struct FlowEdgeId;
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// What a flow graph node stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowNode {
    Item(ItemId),
    Recipe(RecipeId),
}

/// Adjacency lists for a single node, tracking incoming and outgoing edges.
#[derive(Debug, Clone, Default)]
struct NodeAdjacency {
    /// Edges whose destination is this node.
    inputs: Vec<FlowEdgeId>,
    /// Edges whose source is this node.
    outputs: Vec<FlowEdgeId>,
}

/// Per-edge data stored in the flow graph.
#[derive(Debug, Clone)]
pub struct FlowEdge {
    pub from: FlowNodeId,
    pub to: FlowNodeId,
}

/// Search state of a node during [`FlowGraph::back_edges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Closed,
}

// ---------------------------------------------------------------------------
// FlowGraph
// ---------------------------------------------------------------------------

/// Directed item/recipe graph built from one run's steps.
#[derive(Debug, Default)]
pub struct FlowGraph {
    nodes: SlotMap<FlowNodeId, FlowNode>,
    edges: SlotMap<FlowEdgeId, FlowEdge>,
    adjacency: SecondaryMap<FlowNodeId, NodeAdjacency>,
    index: HashMap<FlowNode, FlowNodeId>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project steps onto the graph. Parent links to the root or to steps
    /// without a recipe are ignored.
    pub fn from_steps(steps: &[Step]) -> Self {
        let by_id: HashMap<&StepId, &Step> = steps.iter().map(|s| (&s.id, s)).collect();
        let mut graph = Self::new();

        for step in steps {
            if let (Some(item_id), Some(parents)) = (&step.item_id, &step.parents) {
                for parent_id in parents.keys().filter(|id| !id.is_root()) {
                    let Some(recipe_id) = by_id.get(parent_id).and_then(|p| p.recipe_id.as_ref())
                    else {
                        continue;
                    };
                    graph.connect(
                        FlowNode::Item(item_id.clone()),
                        FlowNode::Recipe(recipe_id.clone()),
                    );
                }
            }

            if let (Some(recipe_id), Some(outputs)) = (&step.recipe_id, &step.outputs) {
                for item_id in outputs.keys() {
                    graph.connect(
                        FlowNode::Recipe(recipe_id.clone()),
                        FlowNode::Item(item_id.clone()),
                    );
                }
            }
        }
        graph
    }

    /// Get or create the node for `key`.
    pub fn add_node(&mut self, key: FlowNode) -> FlowNodeId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.nodes.insert(key.clone());
        self.adjacency.insert(id, NodeAdjacency::default());
        self.index.insert(key, id);
        id
    }

    /// Add an edge, creating either endpoint as needed.
    pub fn connect(&mut self, from: FlowNode, to: FlowNode) -> FlowEdgeId {
        let from = self.add_node(from);
        let to = self.add_node(to);
        let edge = self.edges.insert(FlowEdge { from, to });
        if let Some(adj) = self.adjacency.get_mut(from) {
            adj.outputs.push(edge);
        }
        if let Some(adj) = self.adjacency.get_mut(to) {
            adj.inputs.push(edge);
        }
        edge
    }

    pub fn node_id(&self, key: &FlowNode) -> Option<FlowNodeId> {
        self.index.get(key).copied()
    }

    pub fn get_node(&self, node: FlowNodeId) -> Option<&FlowNode> {
        self.nodes.get(node)
    }

    pub fn get_edge(&self, edge: FlowEdgeId) -> Option<&FlowEdge> {
        self.edges.get(edge)
    }

    /// Edges coming into a node.
    pub fn get_inputs(&self, node: FlowNodeId) -> &[FlowEdgeId] {
        self.adjacency
            .get(node)
            .map(|adj| adj.inputs.as_slice())
            .unwrap_or(&[])
    }

    /// Edges going out of a node.
    pub fn get_outputs(&self, node: FlowNodeId) -> &[FlowEdgeId] {
        self.adjacency
            .get(node)
            .map(|adj| adj.outputs.as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    /// Edges that close a cycle.
    ///
    /// Depth-first search starting from source nodes, then from any node
    /// not yet reached in key order. An edge is a back-edge when it reaches
    /// a node still on the search stack, so only cycle edges are returned
    /// and self-loops always are.
    pub fn back_edges(&self) -> Vec<FlowEdgeId> {
        let mut roots: Vec<FlowNodeId> = self.nodes.keys().collect();
        roots.sort_by_key(|&nid| (!self.get_inputs(nid).is_empty(), nid));

        let mut state: SecondaryMap<FlowNodeId, Visit> = SecondaryMap::new();
        let mut back = Vec::new();
        for root in roots {
            if state.contains_key(root) {
                continue;
            }
            state.insert(root, Visit::Open);
            let mut stack: Vec<(FlowNodeId, usize)> = vec![(root, 0)];

            while let Some(&(node, cursor)) = stack.last() {
                let Some(&eid) = self.get_outputs(node).get(cursor) else {
                    state.insert(node, Visit::Closed);
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let Some(edge) = self.edges.get(eid) else {
                    continue;
                };
                match state.get(edge.to) {
                    Some(Visit::Open) => back.push(eid),
                    Some(Visit::Closed) => {}
                    None => {
                        state.insert(edge.to, Visit::Open);
                        stack.push((edge.to, 0));
                    }
                }
            }
        }
        back
    }

    /// Returns a processing order even when cycles exist.
    ///
    /// Runs Kahn's algorithm over the graph without its back-edges, which
    /// is acyclic, so every node is placed. Back-edges are returned
    /// separately.
    pub fn order_with_feedback(&self) -> (Vec<FlowNodeId>, Vec<FlowEdgeId>) {
        let back_edges = self.back_edges();
        let back: HashSet<FlowEdgeId> = back_edges.iter().copied().collect();

        let mut in_degree: SecondaryMap<FlowNodeId, usize> = SecondaryMap::new();
        for (nid, _) in &self.nodes {
            in_degree.insert(nid, 0);
        }
        for (eid, edge) in &self.edges {
            if back.contains(&eid) {
                continue;
            }
            if let Some(deg) = in_degree.get_mut(edge.to) {
                *deg += 1;
            }
        }

        let mut queue: VecDeque<FlowNodeId> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(nid, _)| nid)
            .collect();
        let mut order: Vec<FlowNodeId> = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &eid in self.get_outputs(node).iter().filter(|e| !back.contains(*e)) {
                let Some(edge) = self.edges.get(eid) else {
                    continue;
                };
                if let Some(deg) = in_degree.get_mut(edge.to) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(edge.to);
                    }
                }
            }
        }

        (order, back_edges)
    }

    /// Longest-path depth of every node that has at least one edge.
    pub fn depths(&self) -> SecondaryMap<FlowNodeId, u32> {
        let (order, back_edges) = self.order_with_feedback();
        let back: HashSet<FlowEdgeId> = back_edges.into_iter().collect();

        let mut depth: SecondaryMap<FlowNodeId, u32> = SecondaryMap::new();
        for &node in &order {
            if !self.get_inputs(node).is_empty() || !self.get_outputs(node).is_empty() {
                depth.insert(node, 0);
            }
        }

        for &node in &order {
            let node_depth = depth.get(node).copied().unwrap_or(0);
            for eid in self.get_outputs(node).iter().filter(|e| !back.contains(*e)) {
                let Some(edge) = self.edges.get(*eid) else {
                    continue;
                };
                if let Some(d) = depth.get_mut(edge.to) {
                    *d = (*d).max(node_depth + 1);
                }
            }
        }
        depth
    }
}

/// Assign every step the depth of its flow graph node, preferring the item
/// node for steps that are both. Leaves all depths unset when the graph
/// has no edges.
pub fn assign_depths(steps: &mut [Step]) {
    let graph = FlowGraph::from_steps(steps);
    if graph.node_count() == 0 || graph.edge_count() == 0 {
        trace!("flow graph is empty, skipping layering");
        return;
    }

    let depths = graph.depths();
    trace!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "layered flow graph"
    );
    for step in steps.iter_mut() {
        let item_node = step
            .item_id
            .as_ref()
            .and_then(|id| graph.node_id(&FlowNode::Item(id.clone())));
        let recipe_node = step
            .recipe_id
            .as_ref()
            .and_then(|id| graph.node_id(&FlowNode::Recipe(id.clone())));
        step.depth = item_node
            .or(recipe_node)
            .and_then(|node| depths.get(node).copied());
    }
}
