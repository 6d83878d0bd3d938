// Sparse directed graph over course nodes.
//
// The graph is an append-only node table plus one adjacency list per node.
// Node handles are stable for the whole session: removal is logical only
// (the slot is stamped with `NodeIndex::INVALID`) and the edges touching a
// removed node are swept out in one batched pass rather than eagerly per
// removal. Edges are directed; undirected connections are two mirrored
// edges.
//
// Storage uses `Vec` indexed by `NodeIndex` for O(1) lookup and
// deterministic iteration order, with `SmallVec` adjacency lists — course
// nodes rarely have more than a handful of outgoing links, so the common
// case stays inline.
//
// Error discipline: malformed indices from setup code are programmer
// errors and assert; absent nodes/edges during queries are expected in
// search hot loops and return `None` with a diagnostic log.
//
// See also: `search.rs` for the algorithms that read this graph, `nav.rs`
// for the course-level wrapper that builds it.

use crate::types::NodeIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A graph vertex. Carries only its own handle; course metadata (position,
/// kind) lives in the owning `CourseGraph`, keyed by the same index.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    pub index: NodeIndex,
}

impl GraphNode {
    pub fn new(index: NodeIndex) -> Self {
        Self { index }
    }
}

/// A directed, weighted edge. `cost` is non-negative.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeIndex,
    pub to: NodeIndex,
    pub cost: f32,
}

impl GraphEdge {
    pub fn new(from: NodeIndex, to: NodeIndex, cost: f32) -> Self {
        Self { from, to, cost }
    }

    /// An edge with the default unit cost.
    pub fn unweighted(from: NodeIndex, to: NodeIndex) -> Self {
        Self {
            from,
            to,
            cost: 1.0,
        }
    }
}

type AdjacencyList = SmallVec<[GraphEdge; 4]>;

/// The sparse graph: node table + per-node adjacency lists.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SparseGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<AdjacencyList>,
    /// The index the next appended node must carry.
    next_node_index: i32,
}

impl SparseGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, or reactivate a previously removed slot.
    ///
    /// If `node.index` addresses an existing slot, that slot must currently
    /// be invalidated (re-adding a live index is a setup bug) and is
    /// reactivated in place; the next free index is returned. Otherwise
    /// `node.index` must equal the next free index; the node is appended
    /// with an empty adjacency list and its own index is returned.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        assert!(node.index.is_valid(), "add_node: invalid node index");

        let slot = node.index.0 as usize;
        if slot < self.nodes.len() {
            assert!(
                !self.nodes[slot].index.is_valid(),
                "add_node: attempting to add a node with a duplicate index"
            );
            self.nodes[slot] = node;
            return NodeIndex(self.next_node_index);
        }

        assert!(
            node.index.0 == self.next_node_index,
            "add_node: index {} does not match next free index {}",
            node.index,
            self.next_node_index
        );
        self.nodes.push(node);
        self.edges.push(AdjacencyList::new());
        self.next_node_index += 1;
        node.index
    }

    /// Add a directed edge.
    ///
    /// Both endpoints must address slots that have been allocated (asserted).
    /// The edge is silently declined if either endpoint is currently
    /// invalidated, or if an edge with the same `(from, to)` already exists.
    pub fn add_edge(&mut self, edge: GraphEdge) {
        assert!(
            edge.from.is_valid()
                && edge.to.is_valid()
                && edge.from.0 < self.next_node_index
                && edge.to.0 < self.next_node_index,
            "add_edge: endpoint out of range ({} -> {})",
            edge.from,
            edge.to
        );

        if self.nodes[edge.from.idx()].index.is_valid()
            && self.nodes[edge.to.idx()].index.is_valid()
            && self.unique_edge(edge.from, edge.to)
        {
            self.edges[edge.from.idx()].push(edge);
        }
    }

    /// Add `edge` plus its mirror with the same cost, subject to the same
    /// validity and uniqueness gating as `add_edge`.
    pub fn add_double_edge(&mut self, edge: GraphEdge) {
        self.add_edge(edge);
        self.add_edge(GraphEdge::new(edge.to, edge.from, edge.cost));
    }

    /// Logically remove a node and sweep out every edge touching an
    /// invalidated node.
    ///
    /// The sweep is a full O(E) pass; removal is expected to be rare
    /// (course edits between rounds, not steady-state gameplay).
    pub fn remove_node(&mut self, node: NodeIndex) {
        assert!(
            node.is_valid() && node.idx() < self.nodes.len(),
            "remove_node: invalid node index {node}"
        );
        self.nodes[node.idx()].index = NodeIndex::INVALID;
        self.cull_invalid_edges();
    }

    /// Remove the first edge matching `(from, to)`. No-op if absent.
    pub fn remove_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        assert!(
            from.is_valid()
                && to.is_valid()
                && from.idx() < self.nodes.len()
                && to.idx() < self.nodes.len(),
            "remove_edge: invalid node index ({from} -> {to})"
        );
        let list = &mut self.edges[from.idx()];
        if let Some(pos) = list.iter().position(|e| e.to == to) {
            list.remove(pos);
        }
    }

    /// Set the cost of the `(from, to)` edge. Updates every match, though
    /// uniqueness means there is at most one.
    pub fn set_edge_cost(&mut self, from: NodeIndex, to: NodeIndex, cost: f32) {
        assert!(
            from.is_valid()
                && to.is_valid()
                && from.idx() < self.nodes.len()
                && to.idx() < self.nodes.len(),
            "set_edge_cost: invalid node index ({from} -> {to})"
        );
        for e in &mut self.edges[from.idx()] {
            if e.to == to {
                e.cost = cost;
            }
        }
    }

    /// Scale the cost of the `from -> to` edge, and of `to -> from` if it
    /// exists. Used to penalize previously traveled or hazardous
    /// connections.
    pub fn multiply_edges_between(&mut self, from: NodeIndex, to: NodeIndex, multiplier: f32) {
        if let Some(e) = self.edge_mut(from, to) {
            e.cost *= multiplier;
        }
        if let Some(e) = self.edge_mut(to, from) {
            e.cost *= multiplier;
        }
    }

    // ---------------------------------------------------------------
    // Query surface
    // ---------------------------------------------------------------

    /// Total node-table size, invalidated slots included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes not currently invalidated.
    pub fn num_active_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.index.is_valid()).count()
    }

    /// Total edge count across all adjacency lists.
    pub fn num_edges(&self) -> usize {
        self.edges.iter().map(|list| list.len()).sum()
    }

    /// True when the graph has no active nodes.
    pub fn is_empty(&self) -> bool {
        self.num_active_nodes() == 0
    }

    /// True if `id` addresses an allocated, non-invalidated node.
    pub fn is_node_present(&self, id: NodeIndex) -> bool {
        id.is_valid() && id.idx() < self.nodes.len() && self.nodes[id.idx()].index.is_valid()
    }

    /// True if both endpoints are present and a `(from, to)` edge exists.
    pub fn is_edge_present(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.is_node_present(from)
            && self.is_node_present(to)
            && self.edges[from.idx()].iter().any(|e| e.to == to)
    }

    /// Look up a node by handle. Returns `None` (with a diagnostic log) on
    /// an out-of-range index — callers in search loops null-check rather
    /// than fault.
    pub fn node(&self, id: NodeIndex) -> Option<&GraphNode> {
        if id.is_valid() && id.idx() < self.nodes.len() {
            Some(&self.nodes[id.idx()])
        } else {
            log::warn!("node lookup out of range: {id}");
            None
        }
    }

    /// Look up the `(from, to)` edge. Returns `None` (with a diagnostic
    /// log) when the endpoints are out of range or no such edge exists.
    pub fn edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&GraphEdge> {
        if !(from.is_valid()
            && to.is_valid()
            && from.idx() < self.nodes.len()
            && to.idx() < self.nodes.len())
        {
            log::warn!("edge lookup out of range: {from} -> {to}");
            return None;
        }
        let found = self.edges[from.idx()].iter().find(|e| e.to == to);
        if found.is_none() {
            log::warn!("edge lookup missed: {from} -> {to}");
        }
        found
    }

    /// All edges leaving `node`. The caller guarantees the index is in
    /// range — this is the search hot loop.
    pub fn edges_from(&self, node: NodeIndex) -> &[GraphEdge] {
        &self.edges[node.idx()]
    }

    /// The index the next appended node must carry.
    pub fn next_free_index(&self) -> NodeIndex {
        NodeIndex(self.next_node_index)
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// True if no `(from, to)` edge exists yet.
    fn unique_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        !self.edges[from.idx()].iter().any(|e| e.to == to)
    }

    fn edge_mut(&mut self, from: NodeIndex, to: NodeIndex) -> Option<&mut GraphEdge> {
        if !(from.is_valid()
            && to.is_valid()
            && from.idx() < self.nodes.len()
            && to.idx() < self.nodes.len())
        {
            return None;
        }
        self.edges[from.idx()].iter_mut().find(|e| e.to == to)
    }

    /// Sweep every adjacency list, dropping edges whose `from` or `to`
    /// resolves to an invalidated node. One pass over all edges, so a
    /// batch of removals pays the cost once.
    fn cull_invalid_edges(&mut self) {
        let nodes = &self.nodes;
        for list in &mut self.edges {
            list.retain(|e| {
                nodes[e.from.idx()].index.is_valid() && nodes[e.to.idx()].index.is_valid()
            });
        }
    }
}
