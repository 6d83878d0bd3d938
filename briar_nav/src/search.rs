// Graph searches: BFS, DFS, Dijkstra, and a Prim-style spanning tree.
//
// All four operate read-only over a fixed graph snapshot — none mutate the
// graph, and every scratch array is sized by `num_nodes()` (the full node
// table, invalidated slots included) so raw node indices always land in
// range.
//
// BFS and DFS keep a frontier of *edges* rather than nodes: carrying `from`
// alongside `to` is what lets a single dequeue write the predecessor route.
// Both are seeded with a dummy self-loop so the source's predecessor is
// itself. BFS marks destinations visited at enqueue time (no duplicate
// enqueues, minimum-hop routes); DFS marks at pop time, as a LIFO frontier
// must.
//
// Dijkstra runs over an `IndexedMinHeap` holding every node index, with the
// source forced to priority zero. The loop runs while the queue still
// contains the target and is non-empty; if the queue drains first the
// target is unreachable, the result reconstructs no path, and the caller
// substitutes a degenerate single-node path.
//
// The spanning tree is Prim's — chosen over Kruskal's to avoid
// cycle-detection bookkeeping. It keys a heap by *candidate edge* cost,
// discards popped edges whose destination is already in the tree, and emits
// the result as a freestanding graph with the tree edges mirrored.
//
// See also: `graph.rs` for the structure being searched, `pqueue.rs` for
// the re-keyable heap, `nav.rs` for the course-level entry points.

use crate::graph::{GraphEdge, GraphNode, SparseGraph};
use crate::pqueue::IndexedMinHeap;
use crate::types::NodeIndex;
use briar_prng::GameRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

// ---------------------------------------------------------------------------
// BFS / DFS
// ---------------------------------------------------------------------------

/// Result of a BFS or DFS run: reachability plus a predecessor route.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    source: NodeIndex,
    /// `INVALID` when the search was an exhaustive reachability sweep.
    target: NodeIndex,
    /// True when a specified target was reached.
    pub found: bool,
    route: Vec<NodeIndex>,
    visited: Vec<bool>,
}

impl SearchResult {
    /// The node sequence from source to target, both inclusive.
    /// Empty when the target was absent or never reached.
    pub fn path_to_target(&self) -> Vec<NodeIndex> {
        let mut path = Vec::new();
        if !self.found || !self.target.is_valid() {
            return path;
        }
        let mut node = self.target;
        while node != self.source {
            node = self.route[node.idx()];
            path.insert(0, node);
        }
        path.push(self.target);
        path
    }

    /// True if the sweep reached `node` (the source counts as reached).
    pub fn is_reachable(&self, node: NodeIndex) -> bool {
        node.is_valid() && node.idx() < self.visited.len() && self.visited[node.idx()]
    }
}

/// Breadth-first search from `source`. With a target, stops on reaching it
/// and `path_to_target` yields a minimum-hop path; with `None`, sweeps the
/// whole reachable set.
pub fn bfs(graph: &SparseGraph, source: NodeIndex, target: Option<NodeIndex>) -> SearchResult {
    let n = graph.num_nodes();
    let mut visited = vec![false; n];
    let mut route = vec![NodeIndex::INVALID; n];
    let target = target.unwrap_or(NodeIndex::INVALID);
    let mut found = false;

    let mut frontier = VecDeque::new();
    frontier.push_back(GraphEdge::unweighted(source, source));
    visited[source.idx()] = true;

    while let Some(next_edge) = frontier.pop_front() {
        route[next_edge.to.idx()] = next_edge.from;

        if next_edge.to == target {
            found = true;
            break;
        }

        for edge in graph.edges_from(next_edge.to) {
            if !visited[edge.to.idx()] {
                visited[edge.to.idx()] = true;
                frontier.push_back(*edge);
            }
        }
    }

    SearchResult {
        source,
        target,
        found,
        route,
        visited,
    }
}

/// Depth-first search from `source`. Finds *some* valid path to the target
/// when one exists — not necessarily a short one.
pub fn dfs(graph: &SparseGraph, source: NodeIndex, target: Option<NodeIndex>) -> SearchResult {
    let n = graph.num_nodes();
    let mut visited = vec![false; n];
    let mut route = vec![NodeIndex::INVALID; n];
    let target = target.unwrap_or(NodeIndex::INVALID);
    let mut found = false;

    let mut frontier = vec![GraphEdge::unweighted(source, source)];

    while let Some(next_edge) = frontier.pop() {
        if visited[next_edge.to.idx()] {
            continue;
        }
        visited[next_edge.to.idx()] = true;
        route[next_edge.to.idx()] = next_edge.from;

        if next_edge.to == target {
            found = true;
            break;
        }

        for edge in graph.edges_from(next_edge.to) {
            if !visited[edge.to.idx()] {
                frontier.push(*edge);
            }
        }
    }

    SearchResult {
        source,
        target,
        found,
        route,
        visited,
    }
}

// ---------------------------------------------------------------------------
// Dijkstra
// ---------------------------------------------------------------------------

/// Result of a Dijkstra run: locked-in distances plus predecessors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DijkstraResult {
    source: NodeIndex,
    target: NodeIndex,
    dist: Vec<f32>,
    previous: Vec<NodeIndex>,
}

impl DijkstraResult {
    /// True when the target was reached.
    pub fn found(&self) -> bool {
        self.target.is_valid() && self.previous[self.target.idx()].is_valid()
    }

    /// Total cost of the shortest path to the target. Infinity when
    /// unreachable.
    pub fn cost_to_target(&self) -> f32 {
        if self.target.is_valid() {
            self.dist[self.target.idx()]
        } else {
            f32::INFINITY
        }
    }

    /// The shortest path from source to target, both inclusive.
    /// `None` when the target was unreachable — callers substitute a
    /// degenerate single-node path rather than propagating a fault.
    pub fn path(&self) -> Option<Vec<NodeIndex>> {
        if !self.found() {
            return None;
        }
        let mut path = vec![self.target];
        let mut next = self.target;
        while next != self.source {
            next = self.previous[next.idx()];
            path.push(next);
        }
        path.reverse();
        Some(path)
    }
}

/// Single-source single-target shortest path over non-negative edge costs.
///
/// The queue starts holding *every* node index at infinite priority with
/// the source forced to zero. Popping locks a node's distance in; each
/// outgoing edge to a still-queued destination is relaxed, re-keying the
/// destination when the route through the popped node improves on its
/// tentative priority. Tie order among equal priorities is unspecified.
pub fn dijkstra(graph: &SparseGraph, source: NodeIndex, target: NodeIndex) -> DijkstraResult {
    let n = graph.num_nodes();
    let mut dist = vec![f32::INFINITY; n];
    let mut previous = vec![NodeIndex::INVALID; n];

    let mut unvisited = IndexedMinHeap::filled(n, f32::INFINITY);
    unvisited.update_priority(source.idx(), 0.0);
    previous[source.idx()] = source;

    while target.is_valid() && unvisited.contains(target.idx()) && !unvisited.is_empty() {
        let Some((current, priority)) = unvisited.pop() else {
            break;
        };
        dist[current] = priority;

        for edge in graph.edges_from(NodeIndex(current as i32)) {
            if !unvisited.contains(edge.to.idx()) {
                continue;
            }
            let candidate = dist[current] + edge.cost;
            if candidate < unvisited.priority_of(edge.to.idx()) {
                previous[edge.to.idx()] = edge.from;
                unvisited.update_priority(edge.to.idx(), candidate);
            }
        }
    }

    DijkstraResult {
        source,
        target,
        dist,
        previous,
    }
}

// ---------------------------------------------------------------------------
// Prim spanning tree
// ---------------------------------------------------------------------------

/// Candidate edge in the Prim heap. Min-ordered by cost; ties broken by
/// endpoint indices so the heap layout is deterministic.
#[derive(Clone, Copy, Debug)]
struct Candidate(GraphEdge);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap: the cheapest edge is "greatest".
        other
            .0
            .cost
            .total_cmp(&self.0.cost)
            .then_with(|| other.0.from.cmp(&self.0.from))
            .then_with(|| other.0.to.cmp(&self.0.to))
    }
}

/// Prim's minimum spanning tree, grown from `start`.
///
/// The candidate heap is seeded with a dummy self-loop at the start node.
/// Each round pops the cheapest edge whose destination is not yet in the
/// tree — edges into the visited set are discarded outright — then admits
/// the destination and enqueues its outgoing edges. Stops when every node
/// is visited or the heap drains (disconnected input yields the start
/// component's tree only).
///
/// The result is a freestanding graph carrying all original node slots,
/// with each selected edge inserted as a mirrored double edge.
pub fn minimum_spanning_tree(graph: &SparseGraph, start: NodeIndex) -> SparseGraph {
    let n = graph.num_nodes();
    let mut visited = vec![false; n];
    let mut visited_count = 0usize;
    let mut tree_edges: Vec<GraphEdge> = Vec::new();

    let mut candidates = BinaryHeap::new();
    candidates.push(Candidate(GraphEdge::unweighted(start, start)));

    while visited_count < n {
        // Pop until an edge leading out of the tree appears.
        let cur = loop {
            match candidates.pop() {
                Some(Candidate(e)) if visited[e.to.idx()] => continue,
                Some(Candidate(e)) => break Some(e),
                None => break None,
            }
        };
        let Some(cur) = cur else {
            break;
        };

        // The self-loop seed admits the start node but is not a tree edge.
        if cur.from != cur.to {
            tree_edges.push(cur);
        }

        for edge in graph.edges_from(cur.to) {
            if !visited[edge.to.idx()] {
                candidates.push(Candidate(*edge));
            }
        }

        visited[cur.to.idx()] = true;
        visited_count += 1;
    }

    let mut tree = SparseGraph::new();
    for i in 0..n {
        tree.add_node(GraphNode::new(NodeIndex(i as i32)));
    }
    for e in tree_edges {
        tree.add_double_edge(e);
    }
    tree
}

/// Prim's spanning tree from a PRNG-chosen start node.
pub fn minimum_spanning_tree_random(graph: &SparseGraph, rng: &mut GameRng) -> SparseGraph {
    let n = graph.num_nodes();
    assert!(n > 0, "minimum_spanning_tree_random: empty graph");
    let start = NodeIndex(rng.range_usize(0, n) as i32);
    minimum_spanning_tree(graph, start)
}
