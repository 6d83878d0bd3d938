// The course graph — the in-game navigation object.
//
// `CourseGraph` wraps the abstract `SparseGraph` with everything the game
// layer needs: per-node metadata (kind, world position), the node-by-node
// `MessageTable`, the target's last-confirmed node, and the path queries
// the agent scheduler calls every re-plan.
//
// Terrain setup hands over a finished course description once, as a slice
// of `NodeSpec`s — node positions plus directed neighbor links, each link
// tagged with the `Message` that traverses it. `setup()` turns that into
// the sparse graph (deriving edge weights from the node-kind heuristics in
// `NavConfig`) and the message table, then flips the one-shot setup gate.
// Every query checks the gate and returns `None` before setup rather than
// faulting — setup ordering bugs surface as logged misses, not crashes.
//
// After setup the course is effectively frozen: the only sanctioned
// mutations are edge-cost updates (`penalize_connection`) and the rare
// node removal when terrain is carved up mid-session.
//
// See also: `graph.rs`, `search.rs`, `message.rs`, `agent.rs`.

use crate::config::NavConfig;
use crate::graph::{GraphEdge, GraphNode, SparseGraph};
use crate::message::{Message, MessageTable};
use crate::search;
use crate::types::{NodeIndex, NodeKind, WorldPos};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A directed link in a terrain-supplied node description.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NodeLink {
    /// Index of the neighbor within the `NodeSpec` slice.
    pub to: usize,
    /// The command that traverses this link.
    pub message: Message,
}

/// One course node as supplied by terrain setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSpec {
    pub position: WorldPos,
    pub kind: NodeKind,
    /// Collider width — feeds the floor-node weight heuristic.
    pub width: f32,
    pub links: Vec<NodeLink>,
}

impl NodeSpec {
    pub fn new(position: WorldPos, kind: NodeKind, width: f32) -> Self {
        Self {
            position,
            kind,
            width,
            links: Vec::new(),
        }
    }

    pub fn link(mut self, to: usize, message: Message) -> Self {
        self.links.push(NodeLink { to, message });
        self
    }
}

/// The in-game navigation graph: abstract graph + message table + node
/// metadata + target tracking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseGraph {
    graph: SparseGraph,
    messages: MessageTable,
    kinds: Vec<NodeKind>,
    positions: Vec<WorldPos>,
    has_been_setup: bool,
    /// The target's most recently confirmed node, published by the
    /// target-tracking layer. `INVALID` until first confirmed.
    target_last_node: NodeIndex,
}

impl Default for CourseGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseGraph {
    pub fn new() -> Self {
        Self {
            graph: SparseGraph::new(),
            messages: MessageTable::default(),
            kinds: Vec::new(),
            positions: Vec::new(),
            has_been_setup: false,
            target_last_node: NodeIndex::INVALID,
        }
    }

    /// One-time course assembly from terrain-supplied specs. A second call
    /// is a no-op — the course is frozen after the first.
    ///
    /// Link indices must address the spec slice; a dangling link is a
    /// terrain-setup bug and asserts.
    pub fn setup(&mut self, specs: &[NodeSpec], config: &NavConfig) {
        if self.has_been_setup {
            return;
        }

        self.messages = MessageTable::new(specs.len());
        self.kinds = specs.iter().map(|s| s.kind).collect();
        self.positions = specs.iter().map(|s| s.position).collect();

        for i in 0..specs.len() {
            self.graph.add_node(GraphNode::new(NodeIndex(i as i32)));
        }

        for (i, spec) in specs.iter().enumerate() {
            let from = NodeIndex(i as i32);
            for link in &spec.links {
                assert!(
                    link.to < specs.len(),
                    "setup: node {i} links to out-of-range node {}",
                    link.to
                );
                let to = NodeIndex(link.to as i32);
                let weight = link_weight(spec, link.message, config);
                self.graph.add_edge(GraphEdge::new(from, to, weight));
                self.messages.set(from, to, link.message);
            }
        }

        self.has_been_setup = true;
    }

    pub fn is_setup(&self) -> bool {
        self.has_been_setup
    }

    /// Shortest node sequence from `source` to `target`, both inclusive.
    ///
    /// An unreachable target degenerates to `[source]` — the agent stands
    /// its ground instead of faulting. `None` only before setup.
    pub fn path_ids(&self, source: NodeIndex, target: NodeIndex) -> Option<Vec<NodeIndex>> {
        if !self.has_been_setup {
            log::warn!("path_ids called before course setup");
            return None;
        }
        let result = search::dijkstra(&self.graph, source, target);
        Some(result.path().unwrap_or_else(|| {
            log::warn!("no route from {source} to {target}; holding position");
            vec![source]
        }))
    }

    /// Per-node command lookup for a path (see
    /// [`MessageTable::path_messages`]). `None` before setup or for an
    /// empty path.
    pub fn path_messages(&self, path: &[NodeIndex]) -> Option<FxHashMap<NodeIndex, Message>> {
        if !self.has_been_setup {
            log::warn!("path_messages called before course setup");
            return None;
        }
        self.messages.path_messages(path)
    }

    /// Publish the target's most recently confirmed node. Called by the
    /// target-tracking layer; read-only everywhere else.
    pub fn publish_target_node(&mut self, node: NodeIndex) {
        self.target_last_node = node;
    }

    pub fn target_last_node(&self) -> NodeIndex {
        self.target_last_node
    }

    /// Scale the cost of the connection between two nodes in both
    /// directions — a heuristic penalty for traveled or hazardous links.
    pub fn penalize_connection(&mut self, from: NodeIndex, to: NodeIndex, multiplier: f32) {
        assert!(self.has_been_setup, "penalize_connection before setup");
        self.graph.multiply_edges_between(from, to, multiplier);
    }

    /// Remove a node mid-session (terrain carved up). Logical removal;
    /// every edge touching the node is culled.
    pub fn remove_node(&mut self, node: NodeIndex) {
        assert!(self.has_been_setup, "remove_node before setup");
        self.graph.remove_node(node);
    }

    /// Kind of a course node; `Plain` for anything out of range.
    pub fn node_kind(&self, node: NodeIndex) -> NodeKind {
        if node.is_valid() && node.idx() < self.kinds.len() {
            self.kinds[node.idx()]
        } else {
            NodeKind::Plain
        }
    }

    /// World position of a course node.
    pub fn node_position(&self, node: NodeIndex) -> Option<WorldPos> {
        if node.is_valid() && node.idx() < self.positions.len() {
            Some(self.positions[node.idx()])
        } else {
            log::warn!("node_position out of range: {node}");
            None
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes()
    }

    /// The abstract graph, for searches beyond the scheduler's own.
    pub fn graph(&self) -> &SparseGraph {
        &self.graph
    }
}

/// Edge weight for one link, from the node-kind heuristics.
///
/// Floor spans cost their width over the walk-speed divisor; action-style
/// nodes (action, wall, double-jump) rate walk links as near-free and
/// jumps by arc length; unclassified nodes fall back to a unit-ish weight.
fn link_weight(spec: &NodeSpec, message: Message, config: &NavConfig) -> f32 {
    match spec.kind {
        NodeKind::Floor => spec.width / config.floor_speed_divisor,
        NodeKind::Action | NodeKind::Wall | NodeKind::DoubleJump => match message {
            Message::Walk(_) => config.walk_link_weight,
            Message::Jump { power, .. } | Message::JumpUp(power) => {
                if power.is_short() {
                    config.short_jump_weight
                } else if power.is_medium() {
                    config.medium_jump_weight
                } else {
                    config.long_jump_weight
                }
            }
            _ => config.long_jump_weight,
        },
        NodeKind::Plain => config.plain_link_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Facing, JumpPower};

    fn walk(f: Facing) -> Message {
        Message::Walk(f)
    }

    /// Three floor spans in a row, walk-linked both ways, with a jump link
    /// from the last back up to the first.
    fn small_course() -> Vec<NodeSpec> {
        vec![
            NodeSpec::new(WorldPos::new(0.0, 0.0), NodeKind::Floor, 15.0)
                .link(1, walk(Facing::Right)),
            NodeSpec::new(WorldPos::new(15.0, 0.0), NodeKind::Floor, 15.0)
                .link(0, walk(Facing::Left))
                .link(2, walk(Facing::Right)),
            NodeSpec::new(WorldPos::new(30.0, 0.0), NodeKind::Action, 1.0)
                .link(1, walk(Facing::Left))
                .link(
                    0,
                    Message::Jump {
                        facing: Facing::Left,
                        power: JumpPower::P3,
                    },
                ),
        ]
    }

    fn ready_course() -> CourseGraph {
        let mut course = CourseGraph::new();
        course.setup(&small_course(), &NavConfig::default());
        course
    }

    #[test]
    fn queries_before_setup_return_none() {
        let course = CourseGraph::new();
        assert!(!course.is_setup());
        assert!(course.path_ids(NodeIndex(0), NodeIndex(1)).is_none());
        assert!(course.path_messages(&[NodeIndex(0)]).is_none());
    }

    #[test]
    fn setup_builds_nodes_edges_and_messages() {
        let course = ready_course();
        assert!(course.is_setup());
        assert_eq!(course.num_nodes(), 3);
        assert_eq!(course.graph().num_edges(), 5);
        assert_eq!(course.node_kind(NodeIndex(2)), NodeKind::Action);
        assert_eq!(
            course.node_position(NodeIndex(1)),
            Some(WorldPos::new(15.0, 0.0))
        );
    }

    #[test]
    fn setup_is_one_shot() {
        let mut course = ready_course();
        // A second setup with a different course must not take.
        course.setup(
            &[NodeSpec::new(WorldPos::new(9.0, 9.0), NodeKind::Plain, 1.0)],
            &NavConfig::default(),
        );
        assert_eq!(course.num_nodes(), 3);
    }

    #[test]
    fn weights_follow_node_kind_heuristics() {
        let course = ready_course();
        let config = NavConfig::default();
        // Floor link: width / divisor.
        assert_eq!(
            course.graph().edge(NodeIndex(0), NodeIndex(1)).unwrap().cost,
            15.0 / config.floor_speed_divisor
        );
        // Action walk link.
        assert_eq!(
            course.graph().edge(NodeIndex(2), NodeIndex(1)).unwrap().cost,
            config.walk_link_weight
        );
        // Action medium jump link.
        assert_eq!(
            course.graph().edge(NodeIndex(2), NodeIndex(0)).unwrap().cost,
            config.medium_jump_weight
        );
    }

    #[test]
    fn path_ids_walks_the_course() {
        let course = ready_course();
        let path = course.path_ids(NodeIndex(0), NodeIndex(2)).unwrap();
        assert_eq!(path, vec![NodeIndex(0), NodeIndex(1), NodeIndex(2)]);
    }

    #[test]
    fn unreachable_target_degenerates_to_source() {
        let mut course = CourseGraph::new();
        // Node 2 has no inbound links.
        let specs = vec![
            NodeSpec::new(WorldPos::new(0.0, 0.0), NodeKind::Floor, 10.0)
                .link(1, walk(Facing::Right)),
            NodeSpec::new(WorldPos::new(10.0, 0.0), NodeKind::Floor, 10.0)
                .link(0, walk(Facing::Left)),
            NodeSpec::new(WorldPos::new(50.0, 20.0), NodeKind::Floor, 10.0),
        ];
        course.setup(&specs, &NavConfig::default());

        let path = course.path_ids(NodeIndex(0), NodeIndex(2)).unwrap();
        assert_eq!(path, vec![NodeIndex(0)]);
    }

    #[test]
    fn path_messages_gated_and_correct() {
        let course = ready_course();
        let path = course.path_ids(NodeIndex(0), NodeIndex(2)).unwrap();
        let lookup = course.path_messages(&path).unwrap();
        assert_eq!(lookup[&NodeIndex(0)], walk(Facing::Right));
        assert_eq!(lookup[&NodeIndex(1)], walk(Facing::Right));
        assert_eq!(lookup[&NodeIndex(2)], Message::DoNothing);
    }

    #[test]
    fn penalty_reroutes_the_path() {
        let mut course = CourseGraph::new();
        // A diamond: 0 -> 1 -> 3 and 0 -> 2 -> 3, equal weights.
        let specs = vec![
            NodeSpec::new(WorldPos::new(0.0, 0.0), NodeKind::Plain, 1.0)
                .link(1, walk(Facing::Right))
                .link(2, walk(Facing::Right)),
            NodeSpec::new(WorldPos::new(10.0, 5.0), NodeKind::Plain, 1.0)
                .link(3, walk(Facing::Right)),
            NodeSpec::new(WorldPos::new(10.0, -5.0), NodeKind::Plain, 1.0)
                .link(3, walk(Facing::Right)),
            NodeSpec::new(WorldPos::new(20.0, 0.0), NodeKind::Plain, 1.0),
        ];
        course.setup(&specs, &NavConfig::default());

        // Penalize the upper arm heavily; the route must take the lower.
        course.penalize_connection(NodeIndex(0), NodeIndex(1), 10.0);
        let path = course.path_ids(NodeIndex(0), NodeIndex(3)).unwrap();
        assert_eq!(path, vec![NodeIndex(0), NodeIndex(2), NodeIndex(3)]);
    }

    #[test]
    fn target_node_publication() {
        let mut course = ready_course();
        assert_eq!(course.target_last_node(), NodeIndex::INVALID);
        course.publish_target_node(NodeIndex(2));
        assert_eq!(course.target_last_node(), NodeIndex(2));
    }

    #[test]
    fn removing_a_node_reroutes_or_strands() {
        let mut course = ready_course();
        course.remove_node(NodeIndex(1));
        // 0 can no longer reach 2 (the only route ran through 1).
        let path = course.path_ids(NodeIndex(0), NodeIndex(2)).unwrap();
        assert_eq!(path, vec![NodeIndex(0)]);
    }
}
