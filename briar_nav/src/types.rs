// Core types shared across the navigation layer.
//
// Defines the compact node handle (`NodeIndex` with its invalid sentinel),
// the node classification used by the trigger layer, facing/jump-power
// enums consumed by the locomotion command set, agent handles, and the 2D
// world position. All types derive `Serialize`/`Deserialize` so course and
// agent state can be snapshotted as JSON.
//
// **Critical constraint: determinism.** Handles are plain integers assigned
// sequentially; nothing here touches OS entropy or system time.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Node handles
// ---------------------------------------------------------------------------

/// Stable integer handle for a graph vertex.
///
/// Indices are assigned sequentially at build time and are never reused
/// within a session — a removed node keeps its slot, marked with
/// [`NodeIndex::INVALID`], so outstanding handles stay meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub i32);

impl NodeIndex {
    /// Sentinel marking a logically removed node (or "no node").
    pub const INVALID: NodeIndex = NodeIndex(-1);

    /// True if this handle is not the invalid sentinel.
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// The handle as a table index. Callers must check `is_valid` first.
    pub fn idx(self) -> usize {
        debug_assert!(self.is_valid(), "NodeIndex::idx on invalid handle");
        self.0 as usize
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of a course node, used by the trigger layer to filter
/// which contacts may enqueue commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Unclassified node.
    #[default]
    Plain,
    /// Carries jump/dodge commands in addition to walk links.
    Action,
    /// Walkable floor span.
    Floor,
    /// Wall-mounted node (wall climbing routes).
    Wall,
    /// Mid-air node for double jumps. Contacts with these are ignored
    /// unless the node is the designated next node in the agent's path,
    /// so airborne agents don't re-plan off a stray overlap.
    DoubleJump,
}

// ---------------------------------------------------------------------------
// Locomotion vocabulary
// ---------------------------------------------------------------------------

/// Horizontal facing for walk, jump, and dodge commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, +1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// How long the jump input is held. Longer holds arc higher and farther;
/// the hold duration for each power lives in `NavConfig`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JumpPower {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl JumpPower {
    /// Index into the config's hold-duration table.
    pub fn slot(self) -> usize {
        match self {
            JumpPower::P1 => 0,
            JumpPower::P2 => 1,
            JumpPower::P3 => 2,
            JumpPower::P4 => 3,
            JumpPower::P5 => 4,
        }
    }

    /// True for the short hops (P1/P2) used between near ledges.
    pub fn is_short(self) -> bool {
        matches!(self, JumpPower::P1 | JumpPower::P2)
    }

    /// True for the mid-range arc (P3).
    pub fn is_medium(self) -> bool {
        matches!(self, JumpPower::P3)
    }
}

// ---------------------------------------------------------------------------
// Agent handles
// ---------------------------------------------------------------------------

/// Compact handle for a spawned agent, assigned by the spawn director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// A 2D world-space position. X grows rightward, Y grows upward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two positions.
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
