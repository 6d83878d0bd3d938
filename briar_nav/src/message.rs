// Locomotion commands and the per-hop command table.
//
// A `Message` is the abstract instruction an agent enacts upon entering a
// course node: walk, one of the jump variants, dodge, the forced re-plan
// marker, or nothing. The movement layer consumes these through the
// scheduler; nothing here knows about velocity or collision.
//
// The `MessageTable` is a dense node-by-node table built once at course
// setup: the command to traverse from node `u` to node `v` is `get(u, v)`,
// defaulting to `DoNothing` for pairs with no direct connection. Given a
// path, `path_messages` flattens the table into a per-node lookup the
// scheduler indexes as the agent reaches each node.
//
// See also: `nav.rs` which fills the table during setup, `agent.rs` which
// consumes the lookup, `state.rs` for the states each command maps to.

use crate::types::{Facing, JumpPower, NodeIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// An abstract locomotion instruction tied to entering a course node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Message {
    /// Stand still (also the arrival command for the final path node).
    #[default]
    DoNothing,
    /// Walk toward the given side.
    Walk(Facing),
    /// Arcing jump: hold the jump input for the power's duration while
    /// steering toward the given side.
    Jump { facing: Facing, power: JumpPower },
    /// Vertical jump with no horizontal steering.
    JumpUp(JumpPower),
    /// Dodge-roll toward the given side.
    Dodge(Facing),
    /// Force the agent to discard its plan and re-route.
    Recalculate,
}

impl Message {
    /// True for commands that leave the ground — these arm the shared
    /// jump debounce timer.
    pub fn is_jump_type(self) -> bool {
        matches!(
            self,
            Message::Jump { .. } | Message::JumpUp(_) | Message::Dodge(_)
        )
    }
}

/// Dense node-by-node command table. `get(u, v)` answers "what command
/// traverses the `u -> v` hop"; unconnected pairs hold `DoNothing`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageTable {
    size: usize,
    cells: Vec<Message>,
}

impl MessageTable {
    /// A table for `size` nodes, every cell `DoNothing`.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Message::DoNothing; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Record the command for the directed `from -> to` hop.
    pub fn set(&mut self, from: NodeIndex, to: NodeIndex, message: Message) {
        assert!(
            from.is_valid() && to.is_valid() && from.idx() < self.size && to.idx() < self.size,
            "MessageTable::set out of range ({from} -> {to})"
        );
        self.cells[from.idx() * self.size + to.idx()] = message;
    }

    /// The command for the directed `from -> to` hop.
    pub fn get(&self, from: NodeIndex, to: NodeIndex) -> Message {
        if from.is_valid() && to.is_valid() && from.idx() < self.size && to.idx() < self.size {
            self.cells[from.idx() * self.size + to.idx()]
        } else {
            Message::DoNothing
        }
    }

    /// Flatten a path into a per-node command lookup: each node maps to
    /// the command for the hop toward its successor, and the final node
    /// maps to `DoNothing` (arrival). `None` for an empty path.
    pub fn path_messages(&self, path: &[NodeIndex]) -> Option<FxHashMap<NodeIndex, Message>> {
        if path.is_empty() {
            return None;
        }
        let mut lookup = FxHashMap::default();
        for pair in path.windows(2) {
            lookup.insert(pair[0], self.get(pair[0], pair[1]));
        }
        lookup.insert(path[path.len() - 1], Message::DoNothing);
        Some(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_defaults_to_do_nothing() {
        let table = MessageTable::new(3);
        assert_eq!(table.get(NodeIndex(0), NodeIndex(2)), Message::DoNothing);
        assert_eq!(table.get(NodeIndex(2), NodeIndex(0)), Message::DoNothing);
    }

    #[test]
    fn set_is_directional() {
        let mut table = MessageTable::new(2);
        table.set(NodeIndex(0), NodeIndex(1), Message::Walk(Facing::Right));
        assert_eq!(
            table.get(NodeIndex(0), NodeIndex(1)),
            Message::Walk(Facing::Right)
        );
        assert_eq!(table.get(NodeIndex(1), NodeIndex(0)), Message::DoNothing);
    }

    #[test]
    fn path_messages_maps_hops_and_arrival() {
        let mut table = MessageTable::new(3);
        table.set(NodeIndex(0), NodeIndex(1), Message::Walk(Facing::Right));
        table.set(
            NodeIndex(1),
            NodeIndex(2),
            Message::Jump {
                facing: Facing::Right,
                power: JumpPower::P2,
            },
        );

        let path = [NodeIndex(0), NodeIndex(1), NodeIndex(2)];
        let lookup = table.path_messages(&path).unwrap();
        assert_eq!(lookup[&NodeIndex(0)], Message::Walk(Facing::Right));
        assert_eq!(
            lookup[&NodeIndex(1)],
            Message::Jump {
                facing: Facing::Right,
                power: JumpPower::P2,
            }
        );
        assert_eq!(lookup[&NodeIndex(2)], Message::DoNothing);
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn path_messages_empty_path_is_none() {
        let table = MessageTable::new(3);
        assert!(table.path_messages(&[]).is_none());
    }

    #[test]
    fn path_messages_single_node_is_arrival_only() {
        let table = MessageTable::new(3);
        let lookup = table.path_messages(&[NodeIndex(1)]).unwrap();
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup[&NodeIndex(1)], Message::DoNothing);
    }

    #[test]
    fn jump_type_classification() {
        assert!(Message::Jump {
            facing: Facing::Left,
            power: JumpPower::P1
        }
        .is_jump_type());
        assert!(Message::JumpUp(JumpPower::P3).is_jump_type());
        assert!(Message::Dodge(Facing::Right).is_jump_type());
        assert!(!Message::Walk(Facing::Left).is_jump_type());
        assert!(!Message::DoNothing.is_jump_type());
        assert!(!Message::Recalculate.is_jump_type());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::Jump {
            facing: Facing::Left,
            power: JumpPower::P4,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let restored: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, msg);
    }
}
