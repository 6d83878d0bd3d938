// Per-agent navigation scheduler.
//
// `AgentNav` owns one agent's plan: the current path, the node -> command
// lookup derived from it, a priority queue of pending commands, and the
// locomotion state machine. Each frame `tick()` runs the machine, applies
// the direct-chase behavior once the agent shares the target's node,
// fires the periodic re-plan check, services forced re-plans, and
// dispatches the single most relevant queued command.
//
// The command queue dequeues its minimum key. On-path commands are keyed
// by the negative of their path position, so as the agent advances, the
// command for the farthest-along node it has reached outranks anything
// stale; the forced `Recalculate` uses the minimum key and preempts
// everything. The queue is cleared on every dequeue — only one command is
// ever live.
//
// Re-planning fires from two triggers, either sufficing:
// 1. a per-agent cadence timer (base interval + PRNG jitter, so a crowd
//    never searches on the same frame) while the agent is searching,
//    hasn't already planned through the target's node, and is grounded;
// 2. a node-contact off the current path, debounced by the shared jump
//    timer, which enqueues the forced `Recalculate`.
//
// A stale plan is never cancelled mid-search — search runs to completion
// within the frame and a newer plan simply overwrites `path` and the
// lookup wholesale.
//
// The trigger layer feeds `on_node_contact` with the node id and kind
// from collider overlaps; that is the scheduler's only world input besides
// the per-frame `TickInput` snapshot.
//
// See also: `nav.rs` for the course queries, `state.rs` for the machine,
// `message.rs` for the command set, `config.rs` for every tunable here.

use crate::config::NavConfig;
use crate::message::Message;
use crate::nav::CourseGraph;
use crate::state::{Controls, LocomotionState, StateMachine};
use crate::types::{AgentId, Facing, NodeIndex, NodeKind, WorldPos};
use briar_prng::GameRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Queue key for the command seeded right after a fresh plan.
const FRESH_PLAN_KEY: i32 = -1000;
/// Queue key for the forced re-plan command — outranks everything.
const FORCE_RECALCULATE_KEY: i32 = i32::MIN;

// ---------------------------------------------------------------------------
// Command priority queue
// ---------------------------------------------------------------------------

/// One queued command. Min-ordered by key, then by insertion sequence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct QueuedCommand {
    key: i32,
    sequence: u64,
    message: Message,
}

impl PartialEq for QueuedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.sequence == other.sequence
    }
}

impl Eq for QueuedCommand {}

impl PartialOrd for QueuedCommand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCommand {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the smallest (key, sequence) is "greatest" for the
        // max-heap, giving a min-queue.
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Bounded-in-practice min-queue of pending commands. Cleared on every
/// dequeue, so stale commands never accumulate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CommandQueue {
    heap: BinaryHeap<QueuedCommand>,
    next_sequence: u64,
}

impl CommandQueue {
    fn enqueue(&mut self, message: Message, key: i32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueuedCommand {
            key,
            sequence,
            message,
        });
    }

    fn dequeue(&mut self) -> Option<Message> {
        self.heap.pop().map(|c| c.message)
    }

    fn clear(&mut self) {
        self.heap.clear();
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

// ---------------------------------------------------------------------------
// Tick input
// ---------------------------------------------------------------------------

/// What the scheduler knows about the target this frame, published by the
/// target-tracking layer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// The target's last confirmed course node.
    pub node: NodeIndex,
    pub position: WorldPos,
    pub grounded: bool,
    /// Target is down — chase straight at it rather than pathing.
    pub downed: bool,
}

/// Per-frame world snapshot handed to `tick()`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TickInput {
    /// Frame delta in seconds.
    pub dt: f32,
    /// Agent is standing on a floor.
    pub grounded: bool,
    pub position: WorldPos,
    pub target: TargetSnapshot,
}

// ---------------------------------------------------------------------------
// Agent scheduler
// ---------------------------------------------------------------------------

/// One agent's navigation state and scheduler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentNav {
    id: AgentId,
    /// Node sequence from the agent's last known node to the target's
    /// last known node. Replaced wholesale on every re-plan.
    path: Vec<NodeIndex>,
    /// node -> command lookup derived from `path`.
    lookup: FxHashMap<NodeIndex, Message>,
    pub most_recent_node: NodeIndex,
    pub next_node_in_path: NodeIndex,
    queue: CommandQueue,
    fsm: StateMachine,
    pub is_searching: bool,
    /// Seconds since the last jump-type command (or forced re-plan)
    /// began; `None` when no debounce window is open.
    jump_timer: Option<f32>,
    /// Cadence accumulator for the periodic re-plan check.
    search_timer: f32,
    /// Per-agent re-plan interval: base + jitter, fixed at spawn.
    search_interval: f32,
    /// The command currently being enacted (for the animation layer).
    current_message: Message,
}

impl AgentNav {
    /// Create an agent scheduler. The re-plan interval picks up its jitter
    /// here, so each agent searches on its own cadence.
    pub fn new(id: AgentId, config: &NavConfig, rng: &mut GameRng) -> Self {
        let jitter = if config.replan_jitter_max > 0.0 {
            rng.range_f32(0.0, config.replan_jitter_max)
        } else {
            0.0
        };
        Self {
            id,
            path: Vec::new(),
            lookup: FxHashMap::default(),
            most_recent_node: NodeIndex::INVALID,
            next_node_in_path: NodeIndex::INVALID,
            queue: CommandQueue::default(),
            fsm: StateMachine::new(),
            is_searching: false,
            jump_timer: None,
            search_timer: 0.0,
            search_interval: config.replan_interval + jitter,
            current_message: Message::DoNothing,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn path(&self) -> &[NodeIndex] {
        &self.path
    }

    pub fn current_message(&self) -> Message {
        self.current_message
    }

    pub fn search_interval(&self) -> f32 {
        self.search_interval
    }

    /// Queued command count — diagnostics and tests only.
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// One frame step. Returns the control outputs for the movement layer.
    pub fn tick(&mut self, course: &CourseGraph, config: &NavConfig, input: &TickInput) -> Controls {
        let mut controls = Controls::default();

        // The debounce window opens at zero (jump entry or forced
        // re-plan) and advances with real time.
        if let Some(t) = self.jump_timer.as_mut() {
            *t += input.dt;
        }

        self.fsm
            .update(input.dt, &mut self.jump_timer, &mut controls);

        self.drive_chase_mode(input, &mut controls);
        self.run_periodic_replan(course, config, input);
        self.dispatch_pending_command(config, &mut controls);

        // A `Recalculate` entered during dispatch raises this flag.
        if self.fsm.take_replan_request() {
            self.replan(course);
        }

        controls
    }

    /// Once the agent occupies the target's node, pathing is pointless:
    /// walk straight at the target's horizontal position while it is
    /// grounded (or downed), idle while it is airborne. Anywhere else,
    /// the agent is searching.
    fn drive_chase_mode(&mut self, input: &TickInput, controls: &mut Controls) {
        if !(self.most_recent_node.is_valid() && self.most_recent_node == input.target.node) {
            self.is_searching = true;
            return;
        }

        if input.target.grounded || input.target.downed {
            self.is_searching = false;
            let facing = if input.target.position.x < input.position.x {
                Facing::Left
            } else {
                Facing::Right
            };
            if self.fsm.moving() != Some(facing) {
                self.fsm.change_state(
                    LocomotionState::walk(facing),
                    &mut self.jump_timer,
                    controls,
                );
            }
        } else if !self.fsm.is_idle() {
            self.is_searching = false;
            self.fsm
                .change_state(LocomotionState::idle(), &mut self.jump_timer, controls);
        }
    }

    /// The fixed-cadence re-plan trigger. Fires at most once per interval;
    /// the search itself runs synchronously inside this call.
    fn run_periodic_replan(&mut self, course: &CourseGraph, config: &NavConfig, input: &TickInput) {
        self.search_timer += input.dt;
        if self.search_timer < self.search_interval {
            return;
        }
        self.search_timer = 0.0;

        let target_node = course.target_last_node();
        if self.is_searching
            && target_node.is_valid()
            && !self.path.contains(&target_node)
            && self.most_recent_node != target_node
            && input.grounded
            && input.position.distance(input.target.position) <= config.seek_range
        {
            self.replan(course);
        }
    }

    /// Pop the single most relevant command, flush the rest, and enact it.
    fn dispatch_pending_command(&mut self, config: &NavConfig, controls: &mut Controls) {
        let Some(message) = self.queue.dequeue() else {
            return;
        };
        self.queue.clear();
        self.current_message = message;

        let next_state = match message {
            Message::DoNothing => {
                self.is_searching = false;
                LocomotionState::idle()
            }
            Message::Walk(facing) => LocomotionState::walk(facing),
            Message::Jump { facing, power } => {
                LocomotionState::jump(facing, config.jump_hold(power))
            }
            Message::JumpUp(power) => LocomotionState::jump_up(config.jump_hold(power)),
            Message::Dodge(facing) => LocomotionState::dodge(facing),
            Message::Recalculate => LocomotionState::Recalculate,
        };
        self.fsm
            .change_state(next_state, &mut self.jump_timer, controls);
    }

    /// Discard the current plan and route from the agent's last known node
    /// to the target's last known node, reseeding the command queue with
    /// the command for the node the agent is standing on.
    fn replan(&mut self, course: &CourseGraph) {
        let target_node = course.target_last_node();
        if !self.most_recent_node.is_valid() || !target_node.is_valid() {
            return;
        }
        let Some(path) = course.path_ids(self.most_recent_node, target_node) else {
            return;
        };
        self.lookup = course.path_messages(&path).unwrap_or_default();
        self.path = path;

        self.queue.clear();
        if let Some(&message) = self.lookup.get(&self.most_recent_node) {
            self.queue.enqueue(message, FRESH_PLAN_KEY);
        }
        self.is_searching = true;
    }

    /// Trigger-layer input: the agent's collider overlapped the trigger
    /// volume of a course node. Advances the path bookkeeping and decides
    /// whether a command (or a forced re-plan) gets queued.
    pub fn on_node_contact(&mut self, course: &CourseGraph, config: &NavConfig, node: NodeIndex) {
        let kind = course.node_kind(node);

        if !self.is_searching {
            self.most_recent_node = node;
        }

        if self.path.is_empty() {
            self.most_recent_node = node;
            return;
        }

        let path_position = self.path.iter().position(|&n| n == node);

        // Double-jump markers hang in mid-air; one that is not the
        // designated next node must not disturb an airborne agent.
        if path_position.is_some()
            && node != self.next_node_in_path
            && kind == NodeKind::DoubleJump
        {
            return;
        }

        if let Some(position) = path_position {
            if !self.is_searching {
                return;
            }
            self.most_recent_node = node;
            if position != self.path.len() - 1 {
                self.next_node_in_path = self.path[position + 1];
            }

            // Already walking the right way — re-issuing the same walk
            // would just churn the state machine.
            if let (Some(facing), Some(&Message::Walk(message_facing))) =
                (self.fsm.moving(), self.lookup.get(&node))
            {
                if facing == message_facing {
                    return;
                }
            }

            if let Some(&message) = self.lookup.get(&node) {
                self.queue.enqueue(message, -(position as i32));
            }
        } else if kind == NodeKind::DoubleJump {
            // Off-path mid-air marker: ignore entirely.
        } else if self.is_searching && self.debounce_allows_replan(config) {
            self.most_recent_node = node;
            self.queue.enqueue(Message::Recalculate, FORCE_RECALCULATE_KEY);
            // Opening the window here is what bounds rapid off-path
            // contacts to a single forced re-plan.
            self.jump_timer = Some(0.0);
        }
    }

    /// True when no debounce window is open, or the open one has elapsed.
    fn debounce_allows_replan(&self, config: &NavConfig) -> bool {
        match self.jump_timer {
            None => true,
            Some(t) => t >= config.jump_debounce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NodeSpec;
    use crate::types::JumpPower;

    const DT: f32 = 0.016;

    /// Four floor nodes in a row, walk-linked both ways, plus a detached
    /// action node (4) off the main line used for off-path contacts.
    fn course() -> CourseGraph {
        let walk_r = Message::Walk(Facing::Right);
        let walk_l = Message::Walk(Facing::Left);
        let specs = vec![
            NodeSpec::new(WorldPos::new(0.0, 0.0), NodeKind::Floor, 10.0).link(1, walk_r),
            NodeSpec::new(WorldPos::new(10.0, 0.0), NodeKind::Floor, 10.0)
                .link(0, walk_l)
                .link(2, walk_r),
            NodeSpec::new(WorldPos::new(20.0, 0.0), NodeKind::Floor, 10.0)
                .link(1, walk_l)
                .link(3, walk_r),
            NodeSpec::new(WorldPos::new(30.0, 0.0), NodeKind::Floor, 10.0).link(2, walk_l),
            NodeSpec::new(WorldPos::new(5.0, 8.0), NodeKind::Action, 1.0).link(
                1,
                Message::Jump {
                    facing: Facing::Right,
                    power: JumpPower::P2,
                },
            ),
        ];
        let mut course = CourseGraph::new();
        course.setup(&specs, &NavConfig::default());
        course
    }

    fn agent(config: &NavConfig) -> AgentNav {
        let mut rng = GameRng::new(42);
        AgentNav::new(AgentId(0), config, &mut rng)
    }

    fn input_at(target_node: NodeIndex, agent_x: f32, target_x: f32) -> TickInput {
        TickInput {
            dt: DT,
            grounded: true,
            position: WorldPos::new(agent_x, 0.0),
            target: TargetSnapshot {
                node: target_node,
                position: WorldPos::new(target_x, 0.0),
                grounded: true,
                downed: false,
            },
        }
    }

    #[test]
    fn interval_picks_up_jitter() {
        let config = NavConfig::default();
        let nav = agent(&config);
        assert!(nav.search_interval() >= config.replan_interval);
        assert!(nav.search_interval() < config.replan_interval + config.replan_jitter_max);
    }

    #[test]
    fn idle_without_a_plan() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);

        let controls = nav.tick(&course, &config, &input_at(NodeIndex(3), 0.0, 30.0));
        assert_eq!(controls.move_x, 0.0);
        assert!(!controls.jump_pressed);
        assert!(nav.path().is_empty());
    }

    #[test]
    fn periodic_replan_builds_path_and_walks() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));

        // Establish the agent's node via a contact (no plan yet).
        nav.on_node_contact(&world, &config, NodeIndex(0));
        assert_eq!(nav.most_recent_node, NodeIndex(0));

        // Run past the jittered interval; the cadence check re-plans.
        let steps = (nav.search_interval() / DT) as usize + 2;
        let input = input_at(NodeIndex(3), 0.0, 30.0);
        for _ in 0..steps {
            nav.tick(&world, &config, &input);
        }
        assert_eq!(
            nav.path(),
            &[NodeIndex(0), NodeIndex(1), NodeIndex(2), NodeIndex(3)]
        );

        // The seeded command has been dispatched: walk right.
        nav.tick(&world, &config, &input);
        assert_eq!(nav.current_message(), Message::Walk(Facing::Right));
    }

    #[test]
    fn periodic_replan_requires_grounded() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        nav.on_node_contact(&world, &config, NodeIndex(0));

        let mut input = input_at(NodeIndex(3), 0.0, 30.0);
        input.grounded = false;
        let steps = (nav.search_interval() / DT) as usize + 2;
        for _ in 0..steps {
            nav.tick(&world, &config, &input);
        }
        assert!(nav.path().is_empty());
    }

    #[test]
    fn periodic_replan_respects_seek_range() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        nav.on_node_contact(&world, &config, NodeIndex(0));

        // Target far beyond seek range.
        let input = input_at(NodeIndex(3), 0.0, config.seek_range * 3.0);
        let steps = (nav.search_interval() / DT) as usize + 2;
        for _ in 0..steps {
            nav.tick(&world, &config, &input);
        }
        assert!(nav.path().is_empty());
    }

    /// Plant a plan from node 0 to node 3 directly via the forced path.
    fn plant_plan(nav: &mut AgentNav, world: &CourseGraph, config: &NavConfig) {
        nav.on_node_contact(world, config, NodeIndex(0));
        let steps = (nav.search_interval() / DT) as usize + 2;
        let input = input_at(NodeIndex(3), 0.0, 30.0);
        for _ in 0..steps {
            nav.tick(world, config, &input);
        }
        assert!(!nav.path().is_empty());
    }

    #[test]
    fn contact_advances_path_bookkeeping() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        plant_plan(&mut nav, &world, &config);

        // The agent is already walking right and node 1's command is also
        // walk-right, so bookkeeping advances without a re-issue.
        nav.on_node_contact(&world, &config, NodeIndex(1));
        assert_eq!(nav.most_recent_node, NodeIndex(1));
        assert_eq!(nav.next_node_in_path, NodeIndex(2));
        assert_eq!(nav.pending_commands(), 0);

        // The final node's arrival command is different and does queue.
        nav.on_node_contact(&world, &config, NodeIndex(3));
        assert_eq!(nav.most_recent_node, NodeIndex(3));
        assert_eq!(nav.pending_commands(), 1);
    }

    #[test]
    fn redundant_walk_is_not_reissued() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        plant_plan(&mut nav, &world, &config);

        // Dispatch the seeded walk-right command.
        let input = input_at(NodeIndex(3), 0.0, 30.0);
        nav.tick(&world, &config, &input);
        assert_eq!(nav.current_message(), Message::Walk(Facing::Right));
        assert_eq!(nav.pending_commands(), 0);

        // Contact with the next node, whose command is also walk-right:
        // bookkeeping advances but nothing is queued.
        nav.on_node_contact(&world, &config, NodeIndex(1));
        assert_eq!(nav.most_recent_node, NodeIndex(1));
        assert_eq!(nav.pending_commands(), 0);
    }

    #[test]
    fn off_path_contact_forces_recalculate_once_per_window() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        plant_plan(&mut nav, &world, &config);

        // Node 4 is not on the plan: force a re-plan.
        nav.on_node_contact(&world, &config, NodeIndex(4));
        assert_eq!(nav.pending_commands(), 1);
        assert_eq!(nav.most_recent_node, NodeIndex(4));

        // A second off-path contact inside the debounce window is ignored.
        nav.on_node_contact(&world, &config, NodeIndex(4));
        assert_eq!(nav.pending_commands(), 1);
    }

    #[test]
    fn forced_recalculate_replans_from_new_node() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        plant_plan(&mut nav, &world, &config);

        nav.on_node_contact(&world, &config, NodeIndex(4));
        let input = input_at(NodeIndex(3), 5.0, 30.0);
        // One tick dispatches Recalculate and services the re-plan.
        nav.tick(&world, &config, &input);
        assert_eq!(nav.current_message(), Message::Recalculate);
        assert_eq!(nav.path().first(), Some(&NodeIndex(4)));
        assert_eq!(nav.path().last(), Some(&NodeIndex(3)));
    }

    #[test]
    fn direct_chase_walks_toward_target() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);

        // Agent's node equals the target's node; target stands to the left.
        nav.on_node_contact(&course, &config, NodeIndex(2));
        let input = input_at(NodeIndex(2), 20.0, 4.0);
        nav.tick(&course, &config, &input);
        let controls = nav.tick(&course, &config, &input);
        assert_eq!(controls.move_x, -1.0);
        assert!(!nav.is_searching);
    }

    #[test]
    fn direct_chase_idles_while_target_airborne() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);

        nav.on_node_contact(&course, &config, NodeIndex(2));
        let mut input = input_at(NodeIndex(2), 20.0, 4.0);
        nav.tick(&course, &config, &input);
        // Walking now; target leaves the ground.
        input.target.grounded = false;
        nav.tick(&course, &config, &input);
        let controls = nav.tick(&course, &config, &input);
        assert_eq!(controls.move_x, 0.0);
    }

    #[test]
    fn double_jump_contact_off_path_is_ignored() {
        let walk_r = Message::Walk(Facing::Right);
        let specs = vec![
            NodeSpec::new(WorldPos::new(0.0, 0.0), NodeKind::Floor, 10.0).link(1, walk_r),
            NodeSpec::new(WorldPos::new(10.0, 0.0), NodeKind::Floor, 10.0).link(0, walk_r),
            NodeSpec::new(WorldPos::new(5.0, 12.0), NodeKind::DoubleJump, 1.0).link(1, walk_r),
        ];
        let mut world = CourseGraph::new();
        let config = NavConfig::default();
        world.setup(&specs, &config);
        world.publish_target_node(NodeIndex(1));

        let mut nav = agent(&config);
        nav.on_node_contact(&world, &config, NodeIndex(0));
        let steps = (nav.search_interval() / DT) as usize + 2;
        let input = input_at(NodeIndex(1), 0.0, 10.0);
        for _ in 0..steps {
            nav.tick(&world, &config, &input);
        }
        assert_eq!(nav.path(), &[NodeIndex(0), NodeIndex(1)]);

        // The mid-air marker is not on the plan: no forced re-plan, no
        // bookkeeping change.
        nav.on_node_contact(&world, &config, NodeIndex(2));
        assert_eq!(nav.pending_commands(), 0);
        assert_eq!(nav.most_recent_node, NodeIndex(0));
    }

    #[test]
    fn serialization_roundtrip() {
        let course = course();
        let config = NavConfig::default();
        let mut nav = agent(&config);
        let mut world = course.clone();
        world.publish_target_node(NodeIndex(3));
        plant_plan(&mut nav, &world, &config);

        let json = serde_json::to_string(&nav).unwrap();
        let restored: AgentNav = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.path(), nav.path());
        assert_eq!(restored.most_recent_node, nav.most_recent_node);
    }
}
