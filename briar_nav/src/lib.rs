// briar_nav — AI navigation layer for Briar.
//
// This crate contains the pursuit AI's navigation logic for Briar: the
// sparse course graph, the searches over it, and the per-agent scheduler
// that turns path segments into time-boxed locomotion commands. It has
// zero engine dependencies and runs headless — the movement, animation,
// and collision layers talk to it only through the narrow contracts in
// `agent.rs` and `nav.rs`.
//
// Module overview:
// - `types.rs`:   NodeIndex (+ invalid sentinel), NodeKind, Facing, JumpPower, AgentId, WorldPos.
// - `graph.rs`:   SparseGraph — node table, adjacency lists, logical removal with batched culling.
// - `pqueue.rs`:  IndexedMinHeap — re-keyable min-heap for the Dijkstra relaxation loop.
// - `search.rs`:  BFS, DFS, Dijkstra, Prim spanning tree.
// - `message.rs`: Locomotion command set + the node-by-node MessageTable.
// - `nav.rs`:     CourseGraph — course assembly, setup gate, path queries, target tracking.
// - `state.rs`:   Locomotion state machine (enter/execute/exit over a closed variant set).
// - `agent.rs`:   AgentNav — per-agent command queue, re-plan triggers, frame tick.
// - `spawn.rs`:   SpawnDirector — wave cadence + the active-agent registry.
// - `config.rs`:  NavConfig — every tunable, JSON-loadable.
// - `prng`:       Re-exported from `briar_prng` — xoshiro256++ with SplitMix64 seeding.
//
// The graph is built once at level start and then treated as frozen apart
// from cost updates and rare node removal; every agent's search and the
// message translation read it within the same frame, never interleaved
// with a write. Searches run synchronously to completion — a stale plan
// is discarded by overwriting it, never cancelled.
//
// **Critical constraint: determinism.** All randomness (re-plan jitter,
// spawn cadence, spanning-tree starts) flows from seeded `GameRng`
// instances. No system time, no OS entropy, no hash-order dependence.

pub mod agent;
pub mod config;
pub mod graph;
pub mod message;
pub mod nav;
pub mod pqueue;
pub use briar_prng as prng;
pub mod search;
pub mod spawn;
pub mod state;
pub mod types;
