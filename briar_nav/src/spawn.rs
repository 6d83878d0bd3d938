// Spawn director — wave cadence and the active-agent registry.
//
// The director owns the count of agents it has alive; there is no
// process-wide counter. Claiming a slot happens inside `tick()` the moment
// a `SpawnRequest` is issued, and the slot returns through `despawn()`
// when the entity layer reports the agent gone. Two directors never share
// state.
//
// Waves fire on a jittered cadence: fixed directors roll their delay in
// [spawn_min_delay, wave), target-following directors relocate onto the
// target each wave and roll in [follow_min_delay, wave * multiplier) —
// following spawners pressure the player constantly, so they fire less
// often. A wave only produces an agent while the director is within spawn
// range of the target and below its active cap.
//
// See also: `config.rs` for the knobs, `agent.rs` for what the spawned
// agent runs.

use crate::config::NavConfig;
use crate::types::{AgentId, WorldPos};
use briar_prng::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An instruction to the entity layer: create one agent here.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub agent: AgentId,
    pub position: WorldPos,
}

/// Owns one spawn point's cadence and its share of the live-agent count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpawnDirector {
    position: WorldPos,
    /// Relocate onto the target each wave (roaming pressure spawner).
    follow_target: bool,
    next_agent: u32,
    /// Agents this director has alive. BTreeSet for deterministic order.
    active: BTreeSet<AgentId>,
    timer: f32,
    next_wave_in: f32,
}

impl SpawnDirector {
    pub fn new(
        position: WorldPos,
        follow_target: bool,
        config: &NavConfig,
        rng: &mut GameRng,
    ) -> Self {
        let mut director = Self {
            position,
            follow_target,
            next_agent: 0,
            active: BTreeSet::new(),
            timer: 0.0,
            next_wave_in: 0.0,
        };
        director.next_wave_in = director.roll_delay(config, rng);
        director
    }

    pub fn position(&self) -> WorldPos {
        self.position
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance the cadence. At each wave boundary, decide whether an agent
    /// spawns: requires a known target position, a free slot under the
    /// cap, and the target within spawn range. Claiming the slot happens
    /// here, not when the entity materializes.
    pub fn tick(
        &mut self,
        dt: f32,
        config: &NavConfig,
        rng: &mut GameRng,
        target_position: Option<WorldPos>,
    ) -> Option<SpawnRequest> {
        self.timer += dt;
        if self.timer < self.next_wave_in {
            return None;
        }
        self.timer = 0.0;
        self.next_wave_in = self.roll_delay(config, rng);

        let target = target_position?;
        if self.follow_target {
            self.position = target;
        }
        if self.active.len() >= config.spawn_max_active {
            return None;
        }
        if self.position.distance(target) > config.spawn_range {
            return None;
        }

        let agent = AgentId(self.next_agent);
        self.next_agent += 1;
        self.active.insert(agent);
        Some(SpawnRequest {
            agent,
            position: self.position,
        })
    }

    /// Return an agent's slot. Called by the entity layer on despawn.
    pub fn despawn(&mut self, agent: AgentId) {
        self.active.remove(&agent);
    }

    fn roll_delay(&self, config: &NavConfig, rng: &mut GameRng) -> f32 {
        if self.follow_target {
            rng.range_f32(
                config.follow_min_delay,
                config.spawn_wave_seconds * config.follow_wave_multiplier,
            )
        } else {
            rng.range_f32(config.spawn_min_delay, config.spawn_wave_seconds)
        }
    }
}
