// Data-driven navigation tuning.
//
// Every tunable in the navigation layer lives in `NavConfig`, loadable from
// JSON at startup — behavior code reads from the config and never carries
// magic numbers, so balance passes don't require recompilation.
//
// The defaults are the shipped balance: jump-input hold durations per
// power tier, the re-plan cadence and its per-agent jitter window, the
// jump debounce filter, the edge-weight heuristics used when the course
// graph is assembled, and the spawn-director knobs.
//
// See also: `nav.rs` which reads the weight heuristics at setup,
// `agent.rs` for the cadence/debounce consumers, `spawn.rs` for the
// spawn-director knobs.

use crate::types::JumpPower;
use serde::{Deserialize, Serialize};

/// All tunable parameters of the navigation layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Jump-input hold duration in seconds per power tier (P1..P5).
    pub jump_hold_durations: [f32; 5],

    /// Base seconds between periodic re-plan checks.
    pub replan_interval: f32,
    /// Per-agent random addition to `replan_interval`, in [0, this).
    /// Spreads a crowd's searches across frames.
    pub replan_jitter_max: f32,
    /// Seconds that must pass after a jump-type command (or a forced
    /// re-plan) before an off-path contact may force another re-plan.
    pub jump_debounce: f32,
    /// Agents farther than this from the target stop chasing.
    pub seek_range: f32,

    /// Edge weight for walk links out of action nodes.
    pub walk_link_weight: f32,
    /// Edge weight for short hops (P1/P2).
    pub short_jump_weight: f32,
    /// Edge weight for the mid-range arc (P3).
    pub medium_jump_weight: f32,
    /// Edge weight for long jumps, vertical jumps, and dodges.
    pub long_jump_weight: f32,
    /// Edge weight for links out of unclassified nodes.
    pub plain_link_weight: f32,
    /// Floor-node link weight = collider width / this divisor.
    pub floor_speed_divisor: f32,

    /// Most agents alive at once per spawn director.
    pub spawn_max_active: usize,
    /// Base seconds per spawn wave.
    pub spawn_wave_seconds: f32,
    /// Lower bound of the jittered wave delay for fixed spawners.
    pub spawn_min_delay: f32,
    /// Lower bound of the jittered wave delay for target-following spawners.
    pub follow_min_delay: f32,
    /// Following spawners stretch the wave interval by this factor.
    pub follow_wave_multiplier: f32,
    /// Spawners farther than this from the target hold their wave.
    pub spawn_range: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            jump_hold_durations: [0.05, 0.1, 0.2, 0.4, 0.8],
            replan_interval: 1.0,
            replan_jitter_max: 0.1,
            jump_debounce: 0.05,
            seek_range: 50.0,
            walk_link_weight: 0.1,
            short_jump_weight: 1.0,
            medium_jump_weight: 1.5,
            long_jump_weight: 2.0,
            plain_link_weight: 1.0,
            floor_speed_divisor: 15.0,
            spawn_max_active: 10,
            spawn_wave_seconds: 5.0,
            spawn_min_delay: 1.5,
            follow_min_delay: 0.5,
            follow_wave_multiplier: 1.5,
            spawn_range: 80.0,
        }
    }
}

impl NavConfig {
    /// Hold duration for a jump power tier.
    pub fn jump_hold(&self, power: JumpPower) -> f32 {
        self.jump_hold_durations[power.slot()]
    }

    /// Load a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the config as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
