// Locomotion states and the per-agent state machine.
//
// Each state is one variant of a closed set — `DoNothing`, `Move`, `Jump`,
// `JumpStraightUp`, `Dodge`, `Recalculate` — with its timers carried in
// the variant itself. Enter/execute/exit behavior is matched in one place
// per phase rather than spread across trait objects, so the whole
// transition surface is readable top to bottom.
//
// Transitions are driven externally by the scheduler's message queue; the
// single exception is `DoNothing` with a nonzero duration, which expires
// back to the previous state on its own.
//
// A state's only output channel is the `Controls` record accumulated
// during the tick — directional input, jump press/release edges, dodge
// trigger, sprint hold, and a momentum-cancel flag. The movement layer
// consumes `Controls`; no state ever touches physics directly.
//
// The jump debounce timer is shared agent state threaded through enter and
// exit: jump-type states arm it on entry and clear it on exit; the
// scheduler advances it each frame and reads it to filter off-path
// re-plan triggers.
//
// See also: `agent.rs`, the sole driver of this machine; `message.rs` for
// the commands that map onto these states.

use crate::types::Facing;
use serde::{Deserialize, Serialize};

/// Per-tick control outputs handed to the movement layer.
///
/// `jump_pressed`/`jump_released` are edge events; `sprint` is a hold.
/// `cancel_momentum` asks the movement layer to drop horizontal velocity
/// before a direction reversal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// Directional input on the x axis: -1, 0, or +1.
    pub move_x: f32,
    pub jump_pressed: bool,
    pub jump_released: bool,
    pub dodge: Option<Facing>,
    pub sprint: bool,
    pub cancel_momentum: bool,
}

/// One locomotion state, timers included.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LocomotionState {
    /// Stand still. With `duration > 0`, expires back to the previous
    /// state once the timer runs out.
    DoNothing { duration: f32, timer: f32 },
    /// Walk (optionally sprint) toward a side.
    Move { facing: Facing, sprint: bool },
    /// Arcing jump: press on the first frame, steer sideways, release
    /// after holding for `duration`.
    Jump {
        facing: Facing,
        duration: f32,
        timer: f32,
        has_jumped: bool,
    },
    /// Vertical jump with no steering.
    JumpStraightUp {
        duration: f32,
        timer: f32,
        has_jumped: bool,
    },
    /// Dodge-roll toward a side.
    Dodge { facing: Facing, has_dodged: bool },
    /// Request a fresh plan from the scheduler.
    Recalculate,
}

impl LocomotionState {
    pub fn idle() -> Self {
        LocomotionState::DoNothing {
            duration: 0.0,
            timer: 0.0,
        }
    }

    pub fn idle_for(duration: f32) -> Self {
        LocomotionState::DoNothing {
            duration: duration.abs(),
            timer: 0.0,
        }
    }

    pub fn walk(facing: Facing) -> Self {
        LocomotionState::Move {
            facing,
            sprint: false,
        }
    }

    pub fn jump(facing: Facing, duration: f32) -> Self {
        LocomotionState::Jump {
            facing,
            duration,
            timer: 0.0,
            has_jumped: false,
        }
    }

    pub fn jump_up(duration: f32) -> Self {
        LocomotionState::JumpStraightUp {
            duration,
            timer: 0.0,
            has_jumped: false,
        }
    }

    pub fn dodge(facing: Facing) -> Self {
        LocomotionState::Dodge {
            facing,
            has_dodged: false,
        }
    }
}

/// Holds the current and previous locomotion states and runs the
/// enter/execute/exit protocol. Transition decisions live in the
/// scheduler, not here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateMachine {
    current: LocomotionState,
    previous: LocomotionState,
    /// Raised by `Recalculate` on entry; drained by the scheduler.
    pending_replan: bool,
    /// Directional input emitted last tick — used to detect reversals.
    last_move_x: f32,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: LocomotionState::idle(),
            previous: LocomotionState::idle(),
            pending_replan: false,
            last_move_x: 0.0,
        }
    }

    pub fn current(&self) -> &LocomotionState {
        &self.current
    }

    /// The facing of an active `Move` state, if that's what's running.
    pub fn moving(&self) -> Option<Facing> {
        match self.current {
            LocomotionState::Move { facing, .. } => Some(facing),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.current, LocomotionState::DoNothing { .. })
    }

    /// Drain the re-plan request raised by a `Recalculate` entry.
    pub fn take_replan_request(&mut self) -> bool {
        std::mem::take(&mut self.pending_replan)
    }

    /// Exit the current state, swap in `new`, and run its entry behavior.
    pub fn change_state(
        &mut self,
        new: LocomotionState,
        jump_timer: &mut Option<f32>,
        controls: &mut Controls,
    ) {
        self.exit_current(jump_timer, controls);
        self.previous = std::mem::replace(&mut self.current, new);
        self.enter_current(jump_timer, controls);
    }

    /// Swap back to the previous state (DoNothing expiry path).
    pub fn revert_to_previous(&mut self, jump_timer: &mut Option<f32>, controls: &mut Controls) {
        let previous = self.previous;
        self.change_state(previous, jump_timer, controls);
    }

    /// Execute the current state for one frame, accumulating into
    /// `controls`.
    pub fn update(&mut self, dt: f32, jump_timer: &mut Option<f32>, controls: &mut Controls) {
        let mut expired = false;

        match &mut self.current {
            LocomotionState::DoNothing { duration, timer } => {
                controls.move_x = 0.0;
                if *duration > 0.0 {
                    if *timer > *duration {
                        expired = true;
                    }
                    *timer += dt;
                }
            }
            LocomotionState::Move { facing, sprint } => {
                controls.move_x = facing.sign();
                controls.sprint = *sprint;
            }
            LocomotionState::Jump {
                facing,
                duration,
                timer,
                has_jumped,
            } => {
                if *has_jumped {
                    *timer += dt;
                } else {
                    *timer = 0.0;
                    *has_jumped = true;
                    controls.jump_pressed = true;
                }
                controls.move_x = facing.sign();
                if *timer >= *duration {
                    controls.jump_released = true;
                }
            }
            LocomotionState::JumpStraightUp {
                duration,
                timer,
                has_jumped,
            } => {
                controls.move_x = 0.0;
                if *has_jumped {
                    *timer += dt;
                } else {
                    *timer = 0.0;
                    *has_jumped = true;
                    controls.jump_pressed = true;
                }
                if *timer >= *duration {
                    controls.jump_released = true;
                }
            }
            LocomotionState::Dodge { facing, has_dodged } => {
                if !*has_dodged {
                    controls.dodge = Some(*facing);
                    *has_dodged = true;
                }
                controls.move_x = facing.sign();
            }
            LocomotionState::Recalculate => {}
        }

        self.last_move_x = controls.move_x;

        if expired {
            self.revert_to_previous(jump_timer, controls);
        }
    }

    fn enter_current(&mut self, jump_timer: &mut Option<f32>, controls: &mut Controls) {
        match &self.current {
            LocomotionState::DoNothing { .. } => {
                controls.sprint = false;
            }
            LocomotionState::Move { sprint, .. } => {
                controls.sprint = *sprint;
            }
            LocomotionState::Jump { facing, .. } => {
                // Kill leftover momentum when the jump reverses the
                // current travel direction.
                if (self.last_move_x > 0.0 && *facing == Facing::Left)
                    || (self.last_move_x < 0.0 && *facing == Facing::Right)
                {
                    controls.cancel_momentum = true;
                }
                controls.sprint = false;
                *jump_timer = Some(0.0);
            }
            LocomotionState::JumpStraightUp { .. } => {
                controls.sprint = false;
                controls.cancel_momentum = true;
                *jump_timer = Some(0.0);
            }
            LocomotionState::Dodge { .. } => {
                controls.sprint = false;
                *jump_timer = Some(0.0);
            }
            LocomotionState::Recalculate => {
                self.pending_replan = true;
            }
        }
    }

    fn exit_current(&mut self, jump_timer: &mut Option<f32>, controls: &mut Controls) {
        match &self.current {
            LocomotionState::Jump { .. } | LocomotionState::JumpStraightUp { .. } => {
                controls.jump_released = true;
                *jump_timer = None;
            }
            LocomotionState::Dodge { .. } => {
                *jump_timer = None;
            }
            _ => {}
        }
    }
}
