use glam::Vec2;

use crate::fsm::StateMachine;

/// All discrete states the player can be in.
///
/// Transition logic lives in `impl PlayerState` in `src/systems/player.rs`
/// (where it has access to input, targeter and animator context) rather
/// than here so that this file stays pure data.
#[derive(Clone)]
pub enum PlayerState {
    /// Default locomotion, no lock. Movement steers the character.
    FreeLook,
    /// Locked on a target: strafe movement, facing pinned to the lock.
    Targeting,
    /// Melee swing. `combo` indexes the combo duration table; chaining to
    /// the next step is a forced re-entry, not a graph edge.
    Attacking { combo: usize },
    /// Guard held. Leaves when the block button is released.
    Blocking,
    /// Directional burst carrying the movement input captured at dodge time.
    Dodging { direction: Vec2 },
    /// Airborne after a jump until ground contact.
    Jumping,
}

impl PlayerState {
    /// Short display name for the transition trace.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FreeLook => "FreeLook",
            Self::Targeting => "Targeting",
            Self::Attacking { .. } => "Attacking",
            Self::Blocking => "Blocking",
            Self::Dodging { .. } => "Dodging",
            Self::Jumping => "Jumping",
        }
    }
}

/// FSM component attached to the player entity.
pub type PlayerFsm = StateMachine<PlayerState>;

/// Movement/feel tuning shared by all states.
pub struct PlayerConfig {
    /// Strafe speed while locked on, in m/s.
    pub targeting_move_speed: f32,
    /// Run speed without a lock, in m/s.
    pub free_look_move_speed: f32,
    /// Slerp factor per second for yawing toward the move direction.
    pub turn_speed: f32,
    /// Total ground covered by one dodge, in meters.
    pub dodge_distance: f32,
    pub dodge_duration: f32,
    /// Vertical takeoff velocity, in m/s.
    pub jump_impulse: f32,
    /// Seconds per combo step; the table length is the combo chain length.
    pub attack_durations: &'static [f32],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            targeting_move_speed: 4.0,
            free_look_move_speed: 6.0,
            turn_speed: 10.0,
            dodge_distance: 3.5,
            dodge_duration: 0.25,
            jump_impulse: 7.0,
            attack_durations: &[0.6, 0.5, 0.8],
        }
    }
}
