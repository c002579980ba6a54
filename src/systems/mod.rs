mod player;
mod targeting;

pub use player::{player_motion_system, player_state_system};
pub use targeting::Targeter;
