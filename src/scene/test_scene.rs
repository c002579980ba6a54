use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{
    Animator, LocalTransform, Motion, Player, PlayerFsm, PlayerState, Targetable, Velocity,
};

/// Build and populate the test arena: the player at the origin plus a
/// scatter of lock-on dummies. Returns the player entity.
pub fn load_test_scene(world: &mut World) -> Entity {
    for &(x, z) in &[(0.0_f32, -6.0_f32), (5.0, -3.0), (-4.0, 2.0), (8.0, 8.0)] {
        world.spawn((LocalTransform::new(Vec3::new(x, 0.0, z)), Targetable));
    }

    world.spawn((
        Player,
        LocalTransform::new(Vec3::ZERO),
        Velocity(Vec3::ZERO),
        PlayerFsm::new(PlayerState::FreeLook),
        Animator::new(Motion::FreeLookBlendTree),
    ))
}
