use glam::{Quat, Vec3};

mod animator;
mod character;

pub use animator::{AnimParam, AnimationSink, Animator, Motion};
pub use character::{PlayerConfig, PlayerFsm, PlayerState};

/// Spatial transform with position and yaw orientation (world space).
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl LocalTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Character right axis (+X rotated by the current orientation).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Character forward axis (-Z rotated by the current orientation).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Yaw orientation that looks along `dir` projected on the ground plane.
    pub fn yaw_facing(dir: Vec3) -> Quat {
        Quat::from_rotation_y((-dir.x).atan2(-dir.z))
    }

    /// Yaw the character so its forward axis points at `target` on the
    /// ground plane. No-op when `target` is (nearly) straight overhead.
    pub fn face_towards(&mut self, target: Vec3) {
        let to = target - self.position;
        let flat = Vec3::new(to.x, 0.0, to.z);
        if flat.length_squared() < 1e-6 {
            return;
        }
        self.rotation = Self::yaw_facing(flat.normalize());
    }
}

/// Linear velocity in world space.
pub struct Velocity(pub Vec3);

/// Marker: this entity is the player.
pub struct Player;

/// Marker: entity can be locked on by the targeter.
pub struct Targetable;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_towards_points_the_forward_axis_at_the_target() {
        let mut lt = LocalTransform::new(Vec3::ZERO);
        lt.face_towards(Vec3::new(5.0, 0.0, 0.0));
        assert!(lt.forward().dot(Vec3::X) > 0.999);

        lt.face_towards(Vec3::new(0.0, 2.0, -3.0));
        assert!(lt.forward().dot(Vec3::NEG_Z) > 0.999);
    }

    #[test]
    fn face_towards_ignores_overhead_targets() {
        let mut lt = LocalTransform::new(Vec3::ZERO);
        let before = lt.rotation;
        lt.face_towards(Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(lt.rotation, before);
    }
}
