use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{LocalTransform, Targetable};

/// Max distance at which a lock can be acquired or held, in meters.
const TARGET_RANGE: f32 = 12.0;

/// Owns the lock-on selection.
///
/// States read and clear the current lock; acquisition and validation run
/// against the candidate snapshot taken by [`refresh`](Targeter::refresh)
/// each frame before the states are driven. A lost target is ordinary data
/// for the states, never an error.
pub struct Targeter {
    current: Option<Entity>,
    /// (entity, position) of every targetable in range, rebuilt per frame.
    candidates: Vec<(Entity, Vec3)>,
}

impl Targeter {
    pub fn new() -> Self {
        Self {
            current: None,
            candidates: Vec::new(),
        }
    }

    /// Rebuild the candidate snapshot around `origin` and drop the lock if
    /// its entity despawned or left range.
    pub fn refresh(&mut self, world: &World, origin: Vec3) {
        self.candidates.clear();
        for (entity, (lt, _)) in world.query::<(&LocalTransform, &Targetable)>().iter() {
            if lt.position.distance_squared(origin) <= TARGET_RANGE * TARGET_RANGE {
                self.candidates.push((entity, lt.position));
            }
        }

        if let Some(current) = self.current {
            if !self.candidates.iter().any(|&(entity, _)| entity == current) {
                self.current = None;
            }
        }
    }

    /// Lock the candidate nearest to `origin`. Returns whether a lock was
    /// acquired.
    pub fn select_nearest(&mut self, origin: Vec3) -> bool {
        self.current = self
            .candidates
            .iter()
            .min_by(|a, b| {
                a.1.distance_squared(origin)
                    .total_cmp(&b.1.distance_squared(origin))
            })
            .map(|&(entity, _)| entity);
        self.current.is_some()
    }

    pub fn current(&self) -> Option<Entity> {
        self.current
    }

    /// World position of the locked target, as of the last refresh.
    pub fn current_position(&self) -> Option<Vec3> {
        let current = self.current?;
        self.candidates
            .iter()
            .find(|&&(entity, _)| entity == current)
            .map(|&(_, position)| position)
    }

    /// Drop the lock.
    pub fn cancel(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_dummies(positions: &[Vec3]) -> (World, Vec<Entity>) {
        let mut world = World::new();
        let entities = positions
            .iter()
            .map(|&p| world.spawn((LocalTransform::new(p), Targetable)))
            .collect();
        (world, entities)
    }

    #[test]
    fn selects_the_nearest_candidate() {
        let (world, entities) = world_with_dummies(&[
            Vec3::new(0.0, 0.0, -8.0),
            Vec3::new(0.0, 0.0, -3.0),
            Vec3::new(5.0, 0.0, 5.0),
        ]);
        let mut targeter = Targeter::new();
        targeter.refresh(&world, Vec3::ZERO);

        assert!(targeter.select_nearest(Vec3::ZERO));
        assert_eq!(targeter.current(), Some(entities[1]));
        assert_eq!(targeter.current_position(), Some(Vec3::new(0.0, 0.0, -3.0)));
    }

    #[test]
    fn out_of_range_candidates_are_invisible() {
        let (world, _) = world_with_dummies(&[Vec3::new(0.0, 0.0, -40.0)]);
        let mut targeter = Targeter::new();
        targeter.refresh(&world, Vec3::ZERO);

        assert!(!targeter.select_nearest(Vec3::ZERO));
        assert_eq!(targeter.current(), None);
    }

    #[test]
    fn lock_drops_when_the_target_despawns() {
        let (mut world, entities) = world_with_dummies(&[Vec3::new(0.0, 0.0, -3.0)]);
        let mut targeter = Targeter::new();
        targeter.refresh(&world, Vec3::ZERO);
        targeter.select_nearest(Vec3::ZERO);
        assert!(targeter.current().is_some());

        world.despawn(entities[0]).unwrap();
        targeter.refresh(&world, Vec3::ZERO);
        assert_eq!(targeter.current(), None);
    }

    #[test]
    fn lock_drops_when_the_target_leaves_range() {
        let (mut world, entities) = world_with_dummies(&[Vec3::new(0.0, 0.0, -3.0)]);
        let mut targeter = Targeter::new();
        targeter.refresh(&world, Vec3::ZERO);
        targeter.select_nearest(Vec3::ZERO);

        world
            .get::<&mut LocalTransform>(entities[0])
            .unwrap()
            .position = Vec3::new(0.0, 0.0, -30.0);
        targeter.refresh(&world, Vec3::ZERO);
        assert_eq!(targeter.current(), None);
    }

    #[test]
    fn cancel_clears_the_lock() {
        let (world, _) = world_with_dummies(&[Vec3::new(1.0, 0.0, 0.0)]);
        let mut targeter = Targeter::new();
        targeter.refresh(&world, Vec3::ZERO);
        targeter.select_nearest(Vec3::ZERO);

        targeter.cancel();
        assert_eq!(targeter.current(), None);
    }
}
