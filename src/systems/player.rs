use glam::{Vec2, Vec3};
use hecs::{Entity, World};

use crate::components::{
    AnimParam, AnimationSink, Animator, LocalTransform, Motion, PlayerConfig, PlayerFsm,
    PlayerState, Velocity,
};
use crate::engine::input::{InputAction, InputSource};
use crate::fsm::State;
use crate::systems::targeting::Targeter;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Cross-fade length for every state-entry motion change.
const CROSS_FADE_DURATION: f32 = 0.1;
/// Damp time for blend-tree parameter smoothing.
const ANIM_DAMP_TIME: f32 = 0.1;

const GRAVITY: f32 = -20.0;
const GROUND_Y: f32 = 0.0;

// ---------------------------------------------------------------------------
// Context handed to states
// ---------------------------------------------------------------------------

/// Borrows of everything a state may touch during enter/exit/tick and event
/// handlers. Assembled fresh by [`player_state_system`] each frame.
pub struct PlayerCtx<'a> {
    pub input: &'a mut dyn InputSource,
    pub targeter: &'a mut Targeter,
    pub animator: &'a mut Animator,
    pub transform: &'a mut LocalTransform,
    pub velocity: &'a mut Velocity,
    pub cfg: &'a PlayerConfig,
    pub dt: f32,
    /// Seconds spent in the current state, mirrored from the machine.
    pub elapsed: f32,
}

impl PlayerCtx<'_> {
    /// Standing on the ground plane (and not on the way up).
    fn grounded(&self) -> bool {
        self.transform.position.y <= GROUND_Y + 1e-4 && self.velocity.0.y <= 0.0
    }
}

/// A transition requested by state logic. `Force` re-enters even when the
/// target is the same variant (attack combo chaining).
enum Transition {
    To(PlayerState),
    Force(PlayerState),
}

// ---------------------------------------------------------------------------
// Lifecycle hooks
// ---------------------------------------------------------------------------

impl<'a> State<PlayerCtx<'a>> for PlayerState {
    fn enter(&mut self, ctx: &mut PlayerCtx<'a>) {
        match self {
            Self::FreeLook => {
                ctx.input.subscribe(InputAction::Target);
                ctx.input.subscribe(InputAction::Jump);
                ctx.animator
                    .cross_fade(Motion::FreeLookBlendTree, CROSS_FADE_DURATION);
            }
            Self::Targeting => {
                ctx.input.subscribe(InputAction::Cancel);
                ctx.input.subscribe(InputAction::Dodge);
                ctx.input.subscribe(InputAction::Jump);
                ctx.animator
                    .cross_fade(Motion::TargetingBlendTree, CROSS_FADE_DURATION);
            }
            Self::Attacking { combo } => {
                ctx.animator
                    .cross_fade(Motion::Attack(*combo), CROSS_FADE_DURATION);
            }
            Self::Blocking => {
                ctx.animator.cross_fade(Motion::Block, CROSS_FADE_DURATION);
            }
            Self::Dodging { .. } => {
                // Dodges play inside the targeting blend tree; no fade.
            }
            Self::Jumping => {
                ctx.velocity.0.y = ctx.cfg.jump_impulse;
                ctx.animator.cross_fade(Motion::Jump, CROSS_FADE_DURATION);
            }
        }
    }

    fn exit(&mut self, ctx: &mut PlayerCtx<'a>) {
        match self {
            Self::FreeLook => {
                ctx.input.unsubscribe(InputAction::Target);
                ctx.input.unsubscribe(InputAction::Jump);
            }
            Self::Targeting => {
                ctx.input.unsubscribe(InputAction::Cancel);
                ctx.input.unsubscribe(InputAction::Dodge);
                ctx.input.unsubscribe(InputAction::Jump);
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Event handlers and per-state tick logic
// ---------------------------------------------------------------------------

impl PlayerState {
    /// React to a subscribed discrete action. Returns the next state if the
    /// handler transitions. Unsubscribed actions never reach this point.
    fn handle_action(&self, action: InputAction, ctx: &mut PlayerCtx) -> Option<PlayerState> {
        match (self, action) {
            (Self::FreeLook, InputAction::Target) => {
                let origin = ctx.transform.position;
                ctx.targeter.select_nearest(origin).then_some(Self::Targeting)
            }
            (Self::FreeLook, InputAction::Jump) => Some(Self::Jumping),

            (Self::Targeting, InputAction::Cancel) => {
                ctx.targeter.cancel();
                Some(Self::FreeLook)
            }
            (Self::Targeting, InputAction::Dodge) => {
                let movement = ctx.input.movement();
                if movement == Vec2::ZERO {
                    return None;
                }
                Some(Self::Dodging { direction: movement })
            }
            (Self::Targeting, InputAction::Jump) => Some(Self::Jumping),

            _ => None,
        }
    }

    /// Per-frame behavior. Returns the transition to fire, if any.
    fn tick(&self, ctx: &mut PlayerCtx) -> Option<Transition> {
        match self {
            Self::FreeLook => tick_free_look(ctx),
            Self::Targeting => tick_targeting(ctx),
            Self::Attacking { combo } => tick_attacking(*combo, ctx),
            Self::Blocking => tick_blocking(ctx),
            Self::Dodging { direction } => tick_dodging(*direction, ctx),
            Self::Jumping => tick_jumping(ctx),
        }
    }
}

fn tick_free_look(ctx: &mut PlayerCtx) -> Option<Transition> {
    let movement = ctx.input.movement();
    let has_input = movement != Vec2::ZERO;

    // The camera lives outside this crate, so free-look input is read in
    // world axes: +x strafes east, +y pushes north (-Z).
    let dir = if has_input {
        Vec3::new(movement.x, 0.0, -movement.y).normalize()
    } else {
        Vec3::ZERO
    };

    ctx.velocity.0.x = dir.x * ctx.cfg.free_look_move_speed;
    ctx.velocity.0.z = dir.z * ctx.cfg.free_look_move_speed;

    let speed = if has_input { 1.0 } else { 0.0 };
    ctx.animator
        .set_damped(AnimParam::FreeLookSpeed, speed, ANIM_DAMP_TIME, ctx.dt);

    if has_input {
        let facing = LocalTransform::yaw_facing(dir);
        let t = (ctx.cfg.turn_speed * ctx.dt).min(1.0);
        ctx.transform.rotation = ctx.transform.rotation.slerp(facing, t);
    }
    None
}

/// Locked-on behavior. Decision order matters: attack beats block beats
/// target loss; only when none fires does the state move and animate.
fn tick_targeting(ctx: &mut PlayerCtx) -> Option<Transition> {
    if ctx.input.is_attacking() {
        return Some(Transition::To(PlayerState::Attacking { combo: 0 }));
    }
    if ctx.input.is_blocking() {
        return Some(Transition::To(PlayerState::Blocking));
    }
    let Some(target_position) = ctx.targeter.current_position() else {
        return Some(Transition::To(PlayerState::FreeLook));
    };

    let movement = ctx.input.movement();
    let planar = ctx.transform.right() * movement.x + ctx.transform.forward() * movement.y;
    ctx.velocity.0.x = planar.x * ctx.cfg.targeting_move_speed;
    ctx.velocity.0.z = planar.z * ctx.cfg.targeting_move_speed;

    update_targeting_anim(ctx, movement);

    ctx.transform.face_towards(target_position);
    None
}

/// Damp each blend-tree axis toward 0 when its raw input component is
/// exactly zero, else toward the input's sign.
fn update_targeting_anim(ctx: &mut PlayerCtx, movement: Vec2) {
    let forward = if movement.y == 0.0 {
        0.0
    } else {
        movement.y.signum()
    };
    let right = if movement.x == 0.0 {
        0.0
    } else {
        movement.x.signum()
    };
    ctx.animator
        .set_damped(AnimParam::TargetingForward, forward, ANIM_DAMP_TIME, ctx.dt);
    ctx.animator
        .set_damped(AnimParam::TargetingRight, right, ANIM_DAMP_TIME, ctx.dt);
}

fn tick_attacking(combo: usize, ctx: &mut PlayerCtx) -> Option<Transition> {
    // Swings root the character; facing stays pinned to the lock.
    ctx.velocity.0.x = 0.0;
    ctx.velocity.0.z = 0.0;
    if let Some(target_position) = ctx.targeter.current_position() {
        ctx.transform.face_towards(target_position);
    }

    let durations = ctx.cfg.attack_durations;
    if ctx.elapsed < durations[combo.min(durations.len() - 1)] {
        return None;
    }
    if ctx.input.is_attacking() {
        // Chain into the next combo step; wraps at the end of the table.
        let next = (combo + 1) % durations.len();
        return Some(Transition::Force(PlayerState::Attacking { combo: next }));
    }
    Some(Transition::To(return_state(ctx)))
}

fn tick_blocking(ctx: &mut PlayerCtx) -> Option<Transition> {
    ctx.velocity.0.x = 0.0;
    ctx.velocity.0.z = 0.0;
    if !ctx.input.is_blocking() {
        return Some(Transition::To(return_state(ctx)));
    }
    None
}

fn tick_dodging(direction: Vec2, ctx: &mut PlayerCtx) -> Option<Transition> {
    let dir = direction.normalize_or_zero();
    let planar = ctx.transform.right() * dir.x + ctx.transform.forward() * dir.y;
    let burst_speed = ctx.cfg.dodge_distance / ctx.cfg.dodge_duration;
    ctx.velocity.0.x = planar.x * burst_speed;
    ctx.velocity.0.z = planar.z * burst_speed;

    if let Some(target_position) = ctx.targeter.current_position() {
        ctx.transform.face_towards(target_position);
    }

    if ctx.elapsed >= ctx.cfg.dodge_duration {
        return Some(Transition::To(return_state(ctx)));
    }
    None
}

fn tick_jumping(ctx: &mut PlayerCtx) -> Option<Transition> {
    // Momentum carries; no air steering. Gravity and ground contact come
    // from `player_motion_system`.
    if ctx.grounded() {
        return Some(Transition::To(return_state(ctx)));
    }
    None
}

/// Post-action landing spot: back to the lock if it still holds.
fn return_state(ctx: &PlayerCtx) -> PlayerState {
    if ctx.targeter.current().is_some() {
        PlayerState::Targeting
    } else {
        PlayerState::FreeLook
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Drive the player FSM: refresh the lock, dispatch this frame's input
/// events to the active state, then tick it. Runs **before**
/// [`player_motion_system`].
pub fn player_state_system(
    world: &mut World,
    input: &mut dyn InputSource,
    targeter: &mut Targeter,
    cfg: &PlayerConfig,
    player: Entity,
    dt: f32,
) {
    // Lock validation reads the world, so it runs before the player's
    // components are exclusively borrowed.
    let origin = match world.get::<&LocalTransform>(player) {
        Ok(lt) => lt.position,
        Err(_) => return,
    };
    targeter.refresh(world, origin);

    let Ok((fsm, transform, velocity, animator)) = world.query_one_mut::<(
        &mut PlayerFsm,
        &mut LocalTransform,
        &mut Velocity,
        &mut Animator,
    )>(player) else {
        return;
    };

    // Timers advance first so just_entered stays visible for the whole
    // frame a transition fires.
    fsm.tick(dt);
    animator.advance(dt);

    let mut ctx = PlayerCtx {
        input,
        targeter,
        animator,
        transform,
        velocity,
        cfg,
        dt,
        elapsed: fsm.elapsed,
    };
    fsm.start(&mut ctx);

    // Events first, then the polled tick: interleaved on one thread, never
    // overlapping. A handler transition takes effect immediately, so events
    // later in the same frame are checked against the new state's
    // subscriptions.
    let fired: Vec<InputAction> = ctx.input.fired().to_vec();
    for action in fired {
        if ctx.input.subscription_count(action) == 0 {
            continue;
        }
        if let Some(next) = fsm.state.handle_action(action, &mut ctx) {
            fsm.switch(next, &mut ctx);
        }
    }

    ctx.elapsed = fsm.elapsed;
    match fsm.state.tick(&mut ctx) {
        Some(Transition::To(next)) => fsm.switch(next, &mut ctx),
        Some(Transition::Force(next)) => fsm.force_switch(next, &mut ctx),
        None => {}
    }

    #[cfg(debug_assertions)]
    if fsm.just_entered() {
        println!(
            "[player_state] {} → {}",
            fsm.previous.label(),
            fsm.state.label()
        );
    }
}

/// Integrate velocity into position with gravity and the ground plane.
/// The states own horizontal velocity; this system owns the vertical axis.
pub fn player_motion_system(world: &mut World, dt: f32) {
    for (_entity, (lt, vel)) in world.query_mut::<(&mut LocalTransform, &mut Velocity)>() {
        vel.0.y += GRAVITY * dt;
        lt.position += vel.0 * dt;
        if lt.position.y <= GROUND_Y {
            lt.position.y = GROUND_Y;
            vel.0.y = vel.0.y.max(0.0);
        }
    }
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Targetable;
    use crate::engine::input::Subscriptions;

    const DT: f32 = 1.0 / 60.0;

    /// Hand-driven input double.
    struct MockInput {
        subs: Subscriptions,
        fired: Vec<InputAction>,
        attacking: bool,
        blocking: bool,
        movement: Vec2,
    }

    impl MockInput {
        fn new() -> Self {
            Self {
                subs: Subscriptions::default(),
                fired: Vec::new(),
                attacking: false,
                blocking: false,
                movement: Vec2::ZERO,
            }
        }
    }

    impl InputSource for MockInput {
        fn subscribe(&mut self, action: InputAction) {
            self.subs.add(action);
        }
        fn unsubscribe(&mut self, action: InputAction) {
            self.subs.remove(action);
        }
        fn subscription_count(&self, action: InputAction) -> u32 {
            self.subs.count(action)
        }
        fn fired(&self) -> &[InputAction] {
            &self.fired
        }
        fn is_attacking(&self) -> bool {
            self.attacking
        }
        fn is_blocking(&self) -> bool {
            self.blocking
        }
        fn movement(&self) -> Vec2 {
            self.movement
        }
    }

    struct Rig {
        world: World,
        input: MockInput,
        targeter: Targeter,
        cfg: PlayerConfig,
        player: Entity,
        target: Entity,
    }

    impl Rig {
        /// Player at the origin facing -Z, one targetable dummy 5 m ahead.
        /// First step boots the FSM into FreeLook.
        fn free_look() -> Self {
            let mut world = World::new();
            let target = world.spawn((
                LocalTransform::new(Vec3::new(0.0, 0.0, -5.0)),
                Targetable,
            ));
            let player = world.spawn((
                LocalTransform::new(Vec3::ZERO),
                Velocity(Vec3::ZERO),
                PlayerFsm::new(PlayerState::FreeLook),
                Animator::new(Motion::FreeLookBlendTree),
            ));
            Self {
                world,
                input: MockInput::new(),
                targeter: Targeter::new(),
                cfg: PlayerConfig::default(),
                player,
                target,
            }
        }

        /// As [`free_look`], but already locked on and in Targeting.
        fn locked_on() -> Self {
            let mut rig = Self::free_look();
            rig.fire(InputAction::Target);
            rig.step();
            assert!(matches!(rig.state(), PlayerState::Targeting));
            rig
        }

        fn fire(&mut self, action: InputAction) {
            self.input.fired.push(action);
        }

        fn step(&mut self) {
            self.step_dt(DT);
        }

        fn step_dt(&mut self, dt: f32) {
            player_state_system(
                &mut self.world,
                &mut self.input,
                &mut self.targeter,
                &self.cfg,
                self.player,
                dt,
            );
            player_motion_system(&mut self.world, dt);
            self.input.fired.clear();
        }

        fn state(&self) -> PlayerState {
            self.world.get::<&PlayerFsm>(self.player).unwrap().state.clone()
        }

        fn param(&self, param: AnimParam) -> f32 {
            self.world.get::<&Animator>(self.player).unwrap().param(param)
        }

        fn position(&self) -> Vec3 {
            self.world
                .get::<&LocalTransform>(self.player)
                .unwrap()
                .position
        }

        fn forward(&self) -> Vec3 {
            self.world
                .get::<&LocalTransform>(self.player)
                .unwrap()
                .forward()
        }

        fn velocity(&self) -> Vec3 {
            self.world.get::<&Velocity>(self.player).unwrap().0
        }

        fn counts(&self) -> [u32; InputAction::COUNT] {
            [
                self.input.subscription_count(InputAction::Target),
                self.input.subscription_count(InputAction::Cancel),
                self.input.subscription_count(InputAction::Dodge),
                self.input.subscription_count(InputAction::Jump),
            ]
        }
    }

    // -- subscriptions ------------------------------------------------------

    #[test]
    fn initial_state_subscribes_on_the_first_frame() {
        let mut rig = Rig::free_look();
        assert_eq!(rig.counts(), [0, 0, 0, 0]);
        rig.step();
        // FreeLook listens for Target + Jump.
        assert_eq!(rig.counts(), [1, 0, 0, 1]);
    }

    #[test]
    fn subscriptions_stay_symmetric_across_reentry() {
        let mut rig = Rig::locked_on();
        for _ in 0..3 {
            // Targeting listens for Cancel + Dodge + Jump.
            assert_eq!(rig.counts(), [0, 1, 1, 1]);

            rig.fire(InputAction::Cancel);
            rig.step();
            assert!(matches!(rig.state(), PlayerState::FreeLook));
            assert_eq!(rig.counts(), [1, 0, 0, 1]);

            rig.fire(InputAction::Target);
            rig.step();
            assert!(matches!(rig.state(), PlayerState::Targeting));
        }
    }

    #[test]
    fn events_only_reach_subscribed_states() {
        let mut rig = Rig::locked_on();
        rig.input.blocking = true;
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Blocking));
        assert_eq!(rig.counts(), [0, 0, 0, 0]);

        // Blocking subscribed to nothing, so a jump press is inert.
        rig.fire(InputAction::Jump);
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Blocking));
    }

    // -- targeting decision order -------------------------------------------

    #[test]
    fn attack_input_wins_over_everything() {
        let mut rig = Rig::locked_on();
        rig.input.attacking = true;
        rig.input.blocking = true;
        rig.world.despawn(rig.target).unwrap();
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Attacking { combo: 0 }));
    }

    #[test]
    fn block_input_beats_target_loss() {
        let mut rig = Rig::locked_on();
        rig.input.blocking = true;
        rig.world.despawn(rig.target).unwrap();
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Blocking));
    }

    #[test]
    fn lost_target_falls_back_to_free_look() {
        let mut rig = Rig::locked_on();
        rig.world.despawn(rig.target).unwrap();
        rig.step();
        assert!(matches!(rig.state(), PlayerState::FreeLook));
    }

    // -- locked-on movement and animation ------------------------------------

    #[test]
    fn forward_param_converges_to_the_input_sign() {
        let mut rig = Rig::locked_on();
        rig.input.movement = Vec2::new(0.0, 1.0);
        for _ in 0..60 {
            rig.step();
        }
        assert!(rig.param(AnimParam::TargetingForward) > 0.95);

        rig.input.movement = Vec2::new(0.0, -1.0);
        for _ in 0..60 {
            rig.step();
        }
        assert!(rig.param(AnimParam::TargetingForward) < -0.9);
    }

    #[test]
    fn forward_param_stays_zero_without_forward_input() {
        let mut rig = Rig::locked_on();
        rig.input.movement = Vec2::new(1.0, 0.0);
        for _ in 0..60 {
            rig.step();
        }
        assert!(rig.param(AnimParam::TargetingForward).abs() < 1e-6);
        assert!(rig.param(AnimParam::TargetingRight) > 0.95);
    }

    #[test]
    fn strafe_moves_along_the_right_axis() {
        let mut rig = Rig::locked_on();
        rig.input.movement = Vec2::new(1.0, 0.0);
        rig.step();
        let vel = rig.velocity();
        assert!((vel.x - rig.cfg.targeting_move_speed).abs() < 1e-3);
        assert!(vel.z.abs() < 1e-3);

        for _ in 0..30 {
            rig.step();
        }
        assert!(rig.position().x > 0.5);
    }

    #[test]
    fn facing_tracks_the_lock() {
        let mut rig = Rig::locked_on();
        rig.world
            .get::<&mut LocalTransform>(rig.target)
            .unwrap()
            .position = Vec3::new(5.0, 0.0, 0.0);
        rig.step();
        assert!(rig.forward().dot(Vec3::X) > 0.99);
    }

    // -- event handlers -------------------------------------------------------

    #[test]
    fn cancel_clears_the_lock_and_returns_to_free_look() {
        let mut rig = Rig::locked_on();
        rig.fire(InputAction::Cancel);
        rig.step();
        assert!(matches!(rig.state(), PlayerState::FreeLook));
        assert_eq!(rig.targeter.current(), None);
    }

    #[test]
    fn dodge_with_no_movement_is_ignored() {
        let mut rig = Rig::locked_on();
        rig.fire(InputAction::Dodge);
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Targeting));
    }

    #[test]
    fn dodge_carries_the_movement_vector() {
        let mut rig = Rig::locked_on();
        let movement = Vec2::new(-1.0, 0.25);
        rig.input.movement = movement;
        rig.fire(InputAction::Dodge);
        rig.step();
        match rig.state() {
            PlayerState::Dodging { direction } => assert_eq!(direction, movement),
            other => panic!("expected Dodging, got {}", other.label()),
        }

        // Burst expires back into Targeting while the lock holds.
        rig.input.movement = Vec2::ZERO;
        rig.step_dt(rig.cfg.dodge_duration + 0.05);
        assert!(matches!(rig.state(), PlayerState::Targeting));
    }

    #[test]
    fn jump_fires_unconditionally_from_targeting() {
        let mut rig = Rig::locked_on();
        rig.fire(InputAction::Jump);
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Jumping));
        rig.step();
        assert!(rig.position().y > 0.0);
    }

    #[test]
    fn jump_lands_back_into_targeting() {
        let mut rig = Rig::locked_on();
        rig.fire(InputAction::Jump);
        rig.step();

        let mut landed = false;
        for _ in 0..240 {
            rig.step();
            if matches!(rig.state(), PlayerState::Targeting) {
                landed = true;
                break;
            }
        }
        assert!(landed, "never landed back into Targeting");
        assert_eq!(rig.position().y, 0.0);
    }

    // -- attack and block -----------------------------------------------------

    #[test]
    fn attack_returns_to_targeting_when_the_lock_holds() {
        let mut rig = Rig::locked_on();
        rig.input.attacking = true;
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Attacking { combo: 0 }));

        rig.input.attacking = false;
        rig.step_dt(0.7);
        assert!(matches!(rig.state(), PlayerState::Targeting));
    }

    #[test]
    fn attack_chains_combo_steps_while_held() {
        let mut rig = Rig::locked_on();
        rig.input.attacking = true;
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Attacking { combo: 0 }));

        rig.step_dt(0.65);
        assert!(matches!(rig.state(), PlayerState::Attacking { combo: 1 }));

        rig.step_dt(0.55);
        assert!(matches!(rig.state(), PlayerState::Attacking { combo: 2 }));

        rig.input.attacking = false;
        rig.step_dt(0.85);
        assert!(matches!(rig.state(), PlayerState::Targeting));
    }

    #[test]
    fn block_release_returns_to_free_look_without_a_lock() {
        let mut rig = Rig::locked_on();
        rig.input.blocking = true;
        rig.step();
        assert!(matches!(rig.state(), PlayerState::Blocking));

        rig.world.despawn(rig.target).unwrap();
        rig.input.blocking = false;
        rig.step();
        assert!(matches!(rig.state(), PlayerState::FreeLook));
    }
}
