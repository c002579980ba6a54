use std::time::Duration;

use hecs::{Entity, World};
use sdl2::Sdl;

use crate::components::{AnimParam, Animator, PlayerConfig, PlayerFsm};
use crate::engine::input::{ScriptedInput, SdlInput};
use crate::engine::time::FrameTimer;
use crate::engine::window::GameWindow;
use crate::scene::test_scene::load_test_scene;
use crate::systems::{player_motion_system, player_state_system, Targeter};

pub struct GameApp {
    world: World,
    player: Entity,
    targeter: Targeter,
    cfg: PlayerConfig,
}

impl GameApp {
    pub fn new() -> Self {
        let mut world = World::new();
        let player = load_test_scene(&mut world);
        Self {
            world,
            player,
            targeter: Targeter::new(),
            cfg: PlayerConfig::default(),
        }
    }

    /// Windowed frame loop: pump SDL input, drive the FSM, integrate motion.
    pub fn run(&mut self, sdl: &Sdl, _window: &GameWindow) {
        sdl.mouse().set_relative_mouse_mode(true);
        let mut event_pump = sdl.event_pump().expect("Failed to get event pump");
        let mut input = SdlInput::new();
        let mut timer = FrameTimer::new();

        loop {
            timer.tick();
            input.update(&mut event_pump);

            if input.should_quit() {
                break;
            }

            player_state_system(
                &mut self.world,
                &mut input,
                &mut self.targeter,
                &self.cfg,
                self.player,
                timer.dt,
            );
            player_motion_system(&mut self.world, timer.dt);

            // No swap-chain vsync without a draw pass; nap to a sane rate.
            std::thread::sleep(Duration::from_millis(6));
        }
    }

    /// Headless demo: replay a scripted input timeline at a fixed step and
    /// print the transition trace.
    pub fn run_scripted(&mut self, mut input: ScriptedInput, duration: f32) {
        const STEP: f32 = 1.0 / 60.0;

        let mut clock = 0.0;
        while clock < duration {
            input.advance(STEP);
            player_state_system(
                &mut self.world,
                &mut input,
                &mut self.targeter,
                &self.cfg,
                self.player,
                STEP,
            );
            player_motion_system(&mut self.world, STEP);
            self.trace(clock);
            clock += STEP;
        }

        if !input.finished() {
            println!("[trace] demo ended with unplayed cues");
        }
    }

    fn trace(&self, clock: f32) {
        let Ok(fsm) = self.world.get::<&PlayerFsm>(self.player) else {
            return;
        };
        if !fsm.just_entered() {
            return;
        }
        let Ok(animator) = self.world.get::<&Animator>(self.player) else {
            return;
        };
        let fade = if animator.fading() { " ~" } else { "" };
        println!(
            "[{clock:6.3}s] {} → {} [{:?}{fade}] fwd {:+.2} right {:+.2}",
            fsm.previous.label(),
            fsm.state.label(),
            animator.motion(),
            animator.param(AnimParam::TargetingForward),
            animator.param(AnimParam::TargetingRight),
        );
    }
}
