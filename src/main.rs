mod app;
mod components;
mod engine;
mod fsm;
mod scene;
mod systems;

use app::GameApp;
use clap::Parser;
use engine::input::{Cue, InputAction, ScriptedInput};
use engine::window::GameWindow;
use glam::Vec2;

#[derive(Parser)]
#[command(name = "riposte", about = "Riposte combat controller")]
struct Args {
    /// Run the scripted demo without a window and print the state trace
    #[arg(long)]
    headless: bool,

    /// Seconds of scripted demo to run (headless only)
    #[arg(long, default_value_t = 7.0)]
    duration: f32,
}

/// Scripted tour of the state graph: lock on, strafe, dodge, jump, a combo,
/// then drop the lock.
fn demo_script() -> ScriptedInput {
    ScriptedInput::new(vec![
        (0.2, Cue::Move(Vec2::new(0.0, 1.0))),
        (1.0, Cue::Fire(InputAction::Target)),
        (1.2, Cue::Move(Vec2::new(1.0, 0.0))),
        (2.2, Cue::Fire(InputAction::Dodge)),
        (3.0, Cue::Fire(InputAction::Jump)),
        (4.2, Cue::Attack(true)),
        (5.4, Cue::Attack(false)),
        (6.2, Cue::Move(Vec2::ZERO)),
        (6.4, Cue::Fire(InputAction::Cancel)),
    ])
}

fn main() {
    let args = Args::parse();
    let mut app = GameApp::new();

    if args.headless {
        app.run_scripted(demo_script(), args.duration);
        return;
    }

    let sdl = sdl2::init().expect("Failed to init SDL2");
    let window = GameWindow::new(&sdl, "Riposte", 1280, 720);
    app.run(&sdl, &window);
}
