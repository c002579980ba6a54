use glam::Vec2;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use sdl2::mouse::MouseButton;
use sdl2::EventPump;
use std::collections::HashSet;

/// Discrete input actions player states can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    /// Acquire a lock on the nearest targetable.
    Target,
    /// Drop the current lock.
    Cancel,
    Dodge,
    Jump,
}

impl InputAction {
    pub const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-action subscription counts.
///
/// States register interest on entry and must remove it symmetrically on
/// exit; the dispatcher only delivers actions with at least one live
/// subscription. Every [`InputSource`] impl embeds one of these so tests
/// can assert exact counts.
#[derive(Default)]
pub struct Subscriptions {
    counts: [u32; InputAction::COUNT],
}

impl Subscriptions {
    pub fn add(&mut self, action: InputAction) {
        self.counts[action.index()] += 1;
    }

    pub fn remove(&mut self, action: InputAction) {
        let count = &mut self.counts[action.index()];
        debug_assert!(*count > 0, "unsubscribe without matching subscribe: {action:?}");
        *count = count.saturating_sub(1);
    }

    pub fn count(&self, action: InputAction) -> u32 {
        self.counts[action.index()]
    }
}

/// Seam between player states and the input device.
///
/// Production uses [`SdlInput`]; the headless demo and tests use
/// [`ScriptedInput`] or a hand-rolled mock. Subscription bookkeeping
/// replaces C#-style event `+=`/`-=`: a state subscribes on entry,
/// unsubscribes on exit, and only subscribed actions reach its handlers.
pub trait InputSource {
    fn subscribe(&mut self, action: InputAction);
    fn unsubscribe(&mut self, action: InputAction);
    fn subscription_count(&self, action: InputAction) -> u32;

    /// Discrete actions that fired since the last frame, in fire order.
    fn fired(&self) -> &[InputAction];

    /// Attack button held this frame.
    fn is_attacking(&self) -> bool;

    /// Block button held this frame.
    fn is_blocking(&self) -> bool;

    /// Raw movement input: x = strafe (+right), y = forward/back (+forward).
    /// Components are -1, 0 or +1 on keyboard input.
    fn movement(&self) -> Vec2;
}

// ---------------------------------------------------------------------------
// SDL-backed input
// ---------------------------------------------------------------------------

fn map_action(scancode: Scancode) -> Option<InputAction> {
    match scancode {
        Scancode::Tab => Some(InputAction::Target),
        Scancode::Q => Some(InputAction::Cancel),
        Scancode::LShift => Some(InputAction::Dodge),
        Scancode::Space => Some(InputAction::Jump),
        _ => None,
    }
}

/// Keyboard + mouse input state fed from the SDL event pump.
pub struct SdlInput {
    keys: HashSet<Scancode>,
    buttons: HashSet<MouseButton>,
    fired: Vec<InputAction>,
    subs: Subscriptions,
    quit: bool,
}

impl SdlInput {
    pub fn new() -> Self {
        Self {
            keys: HashSet::new(),
            buttons: HashSet::new(),
            fired: Vec::new(),
            subs: Subscriptions::default(),
            quit: false,
        }
    }

    /// Drain the SDL event pump for this frame. Clears last frame's fired
    /// actions first; key repeats do not re-fire actions.
    pub fn update(&mut self, event_pump: &mut EventPump) {
        self.fired.clear();

        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => self.quit = true,
                Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => self.quit = true,
                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    if let Some(action) = map_action(sc) {
                        self.fired.push(action);
                    }
                    self.keys.insert(sc);
                }
                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    self.keys.remove(&sc);
                }
                Event::MouseButtonDown { mouse_btn, .. } => {
                    self.buttons.insert(mouse_btn);
                }
                Event::MouseButtonUp { mouse_btn, .. } => {
                    self.buttons.remove(&mouse_btn);
                }
                _ => {}
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    fn is_key_held(&self, scancode: Scancode) -> bool {
        self.keys.contains(&scancode)
    }
}

impl InputSource for SdlInput {
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
        self.buttons.contains(&MouseButton::Left)
    }

    fn is_blocking(&self) -> bool {
        self.buttons.contains(&MouseButton::Right)
    }

    fn movement(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;
        if self.is_key_held(Scancode::W) {
            movement.y += 1.0;
        }
        if self.is_key_held(Scancode::S) {
            movement.y -= 1.0;
        }
        if self.is_key_held(Scancode::D) {
            movement.x += 1.0;
        }
        if self.is_key_held(Scancode::A) {
            movement.x -= 1.0;
        }
        movement
    }
}

// ---------------------------------------------------------------------------
// Scripted input
// ---------------------------------------------------------------------------

/// One entry on the scripted timeline.
#[derive(Clone, Copy)]
pub enum Cue {
    Fire(InputAction),
    Move(Vec2),
    Attack(bool),
    Block(bool),
}

/// Deterministic input for the headless demo: a time-ordered cue list
/// replayed against the frame clock. Doubles as a test input source.
pub struct ScriptedInput {
    cues: Vec<(f32, Cue)>,
    next: usize,
    clock: f32,
    movement: Vec2,
    attacking: bool,
    blocking: bool,
    fired: Vec<InputAction>,
    subs: Subscriptions,
}

impl ScriptedInput {
    pub fn new(mut cues: Vec<(f32, Cue)>) -> Self {
        cues.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            cues,
            next: 0,
            clock: 0.0,
            movement: Vec2::ZERO,
            attacking: false,
            blocking: false,
            fired: Vec::new(),
            subs: Subscriptions::default(),
        }
    }

    /// Advance the timeline by `dt`, applying every cue that came due.
    pub fn advance(&mut self, dt: f32) {
        self.fired.clear();
        self.clock += dt;
        while self.next < self.cues.len() && self.cues[self.next].0 <= self.clock {
            match self.cues[self.next].1 {
                Cue::Fire(action) => self.fired.push(action),
                Cue::Move(movement) => self.movement = movement,
                Cue::Attack(held) => self.attacking = held,
                Cue::Block(held) => self.blocking = held,
            }
            self.next += 1;
        }
    }

    /// All cues consumed.
    pub fn finished(&self) -> bool {
        self.next >= self.cues.len()
    }
}

impl InputSource for ScriptedInput {
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
