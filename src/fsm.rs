use std::mem;

/// Lifecycle hooks every state of a [`StateMachine`] provides.
///
/// `Ctx` is whatever the host hands to states on activation — for the
/// player it bundles mutable borrows of input, targeter, animator and
/// transform. Hooks are side-effect only: a state must not transition from
/// inside `enter` or `exit`.
pub trait State<Ctx> {
    fn enter(&mut self, ctx: &mut Ctx);
    fn exit(&mut self, ctx: &mut Ctx);
}

/// Minimal finite-state-machine container.
///
/// `S` is the state type (usually an enum). The machine tracks the current
/// state, the previous state, and how long the machine has been in its
/// current state. **Transition logic is intentionally kept out of the
/// machine itself** — it lives in the ECS system (or an `impl S` method)
/// that drives it. The machine only guarantees the lifecycle contract: on
/// every transition the old state's `exit` runs to completion before the
/// new state's `enter`, each exactly once.
///
/// # Usage
/// ```
/// let mut fsm = StateMachine::new(MyState::Idle);
/// // Each frame:
/// fsm.tick(dt);
/// fsm.start(&mut ctx); // no-op after the first frame
/// if let Some(next) = fsm.state.next(&ctx) { fsm.switch(next, &mut ctx); }
/// ```
pub struct StateMachine<S: Clone> {
    pub state: S,
    pub previous: S,
    /// Seconds spent in the current state. Reset to 0.0 on each transition.
    pub elapsed: f32,
    entered_this_frame: bool,
    started: bool,
}

impl<S: Clone> StateMachine<S> {
    /// Create a new machine starting in `initial`.
    /// `just_entered()` returns `true` on the first tick.
    pub fn new(initial: S) -> Self {
        Self {
            previous: initial.clone(),
            state: initial,
            elapsed: 0.0,
            entered_this_frame: true,
            started: false,
        }
    }

    /// Run `enter` on the initial state. The driving system calls this once
    /// before the first dispatch; later calls are no-ops.
    pub fn start<C>(&mut self, ctx: &mut C)
    where
        S: State<C>,
    {
        if self.started {
            return;
        }
        self.started = true;
        self.state.enter(ctx);
        self.entered_this_frame = true;
    }

    /// Transition to `next` only if it is a **different variant** from the
    /// current state (compared by discriminant — no `PartialEq` required).
    /// Same-variant requests are dropped without firing any hook, so the
    /// enumerated transition graph never self-transitions.
    pub fn switch<C>(&mut self, next: S, ctx: &mut C)
    where
        S: State<C>,
    {
        if mem::discriminant(&self.state) == mem::discriminant(&next) {
            return;
        }
        self.force_switch(next, ctx);
    }

    /// Like [`switch`](Self::switch), but **always** transitions even if the
    /// variant is the same. Use when the variant carries data that changes
    /// (e.g. chaining an attack combo step without leaving the attacking
    /// animation). Exit-old fully precedes enter-new.
    pub fn force_switch<C>(&mut self, next: S, ctx: &mut C)
    where
        S: State<C>,
    {
        self.state.exit(ctx);
        self.previous = mem::replace(&mut self.state, next);
        self.state.enter(ctx);
        self.elapsed = 0.0;
        self.entered_this_frame = true;
    }

    /// Advance the elapsed-in-state timer by `dt` seconds and clear the
    /// `just_entered` flag. Call once per frame **before** processing
    /// transitions, so the flag stays set for the whole frame a transition
    /// fires.
    pub fn tick(&mut self, dt: f32) {
        self.elapsed += dt;
        self.entered_this_frame = false;
    }

    /// Returns `true` only on the first frame/tick after entering this state.
    pub fn just_entered(&self) -> bool {
        self.entered_this_frame
    }
}
