use std::time::Instant;

/// Cap on a single frame delta. A stall (window drag, debugger pause)
/// would otherwise produce one huge step that fast-forwards state timers
/// and launches the player through the ground plane.
const MAX_DT: f32 = 0.1;

pub struct FrameTimer {
    last: Instant,
    pub dt: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            dt: 0.0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.dt = now.duration_since(self.last).as_secs_f32().min(MAX_DT);
        self.last = now;
    }
}
