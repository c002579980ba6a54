use sdl2::video::Window;
use sdl2::Sdl;

/// Plain SDL window. There is no draw pass in this build; the window
/// exists to own keyboard focus and relative mouse mode for the event pump.
pub struct GameWindow {
    _window: Window,
}

impl GameWindow {
    pub fn new(sdl: &Sdl, title: &str, width: u32, height: u32) -> Self {
        let video = sdl.video().expect("Failed to init SDL2 video");

        let window = video
            .window(title, width, height)
            .position_centered()
            .build()
            .expect("Failed to create window");

        Self { _window: window }
    }
}
