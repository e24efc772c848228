use std::{
    error::Error,
    num::NonZeroU32,
    rc::Rc,
    sync::{Arc, Mutex},
};

use log::{error, trace};
use softbuffer::{Context, SoftBufferError, Surface};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, OwnedDisplayHandle},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    display::{text::TextScreen, PixelBuffer, W},
    Emulator, Screen,
};

/// Scan lines are doubled so the 560-wide buffer keeps a 4:3-ish shape.
const Y_SCALE: usize = 2;

const H: usize = 192;

const DESIRED_WINDOW_SIZE: PhysicalSize<u32> =
    PhysicalSize::new(W as u32, (H * Y_SCALE) as u32);

type StdResult<T, E> = std::result::Result<T, E>;

/// Winit app.
pub struct Gui {
    window: Option<Rc<Window>>,
    surface: Option<Surface<OwnedDisplayHandle, Rc<Window>>>,
    occluded: bool,
    window_size: PhysicalSize<u32>,
    emu: Arc<Mutex<Emulator>>,
    /// Last text screen printed, so we only print changes.
    last_text: Option<TextScreen>,
}

impl Gui {
    pub fn new(emu: Arc<Mutex<Emulator>>) -> Self {
        Self {
            window: None,
            surface: None,
            occluded: false,
            window_size: DESIRED_WINDOW_SIZE,
            emu,
            last_text: None,
        }
    }
}

impl ApplicationHandler for Gui {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                error!("couldn't create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Err(e) = self.window_event(event_loop, event) {
            error!("{e}");
            event_loop.exit();
        }
    }

    /// Sent at 60 Hz by the timer thread.
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, (): ()) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl Gui {
    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> StdResult<(), Box<dyn Error>> {
        assert!(self.window.is_none());

        let attrs = Window::default_attributes()
            .with_title("Apple IIe")
            .with_inner_size(DESIRED_WINDOW_SIZE)
            .with_min_inner_size(DESIRED_WINDOW_SIZE)
            .with_max_inner_size(DESIRED_WINDOW_SIZE)
            .with_resizable(false);
        let window = Rc::new(event_loop.create_window(attrs)?);
        self.window = Some(Rc::clone(&window));

        let context = Context::new(event_loop.owned_display_handle())?;
        self.surface = Some(Surface::new(&context, window)?);

        Ok(())
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> StdResult<(), SoftBufferError> {
        let Some(window) = self.window.clone() else {
            return Ok(());
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Occluded(occluded) => {
                if self.occluded != occluded {
                    self.occluded = occluded;
                    window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested if !self.occluded => self.redraw()?,

            WindowEvent::Resized(mut size) => {
                if size != DESIRED_WINDOW_SIZE {
                    if let Some(actual) = window.request_inner_size(DESIRED_WINDOW_SIZE) {
                        size = actual;
                    }
                }

                if self.window_size != size {
                    self.window_size = size;
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput {
                event,
                is_synthetic: false,
                ..
            } => self.key_event(event),

            _ => (),
        }

        Ok(())
    }

    fn key_event(&self, e: KeyEvent) {
        if !e.state.is_pressed() {
            return;
        }
        let Some(ascii_code) = key_to_ascii(&e.logical_key) else {
            return;
        };
        self.emu.lock().unwrap().key_down(ascii_code);
    }

    fn redraw(&mut self) -> StdResult<(), SoftBufferError> {
        // Copy out what we need and drop the lock before decoding.
        let (snapshots, flash_on, config) = {
            let mut emu = self.emu.lock().unwrap();
            emu.frame();
            // No audio output here.
            let clicks = emu.drain_clicks();
            if !clicks.is_empty() {
                trace!("discarding {} speaker clicks", clicks.len());
            }
            (emu.snapshots(), emu.flash_on(), emu.config())
        };
        let Screen { text, graphics } = crate::render(&snapshots, flash_on, &config);

        if text.is_some() && text != self.last_text {
            if let Some(text) = &text {
                print!("{text}");
            }
        }
        self.last_text = text;

        let (Some(surface), Some(window)) = (self.surface.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };
        let (Some(width), Some(height)) = (
            NonZeroU32::new(DESIRED_WINDOW_SIZE.width),
            NonZeroU32::new(DESIRED_WINDOW_SIZE.height),
        ) else {
            return Ok(());
        };
        surface.resize(width, height)?;

        let mut buf = surface.buffer_mut()?;
        buf.fill(0);
        if let Some(graphics) = &graphics {
            paint_surface(graphics, &mut buf);
        }

        window.pre_present_notify();
        buf.present()?;

        Ok(())
    }
}

/// Mixed-mode graphics are only 160 lines tall and sit at the top.
fn paint_surface(pixels: &PixelBuffer, buf: &mut [u32]) {
    for y in 0..pixels.height().min(H) {
        for (x, pixel) in pixels.row_u32(y).enumerate() {
            for i in 0..Y_SCALE {
                buf[(y * Y_SCALE + i) * W + x] = pixel;
            }
        }
    }
}

// This mapping probably isn't 100% accurate, and we aren't handling modifiers
// very carefully. See the table on page 13 of the //e Technical Reference
// Manual for more ideas.
fn key_to_ascii(key: &Key) -> Option<u8> {
    let ascii_code = match key {
        Key::Named(key) => match key {
            NamedKey::Backspace => 0x7f,
            NamedKey::ArrowLeft => 0x08,
            NamedKey::Tab => 0x09,
            NamedKey::ArrowDown => 0x0a,
            NamedKey::ArrowUp => 0x0b,
            NamedKey::Enter => 0x0d,
            NamedKey::ArrowRight => 0x15,
            NamedKey::Escape => 0x1b,
            NamedKey::Space => 0x20,
            _ => return None,
        },
        Key::Character(s) if s.len() == 1 => s.as_bytes()[0],
        _ => return None,
    };
    Some(ascii_code)
}
