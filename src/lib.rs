//! Apple IIe memory, soft switches, and video decoding.
//!
//! There's no CPU in here: whoever drives the bus calls [`Emulator::read`]
//! and [`Emulator::write`] with a cycle count, and calls
//! [`Emulator::render`] once per host frame.

use std::sync::mpsc::Receiver;

use anyhow::Result;
use log::{debug, warn};

use display::{gr, hgr, text, DisplayConfig, PixelBuffer};
use memory::{
    io::{peripherals::Click, soft_switches::AccessPolicy},
    video::VideoSnapshots,
    Mem, Memory, Rom,
};

pub mod display;
pub mod gui;
pub mod hex;
pub mod memory;
pub mod savestate;

/// Everything there is to draw for one frame. At most one of lo-res and
/// hi-res is ever active, so there's only one graphics layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    pub text: Option<text::TextScreen>,
    pub graphics: Option<PixelBuffer>,
}

pub struct Emulator {
    mem: Mem,
    clicks: Receiver<Click>,
    flash: text::FlashClock,
    config: DisplayConfig,
}

impl Emulator {
    pub fn new(rom: Option<Rom>, policy: AccessPolicy, config: DisplayConfig) -> Self {
        let (mem, clicks) = Mem::new(rom, policy);
        Self {
            mem,
            clicks,
            flash: text::FlashClock::new(),
            config,
        }
    }

    pub fn read(&mut self, addr: u16, cycles: u64) -> u8 {
        self.mem.get(addr, cycles)
    }

    pub fn write(&mut self, addr: u16, value: u8, cycles: u64) {
        self.mem.set(addr, value, cycles);
    }

    /// Copy a memory image in, without going through the soft switches.
    pub fn load(&mut self, addr: u16, bytes: &[u8], aux: bool) -> Result<()> {
        self.mem.load(addr, bytes, aux)
    }

    pub fn key_down(&mut self, ascii_code: u8) {
        if ascii_code >= 0x80 {
            warn!("dropping non-ASCII key {ascii_code:#04x}");
            return;
        }
        self.mem.io_mut().key_down(ascii_code);
    }

    /// `value` is -1.0..=1.0, as a host joystick axis reports it.
    pub fn set_paddle(&mut self, paddle: usize, value: f32) {
        self.mem.io_mut().peripherals_mut().paddles.set_axis(paddle, value);
    }

    pub fn set_button(&mut self, button: usize, pressed: bool) {
        self.mem.io_mut().peripherals_mut().paddles.buttons[button] = pressed;
    }

    /// Switches back to power-on state. RAM is left alone.
    pub fn reset(&mut self) {
        debug!("reset");
        self.mem.io_mut().reset();
    }

    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut Mem {
        &mut self.mem
    }

    pub fn config(&self) -> DisplayConfig {
        self.config
    }

    pub fn set_config(&mut self, config: DisplayConfig) {
        self.config = config;
    }

    /// Speaker clicks since the last call. Hosts should drain every frame;
    /// clicks that don't fit in the buffer are dropped.
    pub fn drain_clicks(&self) -> Vec<Click> {
        self.clicks.try_iter().collect()
    }

    /// Call once per host frame: advances the flash clock and lets the
    /// keyboard present its next key.
    pub fn frame(&mut self) {
        self.flash.tick();
        self.mem.io_mut().poll_keyboard();
    }

    pub fn flash_on(&self) -> bool {
        self.flash.is_on()
    }

    pub fn snapshots(&self) -> VideoSnapshots {
        self.mem.video().snapshots()
    }

    pub fn render(&self) -> Screen {
        render(&self.snapshots(), self.flash_on(), &self.config)
    }
}

/// Decodes snapshots taken earlier, e.g. after releasing a lock.
///
/// A snapshot with a length no decoder knows is dropped from the frame.
pub fn render(snapshots: &VideoSnapshots, flash_on: bool, config: &DisplayConfig) -> Screen {
    let text = text::decode(&snapshots.text, snapshots.alt_charset, flash_on, config);
    let lores = gr::decode(&snapshots.lores, config);
    let hires = hgr::decode(&snapshots.hires, config);

    let text = text.unwrap_or_else(|e| {
        debug!("skipping text: {e}");
        None
    });
    let graphics = match (lores, hires) {
        (Ok(Some(buf)), _) | (_, Ok(Some(buf))) => Some(buf),
        (Err(e), _) | (_, Err(e)) => {
            debug!("skipping graphics: {e}");
            None
        }
        _ => None,
    };
    Screen { text, graphics }
}
