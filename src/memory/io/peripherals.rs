//! The devices behind the side-effecting soft switches.
//!
//! Each one owns its own state; the switch table only knows them through
//! [`SideEffects`].

use std::{
    collections::VecDeque,
    sync::mpsc::{self, Receiver, SyncSender, TrySendError},
};

use log::{debug, trace};
use rand::Rng;

use super::{
    soft_switches::{Handler, SideEffects},
    IoPage,
};

/// Paddle timers count down for roughly this many cycles per unit of
/// paddle value.
const PADDLE_CYCLES_PER_UNIT: u64 = 11;

/// Clicks held for the audio driver before new ones are dropped. A few
/// frames' worth of a busy speaker.
pub const CLICK_BUFFER: usize = 4096;

/// Cycle-stamped speaker toggle, for the audio driver to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Click {
    pub cycles: u64,
}

#[derive(Debug, Default)]
pub struct Keyboard {
    queue: VecDeque<u8>,
    /// The front of `queue` is showing at $c000.
    latched: bool,
}

impl Keyboard {
    pub fn key_down(&mut self, ascii_code: u8) {
        assert!(ascii_code < 0x80);
        self.queue.push_back(ascii_code);
    }

    /// Present the next queued key at $c000..$c020, unless software hasn't
    /// picked up the previous one yet.
    pub fn latch(&mut self, io: &mut IoPage) {
        if io.get(0xc000) & 0x80 != 0 {
            return;
        }
        if let Some(&key) = self.queue.front() {
            io.fill(0xc000..0xc020, key | 0x80);
            self.latched = true;
        }
    }

    /// The I/O page was replaced, so whatever was showing is gone.
    pub fn clear_latch(&mut self) {
        self.latched = false;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// $c010: clear the strobe bit and drop the key that was showing. Only
    /// the first strobe after a latch consumes a key.
    fn strobe(&mut self, io: &mut IoPage) {
        let key = io.get(0xc000) & 0x7f;
        io.fill(0xc000..0xc020, key);
        if self.latched {
            self.latched = false;
            self.queue.pop_front();
        }
    }
}

#[derive(Debug)]
pub struct Speaker {
    clicks: SyncSender<Click>,
}

impl Speaker {
    /// The receiving end goes to whoever produces audio. Clicks are dropped
    /// once it hangs up, or while it's [`CLICK_BUFFER`] clicks behind.
    pub fn new() -> (Self, Receiver<Click>) {
        let (tx, rx) = mpsc::sync_channel(CLICK_BUFFER);
        (Self { clicks: tx }, rx)
    }

    fn click(&mut self, cycles: u64) {
        match self.clicks.try_send(Click { cycles }) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => (),
            Err(TrySendError::Full(_)) => trace!("click buffer full; dropping click @{cycles}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paddles {
    /// 0..=255, 128 is centered.
    pub values: [u8; 4],
    pub buttons: [bool; 3],
    trigger_cycle: u64,
}

impl Default for Paddles {
    fn default() -> Self {
        Self {
            values: [128; 4],
            buttons: [false; 3],
            trigger_cycle: 0,
        }
    }
}

impl Paddles {
    /// -1.0..=1.0 to 0..=255.
    pub fn set_axis(&mut self, paddle: usize, value: f32) {
        self.values[paddle] = ((value + 1.0) * 127.5).clamp(0.0, 255.0) as u8;
    }

    fn reset(&mut self, cycles: u64) {
        self.trigger_cycle = cycles;
    }

    /// Refresh all four paddle bytes, $c064..=$c067. A paddle reads high
    /// until its timer runs out.
    fn check(&self, cycles: u64, io: &mut IoPage) {
        let elapsed = cycles.saturating_sub(self.trigger_cycle);
        for (addr, &value) in (0xc064..).zip(&self.values) {
            let timed_out = elapsed >= value as u64 * PADDLE_CYCLES_PER_UNIT;
            io.set(addr, if timed_out { 0 } else { 0x80 });
        }
    }

    fn button(&self, addr: u16, io: &mut IoPage) {
        let pressed = self.buttons[(addr - 0xc061) as usize];
        io.set(addr, if pressed { 0x80 } else { 0 });
    }
}

/// Everything hanging off the I/O page.
#[derive(Debug)]
pub struct Peripherals {
    pub keyboard: Keyboard,
    pub speaker: Speaker,
    pub paddles: Paddles,
}

impl Peripherals {
    pub fn new() -> (Self, Receiver<Click>) {
        let (speaker, clicks) = Speaker::new();
        let out = Self {
            keyboard: Keyboard::default(),
            speaker,
            paddles: Paddles::default(),
        };
        (out, clicks)
    }
}

/// Unconnected inputs read back as noise.
fn floating_bus(io: &mut IoPage, range: std::ops::Range<u16>) {
    io.fill(range, rand::thread_rng().gen());
}

impl SideEffects for Peripherals {
    fn on_toggle(&mut self, handler: Handler, addr: u16, cycles: u64, io: &mut IoPage) {
        match handler {
            Handler::KbdStrobe => self.keyboard.strobe(io),
            Handler::CassetteOut => floating_bus(io, 0xc020..0xc030),
            Handler::Speaker => {
                floating_bus(io, 0xc030..0xc040);
                self.speaker.click(cycles);
            }
            Handler::EmuByte => io.set(0xc04f, 0xcd),
            Handler::CassetteIn => floating_bus(io, addr..addr + 1),
            Handler::Pushbutton => self.paddles.button(addr, io),
            Handler::Paddles => self.paddles.check(cycles, io),
            Handler::PaddleReset => {
                self.paddles.reset(cycles);
                floating_bus(io, 0xc070..0xc071);
            }
            Handler::BankSelect => {
                debug!("bank select ${addr:04x} reached the peripherals; ignoring");
            }
        }
    }
}
