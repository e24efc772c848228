pub mod bank_select;
pub mod peripherals;
pub mod soft_switches;

use std::{ops::Range, sync::mpsc::Receiver};

use peripherals::{Click, Peripherals};
use soft_switches::{Access, AccessPolicy, SoftSwitch, SoftSwitches};

/// The bytes software sees at $c000..=$c0ff.
///
/// Soft switches and peripherals write status into here; the bus reads it
/// back after dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPage {
    bytes: [u8; 0x100],
}

impl IoPage {
    pub fn new() -> Self {
        Self { bytes: [0; 0x100] }
    }

    pub fn from_bytes(bytes: [u8; 0x100]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 0x100] {
        &self.bytes
    }

    pub fn get(&self, addr: u16) -> u8 {
        self.bytes[index(addr)]
    }

    pub fn set(&mut self, addr: u16, value: u8) {
        self.bytes[index(addr)] = value;
    }

    pub fn bytes(&self, range: Range<u16>) -> &[u8] {
        &self.bytes[index(range.start)..][..range.len()]
    }

    pub fn fill(&mut self, range: Range<u16>, value: u8) {
        self.bytes[index(range.start)..][..range.len()].fill(value);
    }

    /// Only the hibit means anything; the rest mimics what real hardware
    /// tends to leave on the bus.
    pub fn set_status(&mut self, addr: u16, is_set: bool) {
        let byte = if is_set {
            soft_switches::SET
        } else {
            soft_switches::CLEAR
        };
        self.set(addr, byte);
    }
}

impl Default for IoPage {
    fn default() -> Self {
        Self::new()
    }
}

fn index(addr: u16) -> usize {
    let [lo, hi] = addr.to_le_bytes();
    assert_eq!(hi, 0xc0, "${addr:04x} is not on the I/O page");
    lo as usize
}

/// $c000..=$c0ff
#[derive(Debug)]
pub struct Io {
    page: IoPage,
    switches: SoftSwitches,
    peripherals: Peripherals,
}

impl Io {
    /// Speaker clicks come out of the returned channel.
    pub fn new(policy: AccessPolicy) -> (Self, Receiver<Click>) {
        let (peripherals, clicks) = Peripherals::new();
        let io = Self {
            page: IoPage::new(),
            switches: SoftSwitches::new(policy),
            peripherals,
        };
        (io, clicks)
    }

    pub fn get(&mut self, addr: u16, cycles: u64) -> u8 {
        self.access(addr, Access::Read, cycles);
        self.page.get(addr)
    }

    /// The written value itself goes nowhere; only the access matters.
    pub fn set(&mut self, addr: u16, _value: u8, cycles: u64) {
        self.access(addr, Access::Write, cycles);
    }

    fn access(&mut self, addr: u16, access: Access, cycles: u64) {
        self.switches
            .dispatch(addr, access, cycles, &mut self.page, &mut self.peripherals);
    }

    pub fn switches(&self) -> &SoftSwitches {
        &self.switches
    }

    pub fn is_set(&self, switch: SoftSwitch) -> bool {
        self.switches.is_set(switch)
    }

    pub fn page(&self) -> &IoPage {
        &self.page
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals {
        &mut self.peripherals
    }

    pub fn key_down(&mut self, ascii_code: u8) {
        self.peripherals.keyboard.key_down(ascii_code);
        self.peripherals.keyboard.latch(&mut self.page);
    }

    /// Give the keyboard a chance to present its next key.
    pub fn poll_keyboard(&mut self) {
        self.peripherals.keyboard.latch(&mut self.page);
    }

    pub fn reset(&mut self) {
        self.switches.reset();
        self.page = IoPage::new();
        self.peripherals.keyboard.clear_latch();
    }

    pub fn restore(
        &mut self,
        states: &std::collections::BTreeMap<SoftSwitch, bool>,
        page: IoPage,
    ) {
        self.switches.restore(states);
        self.page = page;
        self.peripherals.keyboard.clear_latch();
    }
}
