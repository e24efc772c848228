pub mod io;
pub mod video;

use std::sync::mpsc::Receiver;

use anyhow::{ensure, Result};
use log::debug;

use io::{
    peripherals::Click,
    soft_switches::{AccessPolicy, SoftSwitch},
    Io,
};

/// Bytes of RAM on each of the main and aux sides.
pub const RAM_LEN: usize = 0x1_0000;

/// Language card RAM for one side: two 4K banks at $d000, plus 8K at $e000.
pub const LC_LEN: usize = 0x4000;

/// $d000..=$ffff
pub const ROM_LEN: usize = 0x3000;

/// Interface between the CPU and the memory address space (including RAM, ROM,
/// and I/O).
///
/// `cycles` is the CPU cycle count at the time of the access; some devices
/// care when they're touched.
pub trait Memory {
    fn get(&mut self, addr: u16, cycles: u64) -> u8;

    fn set(&mut self, addr: u16, value: u8, cycles: u64);

    fn get_word(&mut self, addr: u16, cycles: u64) -> u16 {
        let lo = self.get(addr, cycles);
        let hi = self.get(addr.wrapping_add(1), cycles);
        u16::from_le_bytes([lo, hi])
    }
}

/// System ROM, $d000..=$ffff.
#[derive(Clone)]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        ensure!(
            bytes.len() == ROM_LEN,
            "ROM image is {} bytes; expected {ROM_LEN}",
            bytes.len()
        );
        Ok(Self { bytes })
    }

    pub fn read(&self, addr: u16) -> u8 {
        debug_assert!(addr >= 0xd000);
        self.bytes[addr as usize - 0xd000]
    }
}

/// An Apple IIe's worth of memory: main and aux RAM, the language card, the
/// I/O page, and (optionally) a ROM.
pub struct Mem {
    main: Vec<u8>,
    aux: Vec<u8>,
    /// Main side's language card, then aux's.
    lc: Vec<u8>,
    rom: Option<Rom>,
    io: Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bank {
    Main,
    Aux,
}

impl Memory for Mem {
    fn get(&mut self, addr: u16, cycles: u64) -> u8 {
        match addr {
            0xc000..=0xc0ff => self.io.get(addr, cycles),
            // No slot ROMs.
            0xc100..=0xcfff => 0,
            0xd000..=0xffff => {
                if self.io.switches().bank().read_ram {
                    self.lc[self.lc_index(addr)]
                } else {
                    self.rom.as_ref().map_or(0, |rom| rom.read(addr))
                }
            }
            _ => {
                let bank = self.ram_bank(addr, false);
                self.ram(bank)[addr as usize]
            }
        }
    }

    fn set(&mut self, addr: u16, value: u8, cycles: u64) {
        match addr {
            0xc000..=0xc0ff => self.io.set(addr, value, cycles),
            0xc100..=0xcfff => (),
            0xd000..=0xffff => {
                if self.io.switches().bank().write_ram() {
                    let i = self.lc_index(addr);
                    self.lc[i] = value;
                }
            }
            _ => {
                let bank = self.ram_bank(addr, true);
                self.ram_mut(bank)[addr as usize] = value;
            }
        }
    }
}

impl Mem {
    pub fn new(rom: Option<Rom>, policy: AccessPolicy) -> (Self, Receiver<Click>) {
        let (io, clicks) = Io::new(policy);
        let mem = Self {
            main: vec![0; RAM_LEN],
            aux: vec![0; RAM_LEN],
            lc: vec![0; 2 * LC_LEN],
            rom,
            io,
        };
        (mem, clicks)
    }

    /// Copy `bytes` into RAM starting at `addr`, bypassing the soft switches.
    pub fn load(&mut self, addr: u16, bytes: &[u8], aux: bool) -> Result<()> {
        let start = addr as usize;
        ensure!(
            start + bytes.len() <= RAM_LEN,
            "{} bytes don't fit at ${addr:04x}",
            bytes.len()
        );
        let bank = if aux { Bank::Aux } else { Bank::Main };
        self.ram_mut(bank)[start..][..bytes.len()].copy_from_slice(bytes);
        debug!("loaded {} bytes at ${addr:04x} ({bank:?})", bytes.len());
        Ok(())
    }

    pub fn main_ram(&self) -> &[u8] {
        &self.main
    }

    pub fn aux_ram(&self) -> &[u8] {
        &self.aux
    }

    pub fn lc_ram(&self) -> &[u8] {
        &self.lc
    }

    /// Replace all RAM at once. Lengths must match what [`Self::new`] made.
    pub fn restore_ram(&mut self, main: &[u8], aux: &[u8], lc: &[u8]) -> Result<()> {
        ensure!(main.len() == RAM_LEN, "main RAM is {} bytes", main.len());
        ensure!(aux.len() == RAM_LEN, "aux RAM is {} bytes", aux.len());
        ensure!(lc.len() == 2 * LC_LEN, "language card RAM is {} bytes", lc.len());
        self.main.copy_from_slice(main);
        self.aux.copy_from_slice(aux);
        self.lc.copy_from_slice(lc);
        Ok(())
    }

    pub fn io(&self) -> &Io {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut Io {
        &mut self.io
    }

    pub fn video(&self) -> video::VideoMemory<'_> {
        video::VideoMemory::new(&self.main, &self.aux, self.io.switches())
    }

    fn ram(&self, bank: Bank) -> &[u8] {
        match bank {
            Bank::Main => &self.main,
            Bank::Aux => &self.aux,
        }
    }

    fn ram_mut(&mut self, bank: Bank) -> &mut [u8] {
        match bank {
            Bank::Main => &mut self.main,
            Bank::Aux => &mut self.aux,
        }
    }

    fn ram_bank(&self, addr: u16, write: bool) -> Bank {
        let on = |switch| self.io.is_set(switch);
        let aux = match addr {
            0x0000..=0x01ff => on(SoftSwitch::AltZp),
            0x0400..=0x07ff if on(SoftSwitch::_80Store) => on(SoftSwitch::Page2),
            0x2000..=0x3fff if on(SoftSwitch::_80Store) && on(SoftSwitch::Hires) => {
                on(SoftSwitch::Page2)
            }
            _ if write => on(SoftSwitch::RamWrt),
            _ => on(SoftSwitch::RamRd),
        };
        if aux {
            Bank::Aux
        } else {
            Bank::Main
        }
    }

    fn lc_index(&self, addr: u16) -> usize {
        debug_assert!(addr >= 0xd000);
        let side = if self.io.is_set(SoftSwitch::AltZp) {
            LC_LEN
        } else {
            0
        };
        let offset = match addr {
            0xd000..=0xdfff if self.io.switches().bank().bank2 => addr as usize - 0xd000,
            0xd000..=0xdfff => addr as usize - 0xd000 + 0x1000,
            _ => addr as usize - 0xe000 + 0x2000,
        };
        side + offset
    }
}
