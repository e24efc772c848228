//! Save states: RAM plus every soft switch, as JSON.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{ensure, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    memory::io::{soft_switches::SoftSwitch, IoPage},
    Emulator,
};

pub const VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveState {
    pub version: u32,
    pub switches: BTreeMap<SoftSwitch, bool>,
    /// The I/O page as software last saw it.
    pub io: Vec<u8>,
    pub main_ram: Vec<u8>,
    pub aux_ram: Vec<u8>,
    pub lc_ram: Vec<u8>,
}

impl SaveState {
    pub fn capture(emu: &Emulator) -> Self {
        let mem = emu.mem();
        Self {
            version: VERSION,
            switches: mem.io().switches().states(),
            io: mem.io().page().as_bytes().to_vec(),
            main_ram: mem.main_ram().to_vec(),
            aux_ram: mem.aux_ram().to_vec(),
            lc_ram: mem.lc_ram().to_vec(),
        }
    }

    /// Peripheral state (queued keys, paddle timers) isn't saved, and is
    /// left as it was.
    pub fn restore(&self, emu: &mut Emulator) -> Result<()> {
        ensure!(
            self.version == VERSION,
            "save state version {} isn't supported (expected {VERSION})",
            self.version
        );
        let io: [u8; 0x100] = self
            .io
            .as_slice()
            .try_into()
            .with_context(|| format!("I/O page is {} bytes", self.io.len()))?;

        let mem = emu.mem_mut();
        mem.restore_ram(&self.main_ram, &self.aux_ram, &self.lc_ram)?;
        mem.io_mut().restore(&self.switches, IoPage::from_bytes(io));
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("malformed save state")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("saved state to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{display::DisplayConfig, memory::io::soft_switches::AccessPolicy};

    fn emu() -> Emulator {
        Emulator::new(None, AccessPolicy::DEFAULT, DisplayConfig::default())
    }

    #[test]
    fn switches_and_ram_survive() {
        let mut a = emu();
        a.load(0x2000, &[1, 2, 3], false).unwrap();
        a.load(0x400, &[4], true).unwrap();
        for addr in [0xc050, 0xc057, 0xc00d, 0xc00f, 0xc08b] {
            a.write(addr, 0, 0);
        }
        a.write(0xd123, 9, 0);

        let json = SaveState::capture(&a).to_json().unwrap();
        let mut b = emu();
        SaveState::from_json(&json).unwrap().restore(&mut b).unwrap();

        assert_eq!(
            a.mem().io().switches().states(),
            b.mem().io().switches().states()
        );
        assert_eq!(a.mem().io().switches().bank(), b.mem().io().switches().bank());
        assert_eq!(a.snapshots(), b.snapshots());
        assert_eq!(9, b.read(0xd123, 0));
        assert_eq!(a.mem().io().page(), b.mem().io().page());
    }

    #[test]
    fn wrong_version_rejected() {
        let mut state = SaveState::capture(&emu());
        state.version = 99;
        assert!(state.restore(&mut emu()).is_err());
    }

    #[test]
    fn truncated_ram_rejected() {
        let mut state = SaveState::capture(&emu());
        state.main_ram.truncate(10);
        assert!(state.restore(&mut emu()).is_err());
    }

    #[test]
    fn garbage_json_rejected() {
        assert!(SaveState::from_json("{\"version\": 1}").is_err());
    }
}
