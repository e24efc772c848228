//! The soft switch table for $c000..=$c0ff.
//!
//! Addresses come from the Apple //e Technical Reference Manual, Appendix F:
//! Frequently Used Tables, starting on page 258, plus a handful of switches
//! that real software (e.g. Total Replay) pokes at.

use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, ensure, Result};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::{
    bank_select::{self, BankSelect},
    IoPage,
};

/// Status byte written when a switch reads back as on.
pub const SET: u8 = 0x8d;
/// Status byte written when a switch reads back as off.
pub const CLEAR: u8 = 0x0d;

const SLOT6: u16 = 0x60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SoftSwitch {
    _80Store,
    RamRd,
    RamWrt,
    IntCxRom,
    AltZp,
    SlotC3Rom,
    _80Col,
    AltChar,
    KbdStrobe,
    BsrBank2,
    BsrReadRam,
    CassetteOut,
    Speaker,
    EmuByte,
    Text,
    Mixed,
    Page2,
    Hires,
    An0,
    An1,
    An2,
    An3,
    CassetteIn1,
    Pb0,
    Pb1,
    Pb2,
    Joystick12,
    Joystick34,
    CassetteIn2,
    FastChipLock,
    FastChipEnable,
    FastChipSpeed,
    JoystickReset,
    Laser128Ex,
    ReadBsr2,
    WriteBsr2,
    OffBsr2,
    RdWrBsr2,
    ReadBsr1,
    WriteBsr1,
    OffBsr1,
    RdWrBsr1,
    DrvSm0,
    DrvSm1,
    DrvSm2,
    DrvSm3,
    Drive,
    DrvSel,
    DrvData,
    DrvWrite,
}

/// The eight bank switches, in [`BankSelect::flags`] order.
const BANK_SWITCHES: [SoftSwitch; 8] = [
    SoftSwitch::ReadBsr2,
    SoftSwitch::WriteBsr2,
    SoftSwitch::OffBsr2,
    SoftSwitch::RdWrBsr2,
    SoftSwitch::ReadBsr1,
    SoftSwitch::WriteBsr1,
    SoftSwitch::OffBsr1,
    SoftSwitch::RdWrBsr1,
];

/// Side effects that replace the default set/clear logic of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Clear the keyboard strobe and pop the key queue.
    KbdStrobe,
    CassetteOut,
    /// Schedule a speaker click at the current cycle.
    Speaker,
    /// Identifies the machine as an emulator to software that asks.
    EmuByte,
    CassetteIn,
    Pushbutton,
    /// Read the paddle timers.
    Paddles,
    /// Restart the paddle timers.
    PaddleReset,
    /// Handled by the registry itself; see [`bank_select`].
    BankSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    Plain,
    SideEffecting(Handler),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// How an access to an off/on address interacts with `write_only`.
///
/// Status addresses are unaffected by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Handler switches fire on any access. Plain switches flip on any
    /// access unless they're write-only, in which case only writes flip
    /// them. The status byte is refreshed either way.
    HandlersAlwaysTrigger,
    /// An access counts only if "is a write" equals `write_only`; anything
    /// else is ignored completely. Note this means writes to a read/write
    /// switch like TEXT do nothing.
    ExactMatch,
}

impl AccessPolicy {
    pub const DEFAULT: Self = AccessPolicy::HandlersAlwaysTrigger;

    fn admits(self, write_only: bool, kind: SwitchKind, access: Access) -> bool {
        let is_write = access == Access::Write;
        match self {
            AccessPolicy::HandlersAlwaysTrigger => {
                matches!(kind, SwitchKind::SideEffecting(_)) || !write_only || is_write
            }
            AccessPolicy::ExactMatch => is_write == write_only,
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Peripherals implement this to receive their switches' side effects.
///
/// The registry holds no peripheral state; whatever the handler touches
/// belongs to the implementor (plus the shared I/O page).
pub trait SideEffects {
    fn on_toggle(&mut self, handler: Handler, addr: u16, cycles: u64, io: &mut IoPage);
}

/// One row of the switch table.
#[derive(Debug, Clone, Copy)]
pub struct SwitchDef {
    pub switch: SoftSwitch,
    pub off: Option<u16>,
    pub on: Option<u16>,
    pub status: Option<u16>,
    pub write_only: bool,
    pub kind: SwitchKind,
}

impl SwitchDef {
    /// Off at `off`, on at `off + 1`.
    pub fn toggle(switch: SoftSwitch, off: u16, status: Option<u16>) -> Self {
        Self {
            switch,
            off: Some(off),
            on: Some(off + 1),
            status,
            write_only: false,
            kind: SwitchKind::Plain,
        }
    }

    /// A single triggering address, with no "on" counterpart.
    pub fn trigger(switch: SoftSwitch, addr: u16) -> Self {
        Self {
            on: None,
            ..Self::toggle(switch, addr, None)
        }
    }

    /// Only readable; there's nothing to flip.
    pub fn status(switch: SoftSwitch, addr: u16) -> Self {
        Self {
            switch,
            off: None,
            on: None,
            status: Some(addr),
            write_only: false,
            kind: SwitchKind::Plain,
        }
    }

    pub fn write_only(self) -> Self {
        Self {
            write_only: true,
            ..self
        }
    }

    pub fn handler(self, handler: Handler) -> Self {
        Self {
            kind: SwitchKind::SideEffecting(handler),
            ..self
        }
    }

    fn addrs(&self) -> impl Iterator<Item = (u16, Role)> {
        [
            self.off.map(|a| (a, Role::Off)),
            self.on.map(|a| (a, Role::On)),
            self.status.map(|a| (a, Role::Status)),
        ]
        .into_iter()
        .flatten()
    }
}

/// The built-in table.
pub fn standard_table() -> Vec<SwitchDef> {
    use Handler as H;
    use SoftSwitch::*;
    use SwitchDef as D;

    let mut table = vec![
        D::toggle(_80Store, 0xc000, Some(0xc018)).write_only(),
        D::toggle(RamRd, 0xc002, Some(0xc013)).write_only(),
        D::toggle(RamWrt, 0xc004, Some(0xc014)).write_only(),
        D::toggle(IntCxRom, 0xc006, Some(0xc015)).write_only(),
        D::toggle(AltZp, 0xc008, Some(0xc016)).write_only(),
        D::toggle(SlotC3Rom, 0xc00a, Some(0xc017)).write_only(),
        D::toggle(_80Col, 0xc00c, Some(0xc01f)).write_only(),
        D::toggle(AltChar, 0xc00e, Some(0xc01e)).write_only(),
        D::status(KbdStrobe, 0xc010).handler(H::KbdStrobe),
        D::status(BsrBank2, 0xc011),
        D::status(BsrReadRam, 0xc012),
        D::trigger(CassetteOut, 0xc020).handler(H::CassetteOut),
        D::trigger(Speaker, 0xc030).handler(H::Speaker),
        D::status(EmuByte, 0xc04f).handler(H::EmuByte),
        D::toggle(Text, 0xc050, Some(0xc01a)),
        D::toggle(Mixed, 0xc052, Some(0xc01b)),
        D::toggle(Page2, 0xc054, Some(0xc01c)),
        D::toggle(Hires, 0xc056, Some(0xc01d)),
        D::toggle(An0, 0xc058, None),
        D::toggle(An1, 0xc05a, None),
        D::toggle(An2, 0xc05c, None),
        D::toggle(An3, 0xc05e, None),
        D::status(CassetteIn1, 0xc060).handler(H::CassetteIn),
        D::status(Pb0, 0xc061).handler(H::Pushbutton),
        D::status(Pb1, 0xc062).handler(H::Pushbutton),
        D::status(Pb2, 0xc063).handler(H::Pushbutton),
        D::toggle(Joystick12, 0xc064, None).handler(H::Paddles),
        D::toggle(Joystick34, 0xc066, None).handler(H::Paddles),
        D::status(CassetteIn2, 0xc068).handler(H::CassetteIn),
        D::trigger(FastChipLock, 0xc06a),
        D::trigger(FastChipEnable, 0xc06b),
        D::toggle(FastChipSpeed, 0xc06d, None),
        D::trigger(JoystickReset, 0xc070).handler(H::PaddleReset),
        D::toggle(Laser128Ex, 0xc074, None),
    ];

    // Each bank switch also answers at its bit-2 mirror, four bytes up.
    for (switch, lo) in BANK_SWITCHES.into_iter().zip([0, 1, 2, 3, 8, 9, 0xa, 0xb]) {
        let addr = 0xc080 + lo;
        table.push(SwitchDef {
            on: Some(addr + 4),
            ..D::trigger(switch, addr).handler(H::BankSelect)
        });
    }

    let disk = [DrvSm0, DrvSm1, DrvSm2, DrvSm3, Drive, DrvSel, DrvData, DrvWrite];
    for (i, switch) in (0u16..).zip(disk) {
        table.push(D::toggle(switch, 0xc080 + SLOT6 + 2 * i, None));
    }

    table
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Off,
    On,
    Status,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    entry: usize,
    role: Role,
}

#[derive(Debug, Clone)]
struct Entry {
    def: SwitchDef,
    is_set: bool,
}

#[derive(Debug, Clone)]
pub struct SoftSwitches {
    entries: Vec<Entry>,
    /// Indexed by the low byte of the address.
    slots: Box<[Option<Slot>; 0x100]>,
    by_switch: HashMap<SoftSwitch, usize>,
    policy: AccessPolicy,
    bank: BankSelect,
}

impl SoftSwitches {
    pub fn new(policy: AccessPolicy) -> Self {
        match Self::from_table(standard_table(), policy) {
            Ok(switches) => switches,
            Err(e) => panic!("built-in soft switch table is inconsistent: {e}"),
        }
    }

    /// Fails if any address is outside $c000..=$c0ff or claimed twice, or a
    /// switch is listed twice or has no address at all.
    pub fn from_table(table: Vec<SwitchDef>, policy: AccessPolicy) -> Result<Self> {
        let mut slots: Box<[Option<Slot>; 0x100]> = Box::new([None; 0x100]);
        let mut by_switch = HashMap::new();

        for (i, def) in table.iter().enumerate() {
            ensure!(
                def.addrs().next().is_some(),
                "{:?} has no addresses",
                def.switch
            );
            if by_switch.insert(def.switch, i).is_some() {
                bail!("{:?} is listed twice", def.switch);
            }

            for (addr, role) in def.addrs() {
                let [lo, hi] = addr.to_le_bytes();
                ensure!(hi == 0xc0, "{:?}: ${addr:04x} is not an I/O address", def.switch);

                let slot = &mut slots[lo as usize];
                if let Some(other) = slot {
                    bail!(
                        "${addr:04x} is claimed by both {:?} and {:?}",
                        table[other.entry].switch,
                        def.switch
                    );
                }
                *slot = Some(Slot { entry: i, role });
            }
        }

        let entries = table
            .into_iter()
            .map(|def| Entry { def, is_set: false })
            .collect();
        let mut out = Self {
            entries,
            slots,
            by_switch,
            policy,
            bank: BankSelect::default(),
        };
        out.reset();
        Ok(out)
    }

    /// Power-on state: everything off, except we start in text mode.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.is_set = false;
        }
        self.bank = BankSelect::default();
        self.set_state(SoftSwitch::Text, true);
    }

    /// Switches that aren't in the table read as off.
    pub fn is_set(&self, switch: SoftSwitch) -> bool {
        self.by_switch
            .get(&switch)
            .is_some_and(|&i| self.entries[i].is_set)
    }

    /// The language card state, as of the last bank switch access.
    pub fn bank(&self) -> BankSelect {
        self.bank
    }

    /// Called for every CPU access to $c000..=$c0ff.
    ///
    /// Unknown addresses are logged and otherwise ignored; guest software
    /// probes the I/O page all the time.
    pub fn dispatch(
        &mut self,
        addr: u16,
        access: Access,
        cycles: u64,
        io: &mut IoPage,
        fx: &mut dyn SideEffects,
    ) {
        let Some(Slot { entry, role }) = self.lookup(addr) else {
            warn!("unknown soft switch ${addr:04x} ({access:?})");
            return;
        };
        let Entry { def, is_set } = self.entries[entry];
        trace!("${addr:04x} {access:?} -> {:?} {role:?} @{cycles}", def.switch);

        match role {
            Role::Off | Role::On => {
                let admitted = self.policy.admits(def.write_only, def.kind, access);
                match def.kind {
                    SwitchKind::SideEffecting(handler) => {
                        if admitted {
                            self.run(handler, addr, cycles, io, fx);
                        }
                    }
                    SwitchKind::Plain => {
                        if admitted {
                            let on = role == Role::On;
                            if on != is_set {
                                debug!("{:?} {}", def.switch, if on { "on" } else { "off" });
                            }
                            self.entries[entry].is_set = on;
                        } else if self.policy == AccessPolicy::ExactMatch {
                            return;
                        }
                        if let Some(status) = def.status {
                            io.set_status(status, self.entries[entry].is_set);
                        }
                    }
                }
            }
            Role::Status => match def.kind {
                SwitchKind::SideEffecting(handler) => self.run(handler, addr, cycles, io, fx),
                SwitchKind::Plain => io.set_status(addr, is_set),
            },
        }
    }

    /// Every switch's state, for save files.
    pub fn states(&self) -> BTreeMap<SoftSwitch, bool> {
        self.entries
            .iter()
            .map(|e| (e.def.switch, e.is_set))
            .collect()
    }

    /// Inverse of [`Self::states`]. Switches missing from `states` are off.
    pub fn restore(&mut self, states: &BTreeMap<SoftSwitch, bool>) {
        for entry in &mut self.entries {
            entry.is_set = states.get(&entry.def.switch).copied().unwrap_or(false);
        }
        self.bank = BankSelect {
            read_bsr2: self.is_set(SoftSwitch::ReadBsr2),
            write_bsr2: self.is_set(SoftSwitch::WriteBsr2),
            off_bsr2: self.is_set(SoftSwitch::OffBsr2),
            rdwr_bsr2: self.is_set(SoftSwitch::RdWrBsr2),
            read_bsr1: self.is_set(SoftSwitch::ReadBsr1),
            write_bsr1: self.is_set(SoftSwitch::WriteBsr1),
            off_bsr1: self.is_set(SoftSwitch::OffBsr1),
            rdwr_bsr1: self.is_set(SoftSwitch::RdWrBsr1),
            bank2: self.is_set(SoftSwitch::BsrBank2),
            read_ram: self.is_set(SoftSwitch::BsrReadRam),
        };
    }

    fn lookup(&self, addr: u16) -> Option<Slot> {
        let [lo, hi] = addr.to_le_bytes();
        if hi != 0xc0 {
            return None;
        }
        self.slots[lo as usize]
    }

    fn set_state(&mut self, switch: SoftSwitch, on: bool) {
        if let Some(&i) = self.by_switch.get(&switch) {
            self.entries[i].is_set = on;
        }
    }

    fn run(
        &mut self,
        handler: Handler,
        addr: u16,
        cycles: u64,
        io: &mut IoPage,
        fx: &mut dyn SideEffects,
    ) {
        match handler {
            Handler::BankSelect => self.select_bank(addr, io),
            _ => fx.on_toggle(handler, addr, cycles, io),
        }
    }

    fn select_bank(&mut self, addr: u16, io: &mut IoPage) {
        let bank = bank_select::decode(addr);
        debug!("bank select ${addr:04x}: {bank:?}");

        for (switch, on) in BANK_SWITCHES.into_iter().zip(bank.flags()) {
            self.set_state(switch, on);
        }
        self.set_state(SoftSwitch::BsrBank2, bank.bank2);
        self.set_state(SoftSwitch::BsrReadRam, bank.read_ram);
        io.set_status(0xc011, bank.bank2);
        io.set_status(0xc012, bank.read_ram);
        self.bank = bank;
    }
}

impl Default for SoftSwitches {
    fn default() -> Self {
        Self::new(AccessPolicy::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(Handler, u16, u64)>,
    }

    impl SideEffects for Recorder {
        fn on_toggle(&mut self, handler: Handler, addr: u16, cycles: u64, _io: &mut IoPage) {
            self.calls.push((handler, addr, cycles));
        }
    }

    fn setup(policy: AccessPolicy) -> (SoftSwitches, IoPage, Recorder) {
        (SoftSwitches::new(policy), IoPage::new(), Recorder::default())
    }

    #[test]
    fn standard_table_is_consistent() {
        SoftSwitches::from_table(standard_table(), AccessPolicy::DEFAULT).unwrap();
    }

    #[test]
    fn starts_in_text_mode() {
        let switches = SoftSwitches::default();
        let states = switches.states();
        assert!(switches.is_set(SoftSwitch::Text));
        assert!(states
            .iter()
            .all(|(&s, &on)| on == (s == SoftSwitch::Text)));
    }

    #[test_case(0xc019; "vertical blank is unmapped")]
    #[test_case(0xc040; "cassette gap")]
    #[test_case(0xc06c; "between fastchip switches")]
    #[test_case(0xc0ff; "top of page")]
    #[test_case(0xd000; "outside io page")]
    fn unknown_address_changes_nothing(addr: u16) {
        for policy in [AccessPolicy::HandlersAlwaysTrigger, AccessPolicy::ExactMatch] {
            let (mut switches, mut io, mut fx) = setup(policy);
            let before = switches.states();
            for access in [Access::Read, Access::Write] {
                switches.dispatch(addr, access, 7, &mut io, &mut fx);
            }
            assert_eq!(before, switches.states());
            assert_eq!(IoPage::new(), io);
            assert!(fx.calls.is_empty());
        }
    }

    #[test_case(SoftSwitch::Text, 0xc050, 0xc01a)]
    #[test_case(SoftSwitch::Mixed, 0xc052, 0xc01b)]
    #[test_case(SoftSwitch::Page2, 0xc054, 0xc01c)]
    #[test_case(SoftSwitch::Hires, 0xc056, 0xc01d)]
    #[test_case(SoftSwitch::_80Col, 0xc00c, 0xc01f)]
    #[test_case(SoftSwitch::AltChar, 0xc00e, 0xc01e)]
    #[test_case(SoftSwitch::_80Store, 0xc000, 0xc018)]
    fn status_round_trip(switch: SoftSwitch, off: u16, status: u16) {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);

        switches.dispatch(off + 1, Access::Write, 0, &mut io, &mut fx);
        assert!(switches.is_set(switch));
        switches.dispatch(status, Access::Read, 0, &mut io, &mut fx);
        assert_eq!(SET, io.get(status));

        switches.dispatch(off, Access::Write, 0, &mut io, &mut fx);
        assert!(!switches.is_set(switch));
        switches.dispatch(status, Access::Read, 0, &mut io, &mut fx);
        assert_eq!(CLEAR, io.get(status));
    }

    #[test]
    fn write_only_ignores_reads() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::HandlersAlwaysTrigger);

        switches.dispatch(0xc00d, Access::Read, 0, &mut io, &mut fx);
        assert!(!switches.is_set(SoftSwitch::_80Col));
        // The status byte is still refreshed.
        assert_eq!(CLEAR, io.get(0xc01f));

        switches.dispatch(0xc00d, Access::Write, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::_80Col));
        assert_eq!(SET, io.get(0xc01f));
    }

    #[test]
    fn read_write_switch_flips_on_either_access() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::HandlersAlwaysTrigger);

        switches.dispatch(0xc057, Access::Read, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::Hires));
        switches.dispatch(0xc056, Access::Write, 0, &mut io, &mut fx);
        assert!(!switches.is_set(SoftSwitch::Hires));
    }

    #[test]
    fn fastchip_speed_is_a_toggle() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);

        switches.dispatch(0xc06e, Access::Write, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::FastChipSpeed));
        switches.dispatch(0xc06d, Access::Read, 0, &mut io, &mut fx);
        assert!(!switches.is_set(SoftSwitch::FastChipSpeed));
        assert_eq!(IoPage::new(), io, "no status address");
    }

    #[test]
    fn exact_match_write_only() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::ExactMatch);

        switches.dispatch(0xc00f, Access::Read, 0, &mut io, &mut fx);
        assert!(!switches.is_set(SoftSwitch::AltChar));
        assert_eq!(0, io.get(0xc01e), "ignored accesses don't touch the status byte");

        switches.dispatch(0xc00f, Access::Write, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::AltChar));
        assert_eq!(SET, io.get(0xc01e));
    }

    #[test]
    fn exact_match_read_write_switch_ignores_writes() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::ExactMatch);

        switches.dispatch(0xc053, Access::Write, 0, &mut io, &mut fx);
        assert!(!switches.is_set(SoftSwitch::Mixed));

        switches.dispatch(0xc053, Access::Read, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::Mixed));
    }

    #[test]
    fn handlers_fire_on_any_access_by_default() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::HandlersAlwaysTrigger);

        switches.dispatch(0xc030, Access::Read, 100, &mut io, &mut fx);
        switches.dispatch(0xc030, Access::Write, 200, &mut io, &mut fx);
        assert_eq!(
            vec![(Handler::Speaker, 0xc030, 100), (Handler::Speaker, 0xc030, 200)],
            fx.calls
        );
        assert!(!switches.is_set(SoftSwitch::Speaker), "handlers own the state");
    }

    #[test]
    fn exact_match_gates_handlers_too() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::ExactMatch);

        switches.dispatch(0xc030, Access::Write, 1, &mut io, &mut fx);
        assert!(fx.calls.is_empty());
        switches.dispatch(0xc030, Access::Read, 2, &mut io, &mut fx);
        assert_eq!(vec![(Handler::Speaker, 0xc030, 2)], fx.calls);
    }

    #[test_case(0xc010, Handler::KbdStrobe)]
    #[test_case(0xc061, Handler::Pushbutton)]
    #[test_case(0xc063, Handler::Pushbutton)]
    #[test_case(0xc04f, Handler::EmuByte)]
    #[test_case(0xc068, Handler::CassetteIn)]
    fn status_addresses_with_handlers(addr: u16, handler: Handler) {
        for policy in [AccessPolicy::HandlersAlwaysTrigger, AccessPolicy::ExactMatch] {
            let (mut switches, mut io, mut fx) = setup(policy);
            switches.dispatch(addr, Access::Read, 42, &mut io, &mut fx);
            assert_eq!(vec![(handler, addr, 42)], fx.calls);
        }
    }

    #[test]
    fn plain_status_address_refreshes_from_state() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);
        io.set(0xc01a, 0x42);
        switches.dispatch(0xc01a, Access::Read, 0, &mut io, &mut fx);
        assert_eq!(SET, io.get(0xc01a));
    }

    #[test]
    fn bank_select_updates_all_bank_switches() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);

        switches.dispatch(0xc08b, Access::Read, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::RdWrBsr1));
        assert!(!switches.is_set(SoftSwitch::ReadBsr2));
        assert!(!switches.is_set(SoftSwitch::BsrBank2));
        assert!(switches.is_set(SoftSwitch::BsrReadRam));
        assert!(switches.bank().write_ram());
        assert!(fx.calls.is_empty(), "bank select isn't a peripheral");

        // Mirror of $c080.
        switches.dispatch(0xc084, Access::Write, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::ReadBsr2));
        assert!(!switches.is_set(SoftSwitch::RdWrBsr1));
        switches.dispatch(0xc011, Access::Read, 0, &mut io, &mut fx);
        assert_eq!(SET, io.get(0xc011));
        switches.dispatch(0xc012, Access::Read, 0, &mut io, &mut fx);
        assert_eq!(SET, io.get(0xc012));
    }

    #[test]
    fn disk_switches_toggle_independently() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);

        switches.dispatch(0xc0e1, Access::Read, 0, &mut io, &mut fx);
        switches.dispatch(0xc0e9, Access::Read, 0, &mut io, &mut fx);
        assert!(switches.is_set(SoftSwitch::DrvSm0));
        assert!(switches.is_set(SoftSwitch::Drive));
        assert!(!switches.is_set(SoftSwitch::DrvSm1));
        switches.dispatch(0xc0e8, Access::Read, 0, &mut io, &mut fx);
        assert!(!switches.is_set(SoftSwitch::Drive));
    }

    #[test]
    fn reset_restores_power_on_state() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);
        switches.dispatch(0xc050, Access::Read, 0, &mut io, &mut fx);
        switches.dispatch(0xc057, Access::Read, 0, &mut io, &mut fx);
        switches.dispatch(0xc083, Access::Read, 0, &mut io, &mut fx);

        switches.reset();
        assert_eq!(SoftSwitches::default().states(), switches.states());
        assert_eq!(BankSelect::default(), switches.bank());
    }

    #[test]
    fn restore_round_trip() {
        let (mut switches, mut io, mut fx) = setup(AccessPolicy::DEFAULT);
        for addr in [0xc050, 0xc053, 0xc055, 0xc00d, 0xc089] {
            switches.dispatch(addr, Access::Write, 0, &mut io, &mut fx);
        }
        let saved = switches.states();

        let mut restored = SoftSwitches::default();
        restored.restore(&saved);
        assert_eq!(saved, restored.states());
        assert_eq!(switches.bank(), restored.bank());
    }

    #[test]
    fn rejects_duplicate_address() {
        let table = vec![
            SwitchDef::toggle(SoftSwitch::Text, 0xc050, Some(0xc01a)),
            SwitchDef::toggle(SoftSwitch::Mixed, 0xc051, None),
        ];
        let err = SoftSwitches::from_table(table, AccessPolicy::DEFAULT).unwrap_err();
        assert!(err.to_string().contains("$c051"), "{err}");
    }

    #[test]
    fn rejects_switch_without_addresses() {
        let table = vec![SwitchDef {
            status: None,
            ..SwitchDef::status(SoftSwitch::Pb0, 0xc061)
        }];
        assert!(SoftSwitches::from_table(table, AccessPolicy::DEFAULT).is_err());
    }

    #[test]
    fn rejects_non_io_address() {
        let table = vec![SwitchDef::trigger(SoftSwitch::Speaker, 0xc130)];
        assert!(SoftSwitches::from_table(table, AccessPolicy::DEFAULT).is_err());
    }
}
