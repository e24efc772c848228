//! Pulling the displayed bytes out of RAM, in screen order.
//!
//! Screen memory is scrambled: consecutive rows aren't adjacent. Each mode
//! produces an empty snapshot when it isn't being displayed, and otherwise
//! one whose length tells the decoder which variant it is (see
//! `display::Layout`).

use itertools::{interleave, Itertools};

use super::io::soft_switches::{SoftSwitch, SoftSwitches};

pub const TEXT_ROWS: usize = 24;
pub const MIXED_TEXT_ROWS: usize = 4;
pub const HIRES_LINES: usize = 192;
pub const MIXED_HIRES_LINES: usize = 160;
pub const MIXED_LORES_ROWS: usize = 20;

const COLS: usize = 40;

/// Owned copies of what's on screen, safe to decode with no locks held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSnapshots {
    pub text: Vec<u8>,
    pub lores: Vec<u8>,
    pub hires: Vec<u8>,
    pub alt_charset: bool,
}

/// Main and aux RAM plus the switches that say how to read them.
#[derive(Clone, Copy)]
pub struct VideoMemory<'a> {
    main: &'a [u8],
    aux: &'a [u8],
    switches: &'a SoftSwitches,
}

impl<'a> VideoMemory<'a> {
    pub fn new(main: &'a [u8], aux: &'a [u8], switches: &'a SoftSwitches) -> Self {
        Self {
            main,
            aux,
            switches,
        }
    }

    fn on(&self, switch: SoftSwitch) -> bool {
        self.switches.is_set(switch)
    }

    /// 80STORE repurposes PAGE2 for bank selection.
    fn page2(&self) -> bool {
        self.on(SoftSwitch::Page2) && !self.on(SoftSwitch::_80Store)
    }

    fn double_graphics(&self) -> bool {
        self.on(SoftSwitch::_80Col) && !self.on(SoftSwitch::An3)
    }

    fn graphics(&self) -> bool {
        !self.on(SoftSwitch::Text)
    }

    pub fn snapshots(&self) -> VideoSnapshots {
        VideoSnapshots {
            text: self.text(),
            lores: self.lores(),
            hires: self.hires(),
            alt_charset: self.on(SoftSwitch::AltChar),
        }
    }

    /// All 24 rows in text mode; the bottom 4 in mixed graphics mode.
    pub fn text(&self) -> Vec<u8> {
        let rows = if !self.graphics() {
            0..TEXT_ROWS
        } else if self.on(SoftSwitch::Mixed) {
            TEXT_ROWS - MIXED_TEXT_ROWS..TEXT_ROWS
        } else {
            return vec![];
        };
        self.rows(rows, self.on(SoftSwitch::_80Col))
    }

    pub fn lores(&self) -> Vec<u8> {
        if !self.graphics() || self.on(SoftSwitch::Hires) {
            return vec![];
        }
        let rows = if self.on(SoftSwitch::Mixed) {
            MIXED_LORES_ROWS
        } else {
            TEXT_ROWS
        };
        self.rows(0..rows, self.double_graphics())
    }

    pub fn hires(&self) -> Vec<u8> {
        if !self.graphics() || !self.on(SoftSwitch::Hires) {
            return vec![];
        }
        let lines = if self.on(SoftSwitch::Mixed) {
            MIXED_HIRES_LINES
        } else {
            HIRES_LINES
        };
        let base = if self.page2() { 0x4000 } else { 0x2000 };
        let double = self.double_graphics();
        (0..lines)
            .flat_map(|y| self.line(hires_line_addr(base, y), double))
            .collect()
    }

    /// Text and lo-res share page layout.
    fn rows(&self, rows: std::ops::Range<usize>, double: bool) -> Vec<u8> {
        let base = if self.page2() { 0x800 } else { 0x400 };
        rows.flat_map(|r| self.line(text_row_addr(base, r), double))
            .collect()
    }

    /// 40 bytes of main memory, or 80 bytes alternating aux and main.
    fn line(&self, addr: usize, double: bool) -> Vec<u8> {
        let main = &self.main[addr..][..COLS];
        if double {
            let aux = &self.aux[addr..][..COLS];
            interleave(aux, main).copied().collect_vec()
        } else {
            main.to_vec()
        }
    }
}

pub fn text_row_addr(base: usize, row: usize) -> usize {
    base + (row % 8) * 0x80 + (row / 8) * 0x28
}

pub fn hires_line_addr(base: usize, y: usize) -> usize {
    base + (y % 8) * 0x400 + ((y / 8) % 8) * 0x80 + (y / 64) * 0x28
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::memory::{
        io::{peripherals::Peripherals, soft_switches::Access, IoPage},
        RAM_LEN,
    };

    struct Setup {
        main: Vec<u8>,
        aux: Vec<u8>,
        switches: SoftSwitches,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                main: vec![0; RAM_LEN],
                aux: vec![0; RAM_LEN],
                switches: SoftSwitches::default(),
            }
        }

        fn trip(&mut self, addrs: &[u16]) {
            let (mut fx, _clicks) = Peripherals::new();
            let mut io = IoPage::new();
            for &addr in addrs {
                self.switches
                    .dispatch(addr, Access::Write, 0, &mut io, &mut fx);
            }
        }

        fn video(&self) -> VideoMemory<'_> {
            VideoMemory::new(&self.main, &self.aux, &self.switches)
        }
    }

    #[test_case(0, 0x400)]
    #[test_case(1, 0x480)]
    #[test_case(7, 0x780)]
    #[test_case(8, 0x428)]
    #[test_case(16, 0x450)]
    #[test_case(23, 0x7d0)]
    fn text_rows(row: usize, addr: usize) {
        assert_eq!(addr, text_row_addr(0x400, row));
    }

    #[test_case(0, 0x2000)]
    #[test_case(1, 0x2400)]
    #[test_case(8, 0x2080)]
    #[test_case(63, 0x3f80)]
    #[test_case(64, 0x2028)]
    #[test_case(191, 0x3fd0; "last line")]
    fn hires_lines(y: usize, addr: usize) {
        assert_eq!(addr, hires_line_addr(0x2000, y));
    }

    #[test]
    fn power_on_is_full_text() {
        let setup = Setup::new();
        let snaps = setup.video().snapshots();
        assert_eq!(960, snaps.text.len());
        assert!(snaps.lores.is_empty());
        assert!(snaps.hires.is_empty());
        assert!(!snaps.alt_charset);
    }

    #[test]
    fn text_is_in_screen_order() {
        let mut setup = Setup::new();
        setup.main[0x428] = b'X' | 0x80;
        setup.main[0x800] = 1;
        let text = setup.video().text();
        assert_eq!(b'X' | 0x80, text[8 * 40]);

        setup.trip(&[0xc055]);
        assert_eq!(1, setup.video().text()[0]);
    }

    #[test]
    fn eighty_columns_interleave_aux_first() {
        let mut setup = Setup::new();
        setup.aux[0x400] = 1;
        setup.main[0x400] = 2;
        setup.aux[0x401] = 3;
        setup.trip(&[0xc00d]);
        let text = setup.video().text();
        assert_eq!(1920, text.len());
        assert_eq!([1, 2, 3, 0], text[..4]);
    }

    #[test]
    fn store80_pins_page1() {
        let mut setup = Setup::new();
        setup.main[0x400] = 7;
        setup.trip(&[0xc001, 0xc055]);
        assert_eq!(7, setup.video().text()[0]);
    }

    #[test]
    fn mixed_lores() {
        let mut setup = Setup::new();
        setup.trip(&[0xc050, 0xc053]);
        let snaps = setup.video().snapshots();
        assert_eq!(160, snaps.text.len());
        assert_eq!(800, snaps.lores.len());
        assert!(snaps.hires.is_empty());
    }

    #[test]
    fn bottom_text_rows_are_rows_20_to_23() {
        let mut setup = Setup::new();
        setup.main[text_row_addr(0x400, 20)] = 9;
        setup.trip(&[0xc050, 0xc053]);
        assert_eq!(9, setup.video().text()[0]);
    }

    #[test_case(&[0xc050], 0, 960, 0; "full lores")]
    #[test_case(&[0xc050, 0xc057], 0, 0, 7680; "full hires")]
    #[test_case(&[0xc050, 0xc057, 0xc053], 160, 0, 6400; "mixed hires")]
    #[test_case(&[0xc050, 0xc057, 0xc00d], 0, 0, 15360; "double hires")]
    #[test_case(&[0xc050, 0xc057, 0xc00d, 0xc053], 320, 0, 12800; "mixed double hires")]
    #[test_case(&[0xc050, 0xc057, 0xc00d, 0xc05f], 0, 0, 7680; "an3 on is single")]
    #[test_case(&[0xc050, 0xc00d], 0, 1920, 0; "double lores")]
    #[test_case(&[0xc050, 0xc00d, 0xc053], 320, 1600, 0; "mixed double lores")]
    fn snapshot_lengths(addrs: &[u16], text: usize, lores: usize, hires: usize) {
        let mut setup = Setup::new();
        setup.trip(addrs);
        let snaps = setup.video().snapshots();
        assert_eq!(
            (text, lores, hires),
            (snaps.text.len(), snaps.lores.len(), snaps.hires.len())
        );
    }

    #[test]
    fn hires_page2() {
        let mut setup = Setup::new();
        setup.main[0x4000] = 0x7f;
        setup.trip(&[0xc050, 0xc057, 0xc055]);
        assert_eq!(0x7f, setup.video().hires()[0]);
    }

    #[test]
    fn alt_charset_flag() {
        let mut setup = Setup::new();
        setup.trip(&[0xc00f]);
        assert!(setup.video().snapshots().alt_charset);
    }
}
