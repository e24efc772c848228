//! Language card bank switching, $c080..=$c08f.
//!
//! See the //e Technical Reference Manual, Table 4-6 (page 82). Bit 2 of the
//! address is ignored, so $c084..=$c087 and $c08c..=$c08f mirror the switches
//! four bytes below them.

/// Everything derived from the most recent access to a bank switch.
///
/// Exactly one of the eight per-switch flags is on after any access; the two
/// status bits feed $c011 and $c012.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BankSelect {
    pub read_bsr2: bool,
    pub write_bsr2: bool,
    pub off_bsr2: bool,
    pub rdwr_bsr2: bool,
    pub read_bsr1: bool,
    pub write_bsr1: bool,
    pub off_bsr1: bool,
    pub rdwr_bsr1: bool,

    /// RDLCBNK2 ($c011 hibit): bank 2 is mapped at $d000..$e000.
    pub bank2: bool,
    /// RDLCRAM ($c012 hibit): reads from $d000..=$ffff come from RAM.
    pub read_ram: bool,
}

/// Pure function of the low 4 bits of `addr`.
pub fn decode(addr: u16) -> BankSelect {
    let n = addr & 0b1011;
    BankSelect {
        read_bsr2: n == 0x0,
        write_bsr2: n == 0x1,
        off_bsr2: n == 0x2,
        rdwr_bsr2: n == 0x3,
        read_bsr1: n == 0x8,
        write_bsr1: n == 0x9,
        off_bsr1: n == 0xa,
        rdwr_bsr1: n == 0xb,
        bank2: n <= 0x3,
        read_ram: matches!(n, 0x0 | 0x3 | 0x8 | 0xb),
    }
}

impl BankSelect {
    /// Writes to $d000..=$ffff go to RAM.
    pub fn write_ram(&self) -> bool {
        self.write_bsr2 || self.rdwr_bsr2 || self.write_bsr1 || self.rdwr_bsr1
    }

    /// In switch order: READ, WRITE, OFF, RDWR for bank 2, then bank 1.
    pub fn flags(&self) -> [bool; 8] {
        [
            self.read_bsr2,
            self.write_bsr2,
            self.off_bsr2,
            self.rdwr_bsr2,
            self.read_bsr1,
            self.write_bsr1,
            self.off_bsr1,
            self.rdwr_bsr1,
        ]
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    // (low nibble, index of the one active flag, bank2, read_ram, write_ram)
    #[test_case(0x0, 0, true, true, false; "read bank 2")]
    #[test_case(0x1, 1, true, false, true; "write bank 2")]
    #[test_case(0x2, 2, true, false, false; "off bank 2")]
    #[test_case(0x3, 3, true, true, true; "read write bank 2")]
    #[test_case(0x4, 0, true, true, false; "mirror read bank 2")]
    #[test_case(0x5, 1, true, false, true; "mirror write bank 2")]
    #[test_case(0x6, 2, true, false, false; "mirror off bank 2")]
    #[test_case(0x7, 3, true, true, true; "mirror read write bank 2")]
    #[test_case(0x8, 4, false, true, false; "read bank 1")]
    #[test_case(0x9, 5, false, false, true; "write bank 1")]
    #[test_case(0xa, 6, false, false, false; "off bank 1")]
    #[test_case(0xb, 7, false, true, true; "read write bank 1")]
    #[test_case(0xc, 4, false, true, false; "mirror read bank 1")]
    #[test_case(0xd, 5, false, false, true; "mirror write bank 1")]
    #[test_case(0xe, 6, false, false, false; "mirror off bank 1")]
    #[test_case(0xf, 7, false, true, true; "mirror read write bank 1")]
    fn reference_table(nibble: u16, active: usize, bank2: bool, read_ram: bool, write_ram: bool) {
        let bank = decode(0xc080 | nibble);

        let mut expected = [false; 8];
        expected[active] = true;
        assert_eq!(expected, bank.flags());
        assert_eq!(bank2, bank.bank2);
        assert_eq!(read_ram, bank.read_ram);
        assert_eq!(write_ram, bank.write_ram());
    }

    #[test]
    fn only_low_nibble_matters() {
        assert_eq!(decode(0xc08b), decode(0x000b));
        assert_eq!(decode(0xc083), decode(0xffc7));
    }

    #[test]
    fn power_on_state_reads_rom() {
        let bank = BankSelect::default();
        assert!(!bank.read_ram);
        assert!(!bank.write_ram());
    }
}
