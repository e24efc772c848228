use super::{DisplayConfig, Rgb};

/// The 16 lo-res (and double hi-res) colors, in nibble order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0x0,
    Magenta = 0x1,
    DarkBlue = 0x2,
    Purple = 0x3,

    DarkGreen = 0x4,
    Grey1 = 0x5,
    MediumBlue = 0x6,
    LightBlue = 0x7,

    Brown = 0x8,
    Orange = 0x9,
    Grey2 = 0xa,
    Pink = 0xb,

    Green = 0xc,
    Yellow = 0xd,
    Aqua = 0xe,
    White = 0xf,
}

const ALL: [Color; 16] = {
    use Color::*;
    [
        Black, Magenta, DarkBlue, Purple, DarkGreen, Grey1, MediumBlue, LightBlue, Brown, Orange,
        Grey2, Pink, Green, Yellow, Aqua, White,
    ]
};

impl Color {
    pub fn rgb(self) -> Rgb {
        match self {
            Color::Black => [0, 0, 0],
            Color::Magenta => [211, 58, 72],
            Color::DarkBlue => [9, 30, 163],
            Color::Purple => [213, 84, 221],

            Color::DarkGreen => [54, 133, 57],
            Color::Grey1 => [104, 104, 104],
            Color::MediumBlue => [51, 68, 246],
            Color::LightBlue => [134, 185, 249],

            Color::Brown => [147, 106, 33],
            Color::Orange => [240, 131, 49],
            Color::Grey2 => [184, 184, 184],
            Color::Pink => [244, 175, 157],

            Color::Green => [97, 219, 64],
            Color::Yellow => [254, 251, 82],
            Color::Aqua => [134, 247, 210],
            Color::White => [255, 255, 255],
        }
    }

    /// Brightness on a monochrome monitor, 0..=255.
    pub fn intensity(self) -> u8 {
        // The green channel is a decent stand-in for luma with these colors.
        self.rgb()[1]
    }
}

/// Hi-res color indices. 4 and 7 duplicate black and white, so the high bit
/// can be added in as-is.
pub mod hires {
    pub const BLACK: u8 = 0;
    pub const GREEN: u8 = 1;
    pub const VIOLET: u8 = 2;
    pub const WHITE: u8 = 3;
    pub const ORANGE: u8 = 5;
    pub const BLUE: u8 = 6;
}

const HIRES_RGB: [Rgb; 8] = [
    [0, 0, 0],
    [1, 255, 1],
    [255, 1, 255],
    [255, 255, 255],
    [0, 0, 0],
    [255, 127, 1],
    [1, 127, 255],
    [255, 255, 255],
];

/// One of the four fixed tables: {lo-res, hi-res} x {color, monochrome}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<Rgb>,
}

impl Palette {
    /// Also used for double hi-res.
    pub fn lores(config: &DisplayConfig) -> Self {
        let entries = ALL
            .iter()
            .map(|&c| {
                if config.color {
                    c.rgb()
                } else {
                    scale(config.phosphor, c.intensity())
                }
            })
            .collect();
        Self { entries }
    }

    pub fn hires(config: &DisplayConfig) -> Self {
        let entries = HIRES_RGB
            .iter()
            .map(|&rgb| match (config.color, rgb) {
                (true, _) => rgb,
                (false, [0, 0, 0]) => rgb,
                (false, _) => config.phosphor,
            })
            .collect();
        Self { entries }
    }

    pub fn rgb(&self, index: u8) -> Rgb {
        self.entries[index as usize]
    }
}

fn scale(rgb: Rgb, intensity: u8) -> Rgb {
    rgb.map(|c| (c as u16 * intensity as u16 / 255) as u8)
}
