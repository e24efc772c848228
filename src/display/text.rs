//! Text mode. Unlike the graphics modes this doesn't produce pixels: the
//! output is a grid of characters with attributes, for the presentation
//! layer to draw with whatever font it has.

use std::fmt;

use super::{DecodeError, DisplayConfig, Kind, Rgb};

pub const ROWS: usize = 24;

/// Host frames per flash phase.
pub const FLASH_FRAMES: u64 = 24;

/// MouseText and other glyphs with no ASCII equivalent live here, offset by
/// their screen code; Apple II fonts put them in the private use area.
pub const PRIVATE_USE: u32 = 0xe000;

/// Counts host frames so flashing characters blink at a steady rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashClock {
    frame: u64,
}

impl FlashClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Flashing characters show inverse during the "on" phase.
    pub fn is_on(&self) -> bool {
        (self.frame / FLASH_FRAMES) % 2 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Normal,
    Inverse,
    Flashing,
}

/// How a screen code is drawn, before the flash phase is applied.
pub fn attribute(code: u8, alt_charset: bool) -> Attribute {
    match code {
        0x00..=0x3f => Attribute::Inverse,
        0x60..=0x7f if alt_charset => Attribute::Inverse,
        0x40..=0x7f if !alt_charset => Attribute::Flashing,
        _ => Attribute::Normal,
    }
}

/// The character a screen code shows, Apple IIe character set.
pub fn glyph(code: u8, alt_charset: bool) -> char {
    let ascii = match code {
        0x00..=0x1f => code + 0x40,
        0x20..=0x3f => code,
        0x40..=0x5f if alt_charset => return private_use(code),
        0x40..=0x5f => code,
        // Lowercase in the alternate set; the primary set repeats the
        // symbols here, flashing.
        0x60..=0x7f if alt_charset => code,
        0x60..=0x7f => code - 0x40,
        0x80..=0x9f => code - 0x40,
        0xa0..=0xff => code - 0x80,
    };
    if ascii >= 0x7f {
        private_use(ascii)
    } else {
        ascii as char
    }
}

fn private_use(code: u8) -> char {
    char::from_u32(PRIVATE_USE + code as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCell {
    /// Screen row, 0..24; mixed mode only has 20..24.
    pub row: usize,
    pub col: usize,
    pub glyph: char,
    /// After applying the flash phase: draw a filled block in the
    /// foreground color with the glyph in the background color.
    pub inverse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextScreen {
    pub cols: usize,
    pub first_row: usize,
    pub cells: Vec<TextCell>,
    pub foreground: Rgb,
    pub background: Rgb,
}

impl TextScreen {
    pub fn rows(&self) -> impl Iterator<Item = &[TextCell]> + '_ {
        self.cells.chunks(self.cols)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TextCell> {
        let i = row.checked_sub(self.first_row)? * self.cols + col;
        if col < self.cols {
            self.cells.get(i)
        } else {
            None
        }
    }
}

/// Inverse cells aren't shown; this is for terminals and logs.
impl fmt::Display for TextScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|c| c.glyph).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

pub fn decode(
    snapshot: &[u8],
    alt_charset: bool,
    flash_on: bool,
    config: &DisplayConfig,
) -> Result<Option<TextScreen>, DecodeError> {
    let Some(layout) = Kind::Text.layout(snapshot.len())? else {
        return Ok(None);
    };
    let cols = layout.chars_per_line;
    let first_row = if layout.mixed { ROWS - layout.lines } else { 0 };

    let cells = snapshot
        .chunks_exact(cols)
        .enumerate()
        .flat_map(|(r, line)| {
            line.iter().enumerate().map(move |(col, &code)| {
                let inverse = match attribute(code, alt_charset) {
                    Attribute::Normal => false,
                    Attribute::Inverse => true,
                    Attribute::Flashing => flash_on,
                };
                TextCell {
                    row: first_row + r,
                    col,
                    glyph: glyph(code, alt_charset),
                    inverse,
                }
            })
        })
        .collect();

    let foreground = if config.color {
        [0xff, 0xff, 0xff]
    } else {
        config.phosphor
    };
    Ok(Some(TextScreen {
        cols,
        first_row,
        cells,
        foreground,
        background: [0, 0, 0],
    }))
}
