//! Turning snapshots of video memory into something to look at.
//!
//! Callers never say which variant of a mode they want: the length of the
//! snapshot decides, via the tables below.

pub mod color;
pub mod dhgr;
pub mod gr;
pub mod hgr;
pub mod text;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use color::Palette;

/// Width of every pixel buffer. 280 hi-res dots, each two pixels wide.
pub const W: usize = 560;

pub type Rgb = [u8; 3];

/// The classic green phosphor.
pub const GREEN_PHOSPHOR: Rgb = [0x39, 0xff, 0x14];

/// Owned by the presentation layer and handed to every decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub color: bool,
    /// Used instead of color when `color` is off.
    pub phosphor: Rgb,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            phosphor: GREEN_PHOSPHOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    LoRes,
    HiRes,
}

/// Everything the snapshot length tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Text rows, lo-res rows, or hi-res lines.
    pub lines: usize,
    pub chars_per_line: usize,
    /// Only part of the screen: the bottom 4 text rows, or the top 20 rows
    /// (160 lines) of graphics.
    pub mixed: bool,
    pub double: bool,
}

const fn layout(lines: usize, chars_per_line: usize, mixed: bool) -> Layout {
    Layout {
        lines,
        chars_per_line,
        mixed,
        double: chars_per_line == 80,
    }
}

static TEXT_LAYOUTS: [(usize, Layout); 4] = [
    (160, layout(4, 40, true)),
    (320, layout(4, 80, true)),
    (960, layout(24, 40, false)),
    (1920, layout(24, 80, false)),
];

static LORES_LAYOUTS: [(usize, Layout); 4] = [
    (800, layout(20, 40, true)),
    (960, layout(24, 40, false)),
    (1600, layout(20, 80, true)),
    (1920, layout(24, 80, false)),
];

static HIRES_LAYOUTS: [(usize, Layout); 4] = [
    (6400, layout(160, 40, true)),
    (7680, layout(192, 40, false)),
    (12800, layout(160, 80, true)),
    (15360, layout(192, 80, false)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("no {kind:?} layout is {len} bytes long")]
    UnknownLength { kind: Kind, len: usize },
}

impl Kind {
    fn layouts(self) -> &'static [(usize, Layout)] {
        match self {
            Kind::Text => &TEXT_LAYOUTS,
            Kind::LoRes => &LORES_LAYOUTS,
            Kind::HiRes => &HIRES_LAYOUTS,
        }
    }

    /// `Ok(None)` means the mode isn't active (empty snapshot). Lengths we
    /// don't know are an error rather than a guess.
    pub fn layout(self, len: usize) -> Result<Option<Layout>, DecodeError> {
        if len == 0 {
            return Ok(None);
        }
        self.layouts()
            .iter()
            .find(|&&(n, _)| n == len)
            .map(|&(_, layout)| Some(layout))
            .ok_or_else(|| {
                warn!("rejecting {len}-byte {self:?} snapshot");
                DecodeError::UnknownLength { kind: self, len }
            })
    }
}

/// 560 pixels wide, RGBA, one row per scan line.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    rgba: Vec<u8>,
}

impl PixelBuffer {
    /// Each byte of `indices` is a palette index; one row is [`W`] bytes.
    pub fn from_indices(indices: &[u8], palette: &Palette) -> Self {
        debug_assert_eq!(indices.len() % W, 0);
        let rgba = indices
            .iter()
            .flat_map(|&i| {
                let [r, g, b] = palette.rgb(i);
                [r, g, b, 0xff]
            })
            .collect();
        Self { rgba }
    }

    pub fn width(&self) -> usize {
        W
    }

    pub fn height(&self) -> usize {
        self.rgba.len() / (4 * W)
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn rgb(&self, x: usize, y: usize) -> Rgb {
        let [r, g, b, _] = self.pixel(x, y);
        [r, g, b]
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        assert!(x < W);
        let i = 4 * (y * W + x);
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    /// One scan line as packed 0x00RRGGBB, the way window surfaces want it.
    pub fn row_u32(&self, y: usize) -> impl Iterator<Item = u32> + '_ {
        self.rgba[4 * y * W..][..4 * W]
            .chunks_exact(4)
            .map(|p| pack_rgb([p[0], p[1], p[2]]))
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PixelBuffer({}x{})", self.width(), self.height())
    }
}

pub fn pack_rgb([r, g, b]: Rgb) -> u32 {
    let r = r as u32;
    let g = g as u32;
    let b = b as u32;
    r << 16 | g << 8 | b
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Kind::Text, 160, 4, 40, true)]
    #[test_case(Kind::Text, 320, 4, 80, true)]
    #[test_case(Kind::Text, 960, 24, 40, false)]
    #[test_case(Kind::Text, 1920, 24, 80, false)]
    #[test_case(Kind::LoRes, 800, 20, 40, true)]
    #[test_case(Kind::LoRes, 960, 24, 40, false)]
    #[test_case(Kind::LoRes, 1600, 20, 80, true)]
    #[test_case(Kind::LoRes, 1920, 24, 80, false)]
    #[test_case(Kind::HiRes, 6400, 160, 40, true)]
    #[test_case(Kind::HiRes, 7680, 192, 40, false)]
    #[test_case(Kind::HiRes, 12800, 160, 80, true)]
    #[test_case(Kind::HiRes, 15360, 192, 80, false)]
    fn known_lengths(kind: Kind, len: usize, lines: usize, chars: usize, mixed: bool) {
        let layout = kind.layout(len).unwrap().unwrap();
        assert_eq!(lines, layout.lines);
        assert_eq!(chars, layout.chars_per_line);
        assert_eq!(mixed, layout.mixed);
        assert_eq!(chars == 80, layout.double);
        assert_eq!(len, layout.lines * layout.chars_per_line);
    }

    #[test_case(Kind::Text)]
    #[test_case(Kind::LoRes)]
    #[test_case(Kind::HiRes)]
    fn empty_is_inactive(kind: Kind) {
        assert_eq!(Ok(None), kind.layout(0));
    }

    #[test_case(Kind::Text, 800)]
    #[test_case(Kind::Text, 1024)]
    #[test_case(Kind::LoRes, 160)]
    #[test_case(Kind::LoRes, 1)]
    #[test_case(Kind::HiRes, 7679)]
    #[test_case(Kind::HiRes, 8192; "whole page, not unscrambled")]
    fn unknown_lengths(kind: Kind, len: usize) {
        assert_eq!(
            Err(DecodeError::UnknownLength { kind, len }),
            kind.layout(len)
        );
    }

    #[test]
    fn pack() {
        assert_eq!(0x39ff14, pack_rgb(GREEN_PHOSPHOR));
    }
}
