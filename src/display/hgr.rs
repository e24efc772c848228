//! Hi-res graphics, including NTSC artifact color.
//!
//! Each byte is 7 dots (bit 0 leftmost) plus a flag bit that shifts the
//! byte's dots half a dot to the right, which swaps violet/green for
//! blue/orange. Every dot is 2 pixels wide in the 560-pixel output.
//!
//! The color rules, walking set bits left to right:
//! * a lone set bit is a 4-pixel run of one color, picked by the parity of
//!   its position and the flag bit;
//! * a set bit followed by another set bit starts a white run, which also
//!   turns the first pixel of the *next* run white;
//! * either way, the following bit has been accounted for and is skipped.

use super::{
    color::{hires, Palette},
    dhgr, DecodeError, DisplayConfig, Kind, PixelBuffer, W,
};

/// Bytes per line, single resolution.
pub const LINE_BYTES: usize = 40;

/// Decodes both single and double hi-res; the snapshot length decides.
pub fn decode(snapshot: &[u8], config: &DisplayConfig) -> Result<Option<PixelBuffer>, DecodeError> {
    let Some(layout) = Kind::HiRes.layout(snapshot.len())? else {
        return Ok(None);
    };

    let mut indices = Vec::with_capacity(W * layout.lines);
    for line in snapshot.chunks_exact(layout.chars_per_line) {
        let colors = if layout.double {
            dhgr::line_colors(line, config.color)
        } else {
            line_colors(line, config.color)
        };
        indices.extend_from_slice(&colors);
    }

    let palette = if layout.double {
        Palette::lores(config)
    } else {
        Palette::hires(config)
    };
    Ok(Some(PixelBuffer::from_indices(&indices, &palette)))
}

/// Palette indices for one 40-byte line.
pub fn line_colors(line: &[u8], color: bool) -> [u8; W] {
    let mut out = [hires::BLACK; W];
    paint(&runs(line, color), &mut out);
    out
}

/// A horizontal stretch of same-colored pixels, except maybe the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    /// Inclusive.
    pub end: usize,
    pub first: u8,
    pub rest: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// The previous run was white; the next run's first pixel will be too.
    PendingWhiteMerge,
}

/// The bit walk. Runs come out in strictly increasing `start` order, and a
/// run may reach into the next one; see [`paint`].
pub fn runs(line: &[u8], color: bool) -> Vec<Run> {
    debug_assert_eq!(line.len(), LINE_BYTES);

    let mut out = vec![];
    let mut state = State::Normal;
    // Parity of the current dot position; flips on each unset bit, and set
    // bits consume two positions.
    let mut even = true;
    let mut skip = false;

    for (i, &byte) in line.iter().enumerate() {
        let high = (byte >> 7) as usize;
        let next_byte_bit0 = line.get(i + 1).is_some_and(|b| b & 1 != 0);

        for b in 0..7 {
            if skip {
                skip = false;
                continue;
            }

            let bit = byte & 1 << b != 0;
            if !bit {
                state = State::Normal;
                even = !even;
                continue;
            }
            let next = if b < 6 {
                byte & 1 << (b + 1) != 0
            } else {
                next_byte_bit0
            };

            let start = i * 14 + 2 * b + high;
            let mut end = start + if color { 3 } else { 1 };
            let first = match state {
                State::PendingWhiteMerge => hires::WHITE,
                State::Normal => artifact_color(even, high),
            };
            let rest = if next {
                end += if color { 2 } else { 3 };
                state = State::PendingWhiteMerge;
                hires::WHITE
            } else {
                state = State::Normal;
                first
            };

            out.push(Run {
                start,
                end: end.min(W - 1),
                first,
                rest,
            });
            skip = true;
        }
    }

    out
}

/// Violet/green without the flag bit, blue/orange with it.
fn artifact_color(even: bool, high: usize) -> u8 {
    let base = if even { hires::VIOLET } else { hires::GREEN };
    base + 4 * high as u8
}

/// Where runs overlap, the later one wins: each run is cut short where the
/// next one starts.
fn paint(runs: &[Run], out: &mut [u8; W]) {
    let mut pending: Option<Run> = None;
    for &run in runs {
        if let Some(mut prev) = pending.take() {
            debug_assert!(prev.start < run.start);
            prev.end = prev.end.min(run.start - 1);
            fill(prev, out);
        }
        pending = Some(run);
    }
    if let Some(last) = pending {
        fill(last, out);
    }
}

fn fill(run: Run, out: &mut [u8; W]) {
    out[run.start] = run.first;
    out[run.start + 1..=run.end].fill(run.rest);
}
