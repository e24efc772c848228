//! Double hi-res: 80 bytes a line, 7 dots each, one dot per pixel.
//!
//! Color comes from a sliding 4-dot window. Each dot contributes to the bit
//! of the color value chosen by its pixel position mod 4, so the window
//! always covers all four bits.

use super::W;

/// Bytes per line, aux and main interleaved.
pub const LINE_BYTES: usize = 80;

/// Window value to lo-res color. The window's bit order is the reverse of
/// the nibble order.
const TRANSLATE: [u8; 16] = [0, 1, 8, 9, 4, 5, 12, 13, 2, 3, 10, 11, 6, 7, 14, 15];

/// Palette indices (into the lo-res palette) for one line.
pub fn line_colors(line: &[u8], color: bool) -> [u8; W] {
    debug_assert_eq!(line.len(), LINE_BYTES);

    // Three zero dots of padding, so the window can slide off the end.
    let mut bits = [0u8; W + 3];
    for (i, bit) in bits[..W].iter_mut().enumerate() {
        *bit = (line[i / 7] >> (i % 7)) & 1;
    }

    let mut out = [0; W];
    for (i, px) in out.iter_mut().enumerate() {
        *px = if color {
            let value = (i..i + 4).fold(0, |acc, j| acc | bits[j] << (3 - j % 4));
            TRANSLATE[value as usize]
        } else if bits[i] != 0 {
            15
        } else {
            0
        };
    }
    out
}
