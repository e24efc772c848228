//! Lo-res graphics: each byte is two stacked blocks, low nibble on top.

use super::{color::Palette, DecodeError, DisplayConfig, Kind, PixelBuffer, W};

/// Each block is 4 scan lines tall; a character cell is two blocks.
pub const BLOCK_H: usize = 4;

/// In double lo-res, the aux-memory bytes (even columns) have their colors
/// rotated one bit.
const DOUBLE_AUX_COLOR: [u8; 16] = [0, 2, 4, 6, 8, 10, 12, 14, 1, 3, 5, 7, 9, 11, 13, 15];

pub fn decode(snapshot: &[u8], config: &DisplayConfig) -> Result<Option<PixelBuffer>, DecodeError> {
    let Some(layout) = Kind::LoRes.layout(snapshot.len())? else {
        return Ok(None);
    };
    let cols = layout.chars_per_line;
    let block_w = W / cols;

    let mut indices = vec![0u8; W * layout.lines * 2 * BLOCK_H];
    for (y, row) in snapshot.chunks_exact(cols).enumerate() {
        for (x, &byte) in row.iter().enumerate() {
            let [top, bottom] = blocks(byte, layout.double && x % 2 == 0);
            for dy in 0..BLOCK_H {
                let top_line = y * 2 * BLOCK_H + dy;
                let bottom_line = top_line + BLOCK_H;
                indices[top_line * W + x * block_w..][..block_w].fill(top);
                indices[bottom_line * W + x * block_w..][..block_w].fill(bottom);
            }
        }
    }

    Ok(Some(PixelBuffer::from_indices(
        &indices,
        &Palette::lores(config),
    )))
}

fn blocks(byte: u8, aux: bool) -> [u8; 2] {
    let nibbles = [byte & 0xf, byte >> 4];
    if aux {
        nibbles.map(|n| DOUBLE_AUX_COLOR[n as usize])
    } else {
        nibbles
    }
}
