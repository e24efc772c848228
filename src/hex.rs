use anyhow::{ensure, Context, Result};

use crate::display::Rgb;

/// An address, e.g. a soft switch: `c050`, `$c050`, or `0xc050`. Short
/// forms are zero-padded on the left.
pub fn decode_u16(s: &str) -> Result<u16> {
    let s = strip_prefix(s, &["$", "0x"]);
    ensure!(!s.is_empty(), "empty address");
    ensure!(s.len() <= 4, "address too long: {s:?}");

    let digits = format!("{s:0>4}");
    let [hi, lo] = decode_bytes::<2>(&digits)?;
    Ok(u16::from_be_bytes([hi, lo]))
}

/// A color as six hex digits, with an optional `#`.
pub fn decode_rgb(s: &str) -> Result<Rgb> {
    let s = strip_prefix(s, &["#", "0x"]);
    ensure!(s.len() == 6, "expected RRGGBB, got {s:?}");
    decode_bytes::<3>(s)
}

fn strip_prefix<'a>(s: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|p| s.strip_prefix(p))
        .unwrap_or(s)
}

/// Exactly `2 * N` hex digits.
fn decode_bytes<const N: usize>(s: &str) -> Result<[u8; N]> {
    let nibbles = s.chars().map(hex_to_nibble).collect::<Result<Vec<_>>>()?;
    ensure!(nibbles.len() == 2 * N, "expected {} hex digits: {s:?}", 2 * N);

    let mut out = [0; N];
    for (byte, pair) in out.iter_mut().zip(nibbles.chunks_exact(2)) {
        *byte = pair[0] << 4 | pair[1];
    }
    Ok(out)
}

fn hex_to_nibble(c: char) -> Result<u8> {
    let n: u32 = c
        .to_digit(16)
        .with_context(|| format!("not a hex digit: {c:?}"))?;
    Ok(n as u8)
}
