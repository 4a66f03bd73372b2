//! `cv2.putText`, rendered against a small hand-rolled 5x7 bitmap font
//! (digits, uppercase letters, space, and common punctuation) rather than
//! linking a font-rendering crate or shipping Hershey stroke-font data —
//! neither exists in this workspace's dependency corpus, and OpenCV's own
//! Hershey tables aren't redistributable data we can fabricate. Lowercase
//! input is upper-cased before lookup; unknown glyphs render as a blank
//! cell, matching cv2's own silent-skip behavior for unsupported code
//! points.

use igni_decode::RasterFrame;

use crate::geometry::{set_pixel, Color};

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;

fn glyph(c: char) -> [u8; GLYPH_HEIGHT] {
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00001, 0b00001, 0b00001, 0b00001, 0b10001, 0b10001, 0b01110],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100, 0b01000],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        '/' => [0b00001, 0b00010, 0b00100, 0b00100, 0b01000, 0b10000, 0b10000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
        ' ' => [0; GLYPH_HEIGHT],
        _ => [0; GLYPH_HEIGHT],
    }
}

/// Draws `text` with its top-left baseline anchor at `org`, scaling the
/// base 5x7 cell by `font_scale` and spacing glyphs one empty column apart.
/// `bottom_left_origin` flips the vertical draw direction, matching cv2's
/// flag of the same name.
#[allow(clippy::too_many_arguments)]
pub fn put_text(
    frame: &mut RasterFrame,
    text: &str,
    org: (i64, i64),
    font_scale: f64,
    color: Color,
    thickness: i64,
    bottom_left_origin: bool,
) {
    let scale = font_scale.max(0.1);
    let cell_w = (GLYPH_WIDTH as f64 * scale).round().max(1.0) as i64;
    let cell_h = (GLYPH_HEIGHT as f64 * scale).round().max(1.0) as i64;
    let advance = cell_w + (scale.round() as i64).max(1);

    for (i, raw) in text.chars().enumerate() {
        let c = raw.to_ascii_uppercase();
        let bitmap = glyph(c);
        let x_base = org.0 + i as i64 * advance;
        for (row, bits) in bitmap.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let cell_x0 = x_base + (col as f64 * scale).round() as i64;
                let raw_row = if bottom_left_origin {
                    GLYPH_HEIGHT - 1 - row
                } else {
                    row
                };
                let cell_y0 = org.1 + (raw_row as f64 * scale).round() as i64 - cell_h;
                for dy in 0..(scale.max(1.0).round() as i64).max(1) {
                    for dx in 0..(scale.max(1.0).round() as i64).max(1) {
                        set_pixel(frame, cell_x0 + dx, cell_y0 + dy, color);
                    }
                }
                let _ = thickness;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igni_decode::PixFmt;

    #[test]
    fn renders_non_blank_glyph() {
        let mut frame = RasterFrame::black(40, 40, PixFmt::Bgr24);
        put_text(&mut frame, "A", (5, 20), 1.0, [255, 255, 255, 255], 1, false);
        assert!(frame.data.iter().any(|&b| b == 255));
    }

    #[test]
    fn space_renders_nothing() {
        let mut frame = RasterFrame::black(20, 20, PixFmt::Bgr24);
        put_text(&mut frame, " ", (2, 10), 1.0, [255, 255, 255, 255], 1, false);
        assert!(frame.data.iter().all(|&b| b == 0));
    }
}
