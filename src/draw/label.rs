//! Built-in 5x7 bitmap glyphs for placeholder labels.
//!
//! Only what a fallback box needs: upper-case letters (lower case is folded), digits and a
//! little punctuation. Anything else renders as `?`.

use crate::foundation::area::Area;
use crate::foundation::core::Rgba8;

/// Text drawn inside the box that replaces an image that could not be opened.
pub(crate) const FALLBACK_LABEL: &str = "No\ndata";

/// Ink of placeholder labels.
pub(crate) const LABEL_COLOR: Rgba8 = Rgba8::rgb(0x30, 0x30, 0x30);

const GLYPH_W: i32 = 5;
const ADVANCE: i32 = GLYPH_W + 1;
const LINE_H: i32 = 8;

const UNKNOWN: [u8; 7] = [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04];

/// Rows of `c`, top first; bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0; 7],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        _ => UNKNOWN,
    }
}

fn text_width(line: &str) -> i32 {
    (line.chars().count() as i32 * ADVANCE - 1).max(0)
}

/// Inked pixels of `text` as one-pixel-tall runs, each line centered in `area`, cut to
/// `clip`.
pub(crate) fn label_runs(text: &str, area: Area, clip: Area) -> Vec<Area> {
    let lines: Vec<&str> = text.lines().collect();
    let block_h = lines.len() as i32 * LINE_H - 1;
    let top = area.y1 + (area.height() - block_h) / 2;
    let mut runs = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        let y0 = top + row as i32 * LINE_H;
        let left = area.x1 + (area.width() - text_width(line)) / 2;
        for (col, c) in line.chars().enumerate() {
            let x0 = left + col as i32 * ADVANCE;
            for (dy, bits) in glyph(c).into_iter().enumerate() {
                let y = y0 + dy as i32;
                let mut dx = 0;
                while dx < GLYPH_W {
                    if bits & (0x10 >> dx) == 0 {
                        dx += 1;
                        continue;
                    }
                    let start = dx;
                    while dx < GLYPH_W && bits & (0x10 >> dx) != 0 {
                        dx += 1;
                    }
                    let run = Area::new(x0 + start, y, x0 + dx - 1, y);
                    if let Some(run) = run.intersect(&clip) {
                        runs.push(run);
                    }
                }
            }
        }
    }
    runs
}

#[cfg(test)]
#[path = "../../tests/unit/draw/label.rs"]
mod tests;
