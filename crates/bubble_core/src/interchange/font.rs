// Multicolor glyphs for the characters the text panel can print.

use crate::glyph::Glyph;

const INK: u8 = 3;

const DIGITS: [[&str; 8]; 10] = [
    ["....", ".##.", "#..#", "#..#", "#..#", "#..#", ".##.", "...."],
    ["....", "..#.", ".##.", "..#.", "..#.", "..#.", ".###", "...."],
    ["....", ".##.", "#..#", "...#", "..#.", ".#..", "####", "...."],
    ["....", "###.", "...#", ".##.", "...#", "...#", "###.", "...."],
    ["....", "#..#", "#..#", "####", "...#", "...#", "...#", "...."],
    ["....", "####", "#...", "###.", "...#", "...#", "###.", "...."],
    ["....", ".##.", "#...", "###.", "#..#", "#..#", ".##.", "...."],
    ["....", "####", "...#", "..#.", ".#..", ".#..", ".#..", "...."],
    ["....", ".##.", "#..#", ".##.", "#..#", "#..#", ".##.", "...."],
    ["....", ".##.", "#..#", "#..#", ".###", "...#", ".##.", "...."],
];

const LETTER_C: [&str; 8] = ["....", ".###", "#...", "#...", "#...", "#...", ".###", "...."];
const LETTER_S: [&str; 8] = ["....", ".###", "#...", ".##.", "...#", "...#", "###.", "...."];

fn from_pattern(pattern: &[&str; 8]) -> Glyph {
    let mut glyph = Glyph::default();
    for (row, line) in glyph.pixels.iter_mut().zip(pattern) {
        for (px, ch) in row.iter_mut().zip(line.bytes()) {
            *px = if ch == b'#' { INK } else { 0 };
        }
    }
    glyph
}

pub(super) fn digit(value: usize) -> Glyph {
    from_pattern(&DIGITS[value % 10])
}

pub(super) fn letter_c() -> Glyph {
    from_pattern(&LETTER_C)
}

pub(super) fn letter_s() -> Glyph {
    from_pattern(&LETTER_S)
}
