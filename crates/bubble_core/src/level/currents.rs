use crate::error::{Error, Result};
use crate::image::ProgramImage;
use crate::segments::Segment;

use super::{
    CurrentEntry, CurrentRectangle, CurrentRectangles, Direction, LEVEL_COUNT, Level,
};

const COPY_FLAG: u8 = 0x80;
const LEVEL_MASK: u8 = 0x7F;
const MAX_BLOCK_LEN: usize = 0x7F;
const RECT_MARKER: u8 = 0x01;
const RECT_BYTES: usize = 3;
const MIRROR_BYTE: u8 = 0x00;
const MAX_LEFT_TOP: u8 = 31;
const MAX_WIDTH: u8 = 8;
const MAX_HEIGHT: u8 = 32;

fn truncated(needed: usize, available: usize) -> Error {
    Error::out_of_bounds(format!(
        "reading out of bounds: current block needs {needed} bytes, {available} available"
    ))
}

fn decode_rectangle(bytes: [u8; RECT_BYTES]) -> CurrentRectangle {
    let [b0, b1, b2] = bytes;
    let width_minus_one = ((b1 >> 5) & 0b011) | ((b2 >> 3) & 0b100);
    CurrentRectangle {
        direction: Direction::from_bits(b0 >> 1),
        left: b0 >> 3,
        top: b1 & 0x1F,
        width: width_minus_one + 1,
        height: (b2 & 0x1F) + 1,
    }
}

fn encode_rectangle(level: usize, rect: &CurrentRectangle) -> Result<[u8; RECT_BYTES]> {
    if rect.left > MAX_LEFT_TOP
        || rect.top > MAX_LEFT_TOP
        || !(1..=MAX_WIDTH).contains(&rect.width)
        || !(1..=MAX_HEIGHT).contains(&rect.height)
    {
        return Err(Error::malformed(format!(
            "level {level}: current rectangle {}x{} at ({}, {}) outside the encodable range",
            rect.width, rect.height, rect.left, rect.top
        )));
    }
    let w = rect.width - 1;
    let h = rect.height - 1;
    Ok([
        RECT_MARKER | (rect.direction.bits() << 1) | (rect.left << 3),
        rect.top | ((w & 0b011) << 5),
        h | ((w & 0b100) << 3),
    ])
}

/// Decodes one level's current-rectangle value from the front of `bytes`.
///
/// The first byte discriminates: with the high bit set the low seven bits
/// name the level whose rectangles are reused; otherwise it is the length
/// of the rectangle block that follows, where 0 stands for 1. Returns the
/// value and the number of bytes consumed.
pub fn decode_current_block(bytes: &[u8]) -> Result<(CurrentRectangles, usize)> {
    let head = *bytes.first().ok_or_else(|| truncated(1, 0))?;
    if head & COPY_FLAG != 0 {
        let level = head & LEVEL_MASK;
        if level as usize >= LEVEL_COUNT {
            return Err(Error::malformed(format!(
                "current rectangles copy level {level}, only {LEVEL_COUNT} levels exist"
            )));
        }
        return Ok((CurrentRectangles::Copy { level }, 1));
    }

    let len = if head == 0 { 1 } else { head as usize };
    let block = bytes
        .get(1..1 + len)
        .ok_or_else(|| truncated(1 + len, bytes.len()))?;

    let mut entries = Vec::new();
    let mut pos = 0;
    while pos < block.len() {
        if block[pos] & RECT_MARKER == 0 {
            entries.push(CurrentEntry::Mirror);
            pos += 1;
            continue;
        }
        let raw = block
            .get(pos..pos + RECT_BYTES)
            .ok_or_else(|| {
                Error::malformed(format!(
                    "current rectangle at block offset {pos} cut short by a {len}-byte block"
                ))
            })?;
        entries.push(CurrentEntry::Rectangle(decode_rectangle([
            raw[0], raw[1], raw[2],
        ])));
        pos += RECT_BYTES;
    }

    Ok((CurrentRectangles::Entries(entries), 1 + len))
}

pub fn encode_current_block(level: usize, currents: &CurrentRectangles) -> Result<Vec<u8>> {
    match currents {
        CurrentRectangles::Copy { level: source } => {
            if *source as usize >= LEVEL_COUNT {
                return Err(Error::malformed(format!(
                    "level {level}: current rectangles copy level {source}, only {LEVEL_COUNT} levels exist"
                )));
            }
            Ok(vec![COPY_FLAG | source])
        }
        CurrentRectangles::Entries(entries) => {
            if entries.is_empty() {
                return Err(Error::malformed(format!(
                    "level {level}: a current rectangle list needs at least one entry"
                )));
            }
            let mut block = Vec::with_capacity(entries.len() * RECT_BYTES);
            for entry in entries {
                match entry {
                    CurrentEntry::Mirror => block.push(MIRROR_BYTE),
                    CurrentEntry::Rectangle(rect) => {
                        block.extend_from_slice(&encode_rectangle(level, rect)?)
                    }
                }
            }
            if block.len() > MAX_BLOCK_LEN {
                return Err(Error::budget(
                    &format!("current rectangle bytes on level {level}"),
                    block.len(),
                    MAX_BLOCK_LEN,
                ));
            }
            let head = if block.len() == 1 { 0 } else { block.len() as u8 };
            let mut out = Vec::with_capacity(block.len() + 1);
            out.push(head);
            out.extend(block);
            Ok(out)
        }
    }
}

pub(super) fn decode_currents(image: &ProgramImage) -> Result<Vec<CurrentRectangles>> {
    let view = image.segment(Segment::CurrentRects)?;
    let bytes = view.raw();
    let mut pos = 0;
    let mut out = Vec::with_capacity(LEVEL_COUNT);
    for level in 0..LEVEL_COUNT {
        let (currents, used) = decode_current_block(&bytes[pos..])
            .map_err(|e| e.context(format!("current rectangles of level {level}")))?;
        pos += used;
        out.push(currents);
    }
    Ok(out)
}

pub(super) fn encode_currents(levels: &[Level]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (idx, level) in levels.iter().enumerate() {
        out.extend(encode_current_block(idx, &level.currents)?);
    }
    Ok(out)
}
