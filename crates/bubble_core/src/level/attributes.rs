// Fixed-size per-level fields: background colours, bubble spawn flags,
// item spawn points.

use crate::error::{Error, Result};
use crate::image::ProgramImage;
use crate::reader::{BitReader, BitWriter};
use crate::segments::Segment;

use super::{LEVEL_COUNT, Level, Point};

const ITEM_SPAWN_BYTES: usize = 3;
const SPAWN_FIELD_BITS: u32 = 5;
const MAX_SPAWN_COORD: u8 = 31;

// --- Background colours ---

pub(super) fn decode_colors(image: &ProgramImage) -> Result<Vec<(u8, u8)>> {
    let view = image.segment(Segment::BgColors)?;
    (0..LEVEL_COUNT)
        .map(|level| {
            let b = view.get(level)?;
            Ok((b & 0x0F, b >> 4))
        })
        .collect()
}

pub(super) fn encode_colors(levels: &[Level]) -> Result<Vec<u8>> {
    levels
        .iter()
        .enumerate()
        .map(|(idx, level)| {
            if level.light_color > 0x0F || level.dark_color > 0x0F {
                return Err(Error::malformed(format!(
                    "level {idx}: background colours {}/{} must be 0..15",
                    level.light_color, level.dark_color
                )));
            }
            Ok(level.light_color | (level.dark_color << 4))
        })
        .collect()
}

// --- Bubble spawn flags: two levels per byte, even level in the low nibble ---

pub(super) fn decode_bubble_spawns(image: &ProgramImage) -> Result<Vec<[bool; 4]>> {
    let view = image.segment(Segment::BubbleSpawns)?;
    (0..LEVEL_COUNT)
        .map(|level| {
            let nibble = view.get(level / 2)? >> (4 * (level % 2));
            Ok(std::array::from_fn(|bit| nibble & (1 << bit) != 0))
        })
        .collect()
}

pub(super) fn encode_bubble_spawns(levels: &[Level]) -> Vec<u8> {
    let mut out = vec![0u8; LEVEL_COUNT.div_ceil(2)];
    for (idx, level) in levels.iter().enumerate() {
        let nibble = level
            .bubble_spawns
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, &on)| acc | (u8::from(on) << bit));
        out[idx / 2] |= nibble << (4 * (idx % 2));
    }
    out
}

// --- Item spawn points: 5-bit fields packed MSB first across 3 bytes ---

pub(super) fn decode_item_spawns(image: &ProgramImage) -> Result<Vec<(Point, Point)>> {
    let view = image.segment(Segment::ItemSpawns)?;
    (0..LEVEL_COUNT)
        .map(|level| {
            let bytes = view.read(level * ITEM_SPAWN_BYTES, ITEM_SPAWN_BYTES)?;
            let mut bits = BitReader::new(&bytes);
            let mut field = || bits.read_bits(SPAWN_FIELD_BITS).map(|v| v as u8);
            let points = Point {
                x: field()?,
                y: field()?,
            };
            let powerups = Point {
                x: field()?,
                y: field()?,
            };
            Ok((points, powerups))
        })
        .collect()
}

pub(super) fn encode_item_spawns(levels: &[Level]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(LEVEL_COUNT * ITEM_SPAWN_BYTES);
    for (idx, level) in levels.iter().enumerate() {
        let mut bits = BitWriter::new();
        for point in [level.points_spawn, level.powerup_spawn] {
            if point.x > MAX_SPAWN_COORD || point.y > MAX_SPAWN_COORD {
                return Err(Error::malformed(format!(
                    "level {idx}: item spawn ({}, {}) outside 0..={MAX_SPAWN_COORD}",
                    point.x, point.y
                )));
            }
            bits.write_bits(u32::from(point.x), SPAWN_FIELD_BITS);
            bits.write_bits(u32::from(point.y), SPAWN_FIELD_BITS);
        }
        out.extend(bits.finish(ITEM_SPAWN_BYTES));
    }
    Ok(out)
}
