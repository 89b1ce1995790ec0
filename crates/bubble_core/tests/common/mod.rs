#![allow(dead_code)]

use bubble_core::glyph::{Glyph, GlyphBlock};
use bubble_core::level::{
    BOSS_LEVEL, CurrentEntry, CurrentRectangle, CurrentRectangles, Direction, LEVEL_COUNT,
    LEVEL_HEIGHT, LEVEL_WIDTH, Level, LevelSet, Monster, MonsterKind, Point,
};
use bubble_core::{ProgramImage, patch_levels};

/// Levels that exercise every field: a quarter asymmetric, a third with a
/// custom sidebar, every seventh copying its predecessor's currents.
pub fn sample_levels() -> LevelSet {
    let levels = (0..LEVEL_COUNT).map(sample_level).collect();
    LevelSet::from_vec(levels).expect("100 levels")
}

pub fn sample_level(i: usize) -> Level {
    let mut level = Level::blank();
    level.light_color = (i % 16) as u8;
    level.dark_color = ((i / 16) % 16) as u8;
    level.platform_glyph = Glyph::filled((i % 4) as u8);

    if i % 3 == 0 {
        level.sidebar = Some(GlyphBlock {
            glyphs: [
                Glyph::filled(1),
                Glyph::filled(2),
                Glyph::filled(3),
                Glyph::filled((i % 4) as u8),
            ],
        });
    }

    let row = 5 + i % 10;
    for x in 4..12 {
        level.tiles.set(x, row, true);
        level.tiles.set(LEVEL_WIDTH - 1 - x, row, true);
    }
    if i % 4 == 0 {
        level.tiles.set(20, 8, true);
    }

    if i != BOSS_LEVEL {
        level.monsters = (0..i % 5)
            .map(|k| Monster {
                kind: MonsterKind::ALL[(k + i) % 8],
                x: (4 + k * 3) as u8,
                y: (3 + k) as u8,
                facing_left: k % 2 == 0,
                delay: ((i + k) % 64) as u8,
                confirmation_bits: Some(((i + k) % 16) as u8),
            })
            .collect();
    }

    level.currents = if i % 7 == 6 {
        CurrentRectangles::Copy {
            level: (i - 1) as u8,
        }
    } else {
        CurrentRectangles::Entries(vec![
            CurrentEntry::Rectangle(CurrentRectangle {
                left: (i % 31) as u8,
                top: 2,
                width: (1 + i % 8) as u8,
                height: (1 + i % 32) as u8,
                direction: Direction::from_bits(i as u8),
            }),
            CurrentEntry::Mirror,
        ])
    };

    for y in 0..LEVEL_HEIGHT {
        level.row_currents[y] = Direction::from_bits((y + i) as u8);
    }
    level.bubble_spawns = [i % 2 == 0, i % 3 == 0, true, false];
    level.points_spawn = Point {
        x: (i % 32) as u8,
        y: (i % 25) as u8,
    };
    level.powerup_spawn = Point {
        x: (31 - i % 32) as u8,
        y: 3,
    };
    level
}

pub fn sample_image() -> ProgramImage {
    patch_levels(&ProgramImage::zeroed(), &sample_levels(), None).expect("sample levels encode")
}

/// An image whose bytes are all non-zero filler, so untouched ranges are
/// easy to tell apart from written ones.
pub fn filler_image() -> ProgramImage {
    let mut bytes = ProgramImage::zeroed().into_bytes();
    for (i, b) in bytes.iter_mut().enumerate().skip(2) {
        *b = (i as u8).wrapping_mul(37) | 0x01;
    }
    ProgramImage::from_bytes(bytes).expect("filler image")
}
