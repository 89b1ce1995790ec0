//! Static segment map of the known program build.
//!
//! Addresses are absolute C64 addresses; they are only meaningful for the
//! one release the table was reverse-engineered from.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const KNOWN_LOAD_ADDRESS: u16 = 0x0801;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Symmetry,
    SidebarIndex,
    BgColors,
    BubbleSpawns,
    ItemSpawns,
    EdgeCurrents,
    PlatformChars,
    SidebarChars,
    Monsters,
    CurrentRects,
    Tiles,
    SpritesPlayer,
    SpritesMonsters,
    SpritesBonus,
    SpritesBoss,
    PlayerColors,
    MonsterColors,
    BonusColors,
    ItemChars,
    BubbleChars,
    ExtendChars,
    LightningChars,
    GameOverChars,
    ItemBlockIndices,
    ItemPalettes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLocation {
    pub segment: Segment,
    pub name: &'static str,
    pub address: u16,
    pub length: usize,
    pub mask: Option<u8>,
}

impl SegmentLocation {
    pub fn mask_or_full(&self) -> u8 {
        self.mask.unwrap_or(0xFF)
    }

    /// One past the last address covered by the segment.
    pub fn end_address(&self) -> usize {
        self.address as usize + self.length
    }
}

const fn loc(
    segment: Segment,
    name: &'static str,
    address: u16,
    length: usize,
    mask: Option<u8>,
) -> SegmentLocation {
    SegmentLocation {
        segment,
        name,
        address,
        length,
        mask,
    }
}

pub const SEGMENT_TABLE: [SegmentLocation; 25] = [
    // Levels
    loc(Segment::Symmetry, "symmetry", 0x4000, 100, Some(0x80)),
    loc(Segment::SidebarIndex, "sidebar_index", 0x4000, 100, Some(0x7F)),
    loc(Segment::BgColors, "bg_colors", 0x4064, 100, None),
    loc(Segment::BubbleSpawns, "bubble_spawns", 0x40C8, 50, None),
    loc(Segment::ItemSpawns, "item_spawns", 0x40FA, 300, None),
    loc(Segment::EdgeCurrents, "edge_currents", 0x4226, 100, Some(0x0F)),
    loc(Segment::PlatformChars, "platform_chars", 0x428A, 800, None),
    loc(Segment::SidebarChars, "sidebar_chars", 0x45AA, 1888, None),
    loc(Segment::Monsters, "monsters", 0x4D0A, 1815, None),
    loc(Segment::CurrentRects, "current_rects", 0x5421, 1200, None),
    loc(Segment::Tiles, "tiles", 0x58D1, 6670, None),
    // Sprites
    loc(Segment::SpritesPlayer, "sprites_player", 0x8000, 2048, None),
    loc(Segment::SpritesMonsters, "sprites_monsters", 0x8800, 3328, None),
    loc(Segment::SpritesBonus, "sprites_bonus", 0x9500, 384, None),
    loc(Segment::SpritesBoss, "sprites_boss", 0x9680, 1024, None),
    loc(Segment::PlayerColors, "player_colors", 0x9A80, 2, Some(0x0F)),
    loc(Segment::MonsterColors, "monster_colors", 0x9A82, 9, Some(0x0F)),
    loc(Segment::BonusColors, "bonus_colors", 0x9A8B, 2, Some(0x0F)),
    // Chars and items
    loc(Segment::ItemChars, "item_chars", 0xA000, 1984, None),
    loc(Segment::BubbleChars, "bubble_chars", 0xA7C0, 384, None),
    loc(Segment::ExtendChars, "extend_chars", 0xA940, 384, None),
    loc(Segment::LightningChars, "lightning_chars", 0xAAC0, 256, None),
    loc(Segment::GameOverChars, "game_over_chars", 0xABC0, 256, None),
    loc(Segment::ItemBlockIndices, "item_block_indices", 0xACC0, 62, None),
    loc(Segment::ItemPalettes, "item_palettes", 0xACFE, 62, Some(0x0F)),
];

pub const LEVEL_SEGMENTS: [Segment; 11] = [
    Segment::Symmetry,
    Segment::SidebarIndex,
    Segment::BgColors,
    Segment::BubbleSpawns,
    Segment::ItemSpawns,
    Segment::EdgeCurrents,
    Segment::PlatformChars,
    Segment::SidebarChars,
    Segment::Monsters,
    Segment::CurrentRects,
    Segment::Tiles,
];

impl Segment {
    pub fn location(self) -> &'static SegmentLocation {
        // The table is ordered like the enum; `segment_table_matches_enum_order` pins it.
        &SEGMENT_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.location().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        SEGMENT_TABLE
            .iter()
            .find(|loc| loc.name == name)
            .map(|loc| loc.segment)
    }

    pub fn all() -> impl Iterator<Item = Segment> {
        SEGMENT_TABLE.iter().map(|loc| loc.segment)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Highest address covered by any segment, exclusive.
pub fn image_end_address() -> usize {
    SEGMENT_TABLE
        .iter()
        .map(SegmentLocation::end_address)
        .max()
        .unwrap_or(0)
}
