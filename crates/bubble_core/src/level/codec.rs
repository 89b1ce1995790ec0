use tracing::debug;

use crate::error::Result;
use crate::glyph::{GLYPH_BYTES, Glyph};
use crate::image::ProgramImage;
use crate::patch::SegmentData;
use crate::segments::Segment;

use super::attributes::{
    decode_bubble_spawns, decode_colors, decode_item_spawns, encode_bubble_spawns, encode_colors,
    encode_item_spawns,
};
use super::currents::{decode_currents, encode_currents};
use super::monsters::{decode_monsters, encode_monsters};
use super::sidebar::{decode_sidebars, encode_sidebars};
use super::tiles::{decode_tiles, encode_tiles};
use super::{BudgetUsage, LEVEL_COUNT, Level, LevelSet};

/// Serialized level segments plus the budget they consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLevels {
    pub segments: Vec<SegmentData>,
    pub usage: BudgetUsage,
}

impl EncodedLevels {
    pub fn get(&self, segment: Segment) -> Option<&SegmentData> {
        self.segments.iter().find(|data| data.segment == segment)
    }
}

fn decode_platform_glyphs(image: &ProgramImage) -> Result<Vec<Glyph>> {
    let view = image.segment(Segment::PlatformChars)?;
    (0..LEVEL_COUNT)
        .map(|level| {
            let mut raw = [0u8; GLYPH_BYTES];
            raw.copy_from_slice(&view.read(level * GLYPH_BYTES, GLYPH_BYTES)?);
            Ok(Glyph::from_bytes(raw))
        })
        .collect()
}

pub fn decode_levels(image: &ProgramImage) -> Result<LevelSet> {
    let tiles = decode_tiles(image)?;
    let colors = decode_colors(image)?;
    let platforms = decode_platform_glyphs(image)?;
    let sidebars = decode_sidebars(image)?;
    let monsters = decode_monsters(image)?;
    let currents = decode_currents(image)?;
    let spawns = decode_bubble_spawns(image)?;
    let items = decode_item_spawns(image)?;

    let levels = tiles
        .into_iter()
        .zip(colors)
        .zip(platforms)
        .zip(sidebars)
        .zip(monsters)
        .zip(currents)
        .zip(spawns)
        .zip(items)
        .map(
            |(((((((tiles, (light, dark)), platform), sidebar), monsters), currents), spawns), (points, powerups))| Level {
                tiles: tiles.tiles,
                light_color: light,
                dark_color: dark,
                platform_glyph: platform,
                sidebar,
                monsters,
                currents,
                row_currents: tiles.row_currents,
                bubble_spawns: spawns,
                points_spawn: points,
                powerup_spawn: powerups,
            },
        )
        .collect();

    LevelSet::from_vec(levels)
}

/// Serializes every level field into its segment, enforcing the shared
/// monster, asymmetric-level and sidebar budgets.
pub fn encode_levels(levels: &LevelSet) -> Result<EncodedLevels> {
    let levels = levels.as_slice();

    let tiles = encode_tiles(levels)?;
    let (monsters, monster_count) = encode_monsters(levels)?;
    let sidebars = encode_sidebars(levels)?;
    let currents = encode_currents(levels)?;
    let platforms = levels
        .iter()
        .flat_map(|level| level.platform_glyph.to_bytes())
        .collect();

    let usage = BudgetUsage {
        monsters: monster_count,
        asymmetric_levels: tiles.asymmetric_levels,
        sidebar_levels: sidebars.custom_levels,
    };
    debug!(
        tiles = tiles.tiles.len(),
        monsters = monsters.len(),
        currents = currents.len(),
        sidebar_pool = sidebars.pool.len(),
        ?usage,
        "encoded levels"
    );

    let segments = vec![
        SegmentData::new(Segment::Symmetry, tiles.symmetry),
        SegmentData::new(Segment::SidebarIndex, sidebars.indices),
        SegmentData::new(Segment::BgColors, encode_colors(levels)?),
        SegmentData::new(Segment::BubbleSpawns, encode_bubble_spawns(levels)),
        SegmentData::new(Segment::ItemSpawns, encode_item_spawns(levels)?),
        SegmentData::new(Segment::EdgeCurrents, tiles.edge_currents),
        SegmentData::new(Segment::PlatformChars, platforms),
        SegmentData::new(Segment::SidebarChars, sidebars.pool),
        SegmentData::new(Segment::Monsters, monsters),
        SegmentData::new(Segment::CurrentRects, currents),
        SegmentData::new(Segment::Tiles, tiles.tiles),
    ];

    Ok(EncodedLevels { segments, usage })
}
