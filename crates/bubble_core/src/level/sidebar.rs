// The symmetry flag and the sidebar pool index share one byte per level:
// `symmetry` owns bit 7 and `sidebar_index` bits 0-6 of the same bytes.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::glyph::{BLOCK_BYTES, GlyphBlock};
use crate::image::ProgramImage;
use crate::segments::Segment;

use super::{LEVEL_COUNT, Level, MAX_SIDEBAR_LEVELS};

/// Index values at or above this mean "no custom sidebar".
const NO_SIDEBAR_THRESHOLD: u8 = 100;
const NO_SIDEBAR: u8 = 0x7F;

pub(super) struct EncodedSidebars {
    pub indices: Vec<u8>,
    pub pool: Vec<u8>,
    pub custom_levels: usize,
}

pub(super) fn decode_sidebars(image: &ProgramImage) -> Result<Vec<Option<GlyphBlock>>> {
    let indices = image.segment(Segment::SidebarIndex)?;
    let pool = image.segment(Segment::SidebarChars)?;

    (0..LEVEL_COUNT)
        .map(|level| {
            let index = indices.get(level)?;
            if index >= NO_SIDEBAR_THRESHOLD {
                return Ok(None);
            }
            if index as usize >= MAX_SIDEBAR_LEVELS {
                return Err(Error::malformed(format!(
                    "level {level}: sidebar index {index} outside a pool of {MAX_SIDEBAR_LEVELS}"
                )));
            }
            let bytes = pool.read(index as usize * BLOCK_BYTES, BLOCK_BYTES)?;
            GlyphBlock::from_bytes(&bytes).map(Some)
        })
        .collect()
}

/// Identical blocks share one pool slot; slots are handed out in level order.
pub(super) fn encode_sidebars(levels: &[Level]) -> Result<EncodedSidebars> {
    let custom_levels = levels.iter().filter(|l| l.sidebar.is_some()).count();
    if custom_levels > MAX_SIDEBAR_LEVELS {
        return Err(Error::budget(
            "levels with custom sidebars",
            custom_levels,
            MAX_SIDEBAR_LEVELS,
        ));
    }

    let mut slots: HashMap<GlyphBlock, u8> = HashMap::new();
    let mut pool = Vec::new();
    let mut indices = Vec::with_capacity(LEVEL_COUNT);
    for level in levels {
        let Some(block) = level.sidebar else {
            indices.push(NO_SIDEBAR);
            continue;
        };
        let next = slots.len() as u8;
        let slot = *slots.entry(block).or_insert_with(|| {
            pool.extend(block.to_bytes());
            next
        });
        indices.push(slot);
    }

    Ok(EncodedSidebars {
        indices,
        pool,
        custom_levels,
    })
}
