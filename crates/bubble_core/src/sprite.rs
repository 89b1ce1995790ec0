//! Sprite bitmaps and named sprite groups.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::ProgramImage;
use crate::patch::SegmentData;
use crate::segments::Segment;

pub const SPRITE_ROWS: usize = 21;
pub const SPRITE_ROW_BYTES: usize = 3;
pub const SPRITE_BYTES: usize = SPRITE_ROWS * SPRITE_ROW_BYTES;
/// Sprites sit on 64-byte boundaries; the last byte of each slot is padding.
pub const SPRITE_STRIDE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sprite {
    pub rows: [[u8; SPRITE_ROW_BYTES]; SPRITE_ROWS],
}

impl Sprite {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SPRITE_BYTES {
            return Err(Error::length_mismatch("sprite bytes", SPRITE_BYTES, bytes.len()));
        }
        let mut rows = [[0u8; SPRITE_ROW_BYTES]; SPRITE_ROWS];
        for (row, chunk) in rows.iter_mut().zip(bytes.chunks_exact(SPRITE_ROW_BYTES)) {
            row.copy_from_slice(chunk);
        }
        Ok(Self { rows })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.rows.iter().flatten().copied().collect()
    }

    /// 2-bit pixel value at multicolor column `x` (0..12), row `y` (0..21).
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        let byte = self.rows[y][x / 4];
        (byte >> (6 - 2 * (x % 4))) & 0b11
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: u8) {
        let shift = 6 - 2 * (x % 4);
        let byte = &mut self.rows[y][x / 4];
        *byte = (*byte & !(0b11 << shift)) | ((value & 0b11) << shift);
    }
}

/// Where a group's shared colour nibble lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSlot {
    pub segment: Segment,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteGroupDef {
    pub name: &'static str,
    pub segment: Segment,
    pub start: usize,
    pub count: usize,
    pub color: ColorSlot,
}

impl SpriteGroupDef {
    pub fn byte_offset(&self) -> usize {
        self.start * SPRITE_STRIDE
    }
}

const fn group(
    name: &'static str,
    segment: Segment,
    start: usize,
    count: usize,
    color_segment: Segment,
    color_index: usize,
) -> SpriteGroupDef {
    SpriteGroupDef {
        name,
        segment,
        start,
        count,
        color: ColorSlot {
            segment: color_segment,
            index: color_index,
        },
    }
}

pub const SPRITE_GROUPS: [SpriteGroupDef; 13] = [
    group("bub", Segment::SpritesPlayer, 0, 16, Segment::PlayerColors, 0),
    group("bob", Segment::SpritesPlayer, 16, 16, Segment::PlayerColors, 1),
    group("zen_chan", Segment::SpritesMonsters, 0, 6, Segment::MonsterColors, 0),
    group("mighta", Segment::SpritesMonsters, 6, 6, Segment::MonsterColors, 1),
    group("monsta", Segment::SpritesMonsters, 12, 6, Segment::MonsterColors, 2),
    group("pulpul", Segment::SpritesMonsters, 18, 6, Segment::MonsterColors, 3),
    group("banebou", Segment::SpritesMonsters, 24, 6, Segment::MonsterColors, 4),
    group("hidegons", Segment::SpritesMonsters, 30, 6, Segment::MonsterColors, 5),
    group("invader", Segment::SpritesMonsters, 36, 6, Segment::MonsterColors, 6),
    group("drunk", Segment::SpritesMonsters, 42, 6, Segment::MonsterColors, 7),
    group("skel_monsta", Segment::SpritesMonsters, 48, 4, Segment::MonsterColors, 8),
    group("extend_bubble", Segment::SpritesBonus, 0, 6, Segment::BonusColors, 0),
    group("super_drunk", Segment::SpritesBoss, 0, 16, Segment::BonusColors, 1),
];

pub fn sprite_group_def(name: &str) -> Option<&'static SpriteGroupDef> {
    SPRITE_GROUPS.iter().find(|def| def.name == name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteGroup {
    pub name: String,
    pub sprites: Vec<Sprite>,
    pub color: u8,
}

pub fn decode_sprite_group(image: &ProgramImage, def: &SpriteGroupDef) -> Result<SpriteGroup> {
    let view = image.segment(def.segment)?;
    let sprites = (0..def.count)
        .map(|i| {
            let bytes = view.read(def.byte_offset() + i * SPRITE_STRIDE, SPRITE_BYTES)?;
            Sprite::from_bytes(&bytes)
        })
        .collect::<Result<Vec<_>>>()?;
    let color = image.segment(def.color.segment)?.get(def.color.index)?;

    Ok(SpriteGroup {
        name: def.name.to_string(),
        sprites,
        color,
    })
}

pub fn decode_sprite_groups(image: &ProgramImage) -> Result<Vec<SpriteGroup>> {
    SPRITE_GROUPS
        .iter()
        .map(|def| decode_sprite_group(image, def))
        .collect()
}

/// Serializes one group: one segment write per sprite (the padding byte is
/// left alone) plus the colour nibble.
pub fn encode_sprite_group(group: &SpriteGroup) -> Result<Vec<SegmentData>> {
    let def = sprite_group_def(&group.name)
        .ok_or_else(|| Error::malformed(format!("unknown sprite group {:?}", group.name)))?;
    if group.sprites.len() != def.count {
        return Err(Error::length_mismatch(
            &format!("sprite group {}", def.name),
            def.count,
            group.sprites.len(),
        ));
    }
    if group.color > 0x0F {
        return Err(Error::malformed(format!(
            "sprite group {} has colour {}, expected 0..15",
            def.name, group.color
        )));
    }

    let mut out = Vec::with_capacity(def.count + 1);
    for (i, sprite) in group.sprites.iter().enumerate() {
        out.push(SegmentData::at(
            def.segment,
            def.byte_offset() + i * SPRITE_STRIDE,
            sprite.to_bytes(),
        ));
    }
    out.push(SegmentData::at(
        def.color.segment,
        def.color.index,
        vec![group.color],
    ));

    debug!(group = def.name, sprites = def.count, "encoded sprite group");
    Ok(out)
}

pub fn encode_sprite_groups(groups: &[SpriteGroup]) -> Result<Vec<SegmentData>> {
    let mut out = Vec::new();
    for group in groups {
        out.extend(encode_sprite_group(group)?);
    }
    Ok(out)
}
