//! Character glyphs, glyph groups and item records.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::ProgramImage;
use crate::patch::SegmentData;
use crate::segments::Segment;

pub const GLYPH_BYTES: usize = 8;
pub const GLYPH_WIDTH: usize = 4;
pub const GLYPH_HEIGHT: usize = 8;
pub const BLOCK_BYTES: usize = GLYPH_BYTES * 4;

/// An 8x4 multicolor character: each row byte holds four 2-bit pixels,
/// leftmost pixel in the top bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Glyph {
    pub pixels: [[u8; GLYPH_WIDTH]; GLYPH_HEIGHT],
}

impl Glyph {
    pub fn from_bytes(bytes: [u8; GLYPH_BYTES]) -> Self {
        let mut pixels = [[0u8; GLYPH_WIDTH]; GLYPH_HEIGHT];
        for (row, byte) in pixels.iter_mut().zip(bytes) {
            for (x, px) in row.iter_mut().enumerate() {
                *px = (byte >> (6 - 2 * x)) & 0b11;
            }
        }
        Self { pixels }
    }

    pub fn to_bytes(&self) -> [u8; GLYPH_BYTES] {
        let mut out = [0u8; GLYPH_BYTES];
        for (byte, row) in out.iter_mut().zip(&self.pixels) {
            *byte = row
                .iter()
                .enumerate()
                .fold(0u8, |acc, (x, &px)| acc | ((px & 0b11) << (6 - 2 * x)));
        }
        out
    }

    pub fn filled(color: u8) -> Self {
        Self {
            pixels: [[color & 0b11; GLYPH_WIDTH]; GLYPH_HEIGHT],
        }
    }
}

/// 2x2 glyphs stored column-major: top-left, bottom-left, top-right, bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GlyphBlock {
    pub glyphs: [Glyph; 4],
}

impl GlyphBlock {
    pub fn at(&self, col: usize, row: usize) -> &Glyph {
        &self.glyphs[col * 2 + row]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BLOCK_BYTES {
            return Err(Error::length_mismatch("glyph block bytes", BLOCK_BYTES, bytes.len()));
        }
        let mut glyphs = [Glyph::default(); 4];
        for (glyph, chunk) in glyphs.iter_mut().zip(bytes.chunks_exact(GLYPH_BYTES)) {
            let mut raw = [0u8; GLYPH_BYTES];
            raw.copy_from_slice(chunk);
            *glyph = Glyph::from_bytes(raw);
        }
        Ok(Self { glyphs })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.glyphs.iter().flat_map(Glyph::to_bytes).collect()
    }

    pub fn uniform(glyph: Glyph) -> Self {
        Self { glyphs: [glyph; 4] }
    }
}

// --- Glyph groups ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockOrder {
    RowMajor,
    /// Blocks of an element are stored column by column.
    Transposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphGroupDef {
    pub name: &'static str,
    pub segment: Segment,
    pub width: usize,
    pub height: usize,
    pub count: usize,
    pub order: BlockOrder,
}

impl GlyphGroupDef {
    pub fn blocks_per_element(&self) -> usize {
        self.width * self.height
    }

    pub fn byte_len(&self) -> usize {
        self.count * self.blocks_per_element() * BLOCK_BYTES
    }

    /// Grid position of the `k`th stored block of an element.
    fn position(&self, k: usize) -> (usize, usize) {
        match self.order {
            BlockOrder::RowMajor => (k % self.width, k / self.width),
            BlockOrder::Transposed => (k / self.height, k % self.height),
        }
    }
}

pub const GLYPH_GROUPS: [GlyphGroupDef; 5] = [
    GlyphGroupDef {
        name: "items",
        segment: Segment::ItemChars,
        width: 1,
        height: 1,
        count: 62,
        order: BlockOrder::RowMajor,
    },
    GlyphGroupDef {
        name: "bubbles",
        segment: Segment::BubbleChars,
        width: 1,
        height: 1,
        count: 12,
        order: BlockOrder::RowMajor,
    },
    GlyphGroupDef {
        name: "extend",
        segment: Segment::ExtendChars,
        width: 1,
        height: 2,
        count: 6,
        order: BlockOrder::RowMajor,
    },
    GlyphGroupDef {
        name: "lightning",
        segment: Segment::LightningChars,
        width: 2,
        height: 2,
        count: 2,
        order: BlockOrder::Transposed,
    },
    GlyphGroupDef {
        name: "game_over",
        segment: Segment::GameOverChars,
        width: 4,
        height: 1,
        count: 2,
        order: BlockOrder::RowMajor,
    },
];

pub fn glyph_group_def(name: &str) -> Option<&'static GlyphGroupDef> {
    GLYPH_GROUPS.iter().find(|def| def.name == name)
}

/// One element of a glyph group: a `width` x `height` grid of blocks, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGrid {
    pub width: usize,
    pub height: usize,
    pub blocks: Vec<GlyphBlock>,
}

impl BlockGrid {
    pub fn at(&self, x: usize, y: usize) -> Option<&GlyphBlock> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.blocks.get(y * self.width + x)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphGroup {
    pub name: String,
    pub elements: Vec<BlockGrid>,
}

pub fn decode_glyph_group(image: &ProgramImage, def: &GlyphGroupDef) -> Result<GlyphGroup> {
    let view = image.segment(def.segment)?;
    let bytes = view.read(0, def.byte_len())?;
    let blocks = bytes
        .chunks_exact(BLOCK_BYTES)
        .map(GlyphBlock::from_bytes)
        .collect::<Result<Vec<_>>>()?;

    let per_element = def.blocks_per_element();
    let elements = blocks
        .chunks_exact(per_element)
        .map(|stored| {
            let mut grid = vec![GlyphBlock::default(); per_element];
            for (k, block) in stored.iter().enumerate() {
                let (x, y) = def.position(k);
                grid[y * def.width + x] = *block;
            }
            BlockGrid {
                width: def.width,
                height: def.height,
                blocks: grid,
            }
        })
        .collect();

    Ok(GlyphGroup {
        name: def.name.to_string(),
        elements,
    })
}

pub fn encode_glyph_group(group: &GlyphGroup) -> Result<SegmentData> {
    let def = glyph_group_def(&group.name)
        .ok_or_else(|| Error::malformed(format!("unknown glyph group {:?}", group.name)))?;
    if group.elements.len() != def.count {
        return Err(Error::length_mismatch(
            &format!("glyph group {}", def.name),
            def.count,
            group.elements.len(),
        ));
    }

    let mut bytes = Vec::with_capacity(def.byte_len());
    for (idx, element) in group.elements.iter().enumerate() {
        if element.width != def.width
            || element.height != def.height
            || element.blocks.len() != def.blocks_per_element()
        {
            return Err(Error::length_mismatch(
                &format!(
                    "glyph group {} element {idx} ({}x{} blocks)",
                    def.name, def.width, def.height
                ),
                def.blocks_per_element(),
                element.blocks.len(),
            ));
        }
        for k in 0..def.blocks_per_element() {
            let (x, y) = def.position(k);
            bytes.extend(element.blocks[y * def.width + x].to_bytes());
        }
    }

    debug!(group = def.name, bytes = bytes.len(), "encoded glyph group");
    Ok(SegmentData::new(def.segment, bytes))
}

pub fn decode_glyph_groups(image: &ProgramImage) -> Result<Vec<GlyphGroup>> {
    GLYPH_GROUPS
        .iter()
        .map(|def| decode_glyph_group(image, def))
        .collect()
}

// --- Items ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemCategoryDef {
    pub name: &'static str,
    pub start: usize,
    pub count: usize,
}

pub const ITEM_CATEGORIES: [ItemCategoryDef; 3] = [
    ItemCategoryDef {
        name: "points",
        start: 0,
        count: 40,
    },
    ItemCategoryDef {
        name: "powerups",
        start: 40,
        count: 16,
    },
    ItemCategoryDef {
        name: "specials",
        start: 56,
        count: 6,
    },
];

pub const ITEM_COUNT: usize = 62;

/// An item refers to a block of the `items` glyph group plus a palette
/// index; it carries no pixels of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub block_index: u8,
    pub palette: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCategory {
    pub name: String,
    pub records: Vec<ItemRecord>,
}

pub fn decode_items(image: &ProgramImage) -> Result<Vec<ItemCategory>> {
    let indices = image.segment(Segment::ItemBlockIndices)?;
    let palettes = image.segment(Segment::ItemPalettes)?;

    ITEM_CATEGORIES
        .iter()
        .map(|def| {
            let records = (def.start..def.start + def.count)
                .map(|i| {
                    Ok(ItemRecord {
                        block_index: indices.get(i)?,
                        palette: palettes.get(i)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ItemCategory {
                name: def.name.to_string(),
                records,
            })
        })
        .collect()
}

pub fn encode_items(categories: &[ItemCategory]) -> Result<Vec<SegmentData>> {
    if categories.len() != ITEM_CATEGORIES.len() {
        return Err(Error::length_mismatch(
            "item categories",
            ITEM_CATEGORIES.len(),
            categories.len(),
        ));
    }

    let block_limit = GLYPH_GROUPS[0].count;
    let mut indices = vec![0u8; ITEM_COUNT];
    let mut palettes = vec![0u8; ITEM_COUNT];
    for (def, category) in ITEM_CATEGORIES.iter().zip(categories) {
        if category.name != def.name {
            return Err(Error::malformed(format!(
                "item category {:?} found where {:?} was expected",
                category.name, def.name
            )));
        }
        if category.records.len() != def.count {
            return Err(Error::length_mismatch(
                &format!("item category {}", def.name),
                def.count,
                category.records.len(),
            ));
        }
        for (i, record) in category.records.iter().enumerate() {
            if record.block_index as usize >= block_limit {
                return Err(Error::malformed(format!(
                    "item {} #{i} refers to glyph block {}, only {block_limit} exist",
                    def.name, record.block_index
                )));
            }
            if record.palette > 0x0F {
                return Err(Error::malformed(format!(
                    "item {} #{i} has palette {}, expected 0..15",
                    def.name, record.palette
                )));
            }
            indices[def.start + i] = record.block_index;
            palettes[def.start + i] = record.palette;
        }
    }

    Ok(vec![
        SegmentData::new(Segment::ItemBlockIndices, indices),
        SegmentData::new(Segment::ItemPalettes, palettes),
    ])
}
