//! Whole-image parse and patch-back.

use tracing::debug;

use crate::error::{Error, Result};
use crate::glyph::{
    GlyphGroup, ItemCategory, decode_glyph_groups, decode_items, encode_glyph_group, encode_items,
    glyph_group_def,
};
use crate::image::ProgramImage;
use crate::level::{EncodedLevels, Level, LevelSet, decode_levels, encode_levels};
use crate::patch::Patch;
use crate::segments::Segment;
use crate::sprite::{SpriteGroup, decode_sprite_groups, encode_sprite_groups, sprite_group_def};

/// Every entity decoded from one program image. Holds no references into
/// the image it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameData {
    pub levels: LevelSet,
    pub sprites: Vec<SpriteGroup>,
    pub glyph_groups: Vec<GlyphGroup>,
    pub items: Vec<ItemCategory>,
}

impl GameData {
    pub fn parse(image: &ProgramImage) -> Result<Self> {
        Ok(Self {
            levels: decode_levels(image).map_err(|e| e.context("levels"))?,
            sprites: decode_sprite_groups(image).map_err(|e| e.context("sprites"))?,
            glyph_groups: decode_glyph_groups(image).map_err(|e| e.context("glyph groups"))?,
            items: decode_items(image).map_err(|e| e.context("items"))?,
        })
    }

    pub fn encode_levels(&self) -> Result<EncodedLevels> {
        encode_levels(&self.levels)
    }

    /// Serializes every entity into one patch covering all segments.
    pub fn to_patch(&self) -> Result<Patch> {
        let mut patch = Patch::from_segment_data(self.encode_levels()?.segments)?;
        patch.extend(encode_sprite_groups(&self.sprites)?)?;
        for group in &self.glyph_groups {
            patch.push(encode_glyph_group(group)?)?;
        }
        patch.extend(encode_items(&self.items)?)?;
        Ok(patch)
    }

    /// Applies the patch to a copy of `original`. With a selection, only
    /// writes to the named segments are merged.
    pub fn patch(&self, original: &ProgramImage, selection: Option<&[Segment]>) -> Result<ProgramImage> {
        let patch = self.to_patch()?;
        let patch = match selection {
            Some(segments) => patch.restricted_to(segments),
            None => patch,
        };
        debug!(segments = patch.segments().len(), "patching image");
        patch.apply(original)
    }
}

/// Patches only level data into a copy of `original`.
pub fn patch_levels(
    original: &ProgramImage,
    levels: &LevelSet,
    selection: Option<&[Segment]>,
) -> Result<ProgramImage> {
    let patch = Patch::from_segment_data(encode_levels(levels)?.segments)?;
    let patch = match selection {
        Some(segments) => patch.restricted_to(segments),
        None => patch,
    };
    patch.apply(original)
}

/// A parsed image together with its pristine bytes.
#[derive(Debug, Clone)]
pub struct Document {
    pub data: GameData,
    original: ProgramImage,
}

impl Document {
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let original = ProgramImage::from_bytes(bytes)?;
        let data = GameData::parse(&original)?;
        Ok(Self { data, original })
    }

    pub fn original(&self) -> &ProgramImage {
        &self.original
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.original.as_bytes().to_vec()
    }

    pub fn to_bytes_modified(&self, selection: Option<&[Segment]>) -> Result<Vec<u8>> {
        Ok(self.data.patch(&self.original, selection)?.into_bytes())
    }

    pub fn set_level(&mut self, index: usize, level: Level) -> Result<()> {
        self.data.levels.replace(index, level)?;
        Ok(())
    }

    pub fn set_levels(&mut self, levels: LevelSet) {
        self.data.levels = levels;
    }

    pub fn set_sprite_group(&mut self, group: SpriteGroup) -> Result<()> {
        let def = sprite_group_def(&group.name)
            .ok_or_else(|| Error::malformed(format!("unknown sprite group {:?}", group.name)))?;
        if group.sprites.len() != def.count {
            return Err(Error::length_mismatch(
                &format!("sprite group {}", def.name),
                def.count,
                group.sprites.len(),
            ));
        }
        let slot = self
            .data
            .sprites
            .iter_mut()
            .find(|existing| existing.name == group.name)
            .ok_or_else(|| Error::malformed(format!("sprite group {} not loaded", def.name)))?;
        *slot = group;
        Ok(())
    }

    pub fn set_sprite_groups(&mut self, groups: Vec<SpriteGroup>) -> Result<()> {
        for group in groups {
            self.set_sprite_group(group)?;
        }
        Ok(())
    }

    pub fn set_glyph_group(&mut self, group: GlyphGroup) -> Result<()> {
        let def = glyph_group_def(&group.name)
            .ok_or_else(|| Error::malformed(format!("unknown glyph group {:?}", group.name)))?;
        if group.elements.len() != def.count {
            return Err(Error::length_mismatch(
                &format!("glyph group {}", def.name),
                def.count,
                group.elements.len(),
            ));
        }
        let slot = self
            .data
            .glyph_groups
            .iter_mut()
            .find(|existing| existing.name == group.name)
            .ok_or_else(|| Error::malformed(format!("glyph group {} not loaded", def.name)))?;
        *slot = group;
        Ok(())
    }

    pub fn set_items(&mut self, items: Vec<ItemCategory>) -> Result<()> {
        encode_items(&items)?;
        self.data.items = items;
        Ok(())
    }
}
