//! Flat sprite files: every group's sprites back to back in table order,
//! each followed by a trailer byte.

use tracing::debug;

use crate::error::{Error, Result};
use crate::sprite::{SPRITE_BYTES, SPRITE_GROUPS, Sprite, SpriteGroup, sprite_group_def};

pub const FLAT_SPRITE_BYTES: usize = SPRITE_BYTES + 1;
pub const TRAILER_MULTICOLOR: u8 = 0x80;
const TRAILER_COLOR: u8 = 0x0F;

/// Byte offset of the group at `index` in table order.
pub fn group_offset(index: usize) -> usize {
    SPRITE_GROUPS
        .iter()
        .take(index)
        .map(|def| def.count * FLAT_SPRITE_BYTES)
        .sum()
}

/// Length of a complete file.
pub fn flat_len() -> usize {
    group_offset(SPRITE_GROUPS.len())
}

pub fn export_flat(groups: &[SpriteGroup]) -> Result<Vec<u8>> {
    if groups.len() != SPRITE_GROUPS.len() {
        return Err(Error::length_mismatch(
            "sprite groups",
            SPRITE_GROUPS.len(),
            groups.len(),
        ));
    }

    let mut out = Vec::with_capacity(flat_len());
    for (def, group) in SPRITE_GROUPS.iter().zip(groups) {
        if group.name != def.name {
            return Err(Error::malformed(format!(
                "sprite group {:?} found where {:?} was expected",
                group.name, def.name
            )));
        }
        if group.sprites.len() != def.count {
            return Err(Error::length_mismatch(
                &format!("sprite group {}", def.name),
                def.count,
                group.sprites.len(),
            ));
        }
        let trailer = TRAILER_MULTICOLOR | (group.color & TRAILER_COLOR);
        for sprite in &group.sprites {
            out.extend(sprite.to_bytes());
            out.push(trailer);
        }
    }
    Ok(out)
}

pub fn import_flat(bytes: &[u8]) -> Result<Vec<SpriteGroup>> {
    if bytes.len() != flat_len() {
        return Err(Error::length_mismatch("flat sprite bytes", flat_len(), bytes.len()));
    }

    let groups = SPRITE_GROUPS
        .iter()
        .enumerate()
        .map(|(index, def)| {
            let start = group_offset(index);
            let chunk = &bytes[start..start + def.count * FLAT_SPRITE_BYTES];

            let mut color = None;
            let mut sprites = Vec::with_capacity(def.count);
            for (i, slot) in chunk.chunks_exact(FLAT_SPRITE_BYTES).enumerate() {
                let (pixels, trailer) = slot.split_at(SPRITE_BYTES);
                let trailer_color = trailer[0] & TRAILER_COLOR;
                match color {
                    None => color = Some(trailer_color),
                    Some(expected) if expected != trailer_color => {
                        return Err(Error::malformed(format!(
                            "sprite group {} sprite {i} has colour {trailer_color}, the group uses {expected}",
                            def.name
                        )));
                    }
                    Some(_) => {}
                }
                sprites.push(Sprite::from_bytes(pixels)?);
            }

            Ok(SpriteGroup {
                name: def.name.to_string(),
                sprites,
                color: color.unwrap_or(0),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(groups = groups.len(), bytes = bytes.len(), "imported flat sprites");
    Ok(groups)
}

/// Looks up a group's byte range by name.
pub fn group_range(name: &str) -> Option<std::ops::Range<usize>> {
    let def = sprite_group_def(name)?;
    let index = SPRITE_GROUPS.iter().position(|d| d.name == def.name)?;
    let start = group_offset(index);
    Some(start..start + def.count * FLAT_SPRITE_BYTES)
}
