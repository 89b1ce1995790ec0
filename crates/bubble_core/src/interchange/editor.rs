//! Structured-editor save files: one charset and one screen per level plus
//! the sprite sets.
//!
//! Screens hold glyph indices rather than tile bits, so the tile grid is
//! re-derived from cell adjacency on import. The current-rectangle list is
//! printed into the text panel for reference and never read back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::glyph::{GLYPH_BYTES, Glyph, GlyphBlock};
use crate::level::{
    CurrentEntry, CurrentRectangles, LEVEL_COUNT, LEVEL_HEIGHT, LEVEL_WIDTH, Level, LevelSet,
    Monster, MonsterKind, TileGrid,
};
use crate::sprite::{Sprite, SpriteGroup, sprite_group_def};

use super::{font, lzw};

pub const APP_NAME: &str = "bubble-ed";
pub const SCREEN_WIDTH: usize = 40;
pub const SCREEN_HEIGHT: usize = 25;
/// First column of the text panel to the right of the level.
pub const PANEL_COLUMN: usize = LEVEL_WIDTH;
pub const PANEL_WIDTH: usize = SCREEN_WIDTH - PANEL_COLUMN;
pub const CELL_PIXELS: i32 = 8;

pub const CHAR_EMPTY: u16 = 0;
pub const CHAR_PLATFORM: u16 = 1;
pub const CHAR_SHADOW_LEFT: u16 = 2;
pub const CHAR_SHADOW_TOP: u16 = 3;
pub const CHAR_SHADOW_CORNER: u16 = 4;
pub const CHAR_SHADOW_DIAGONAL: u16 = 5;
/// Four sidebar quadrants in block order: top-left, bottom-left, top-right, bottom-right.
pub const CHAR_SIDEBAR: u16 = 6;
pub const CHAR_DIGITS: u16 = 10;
pub const CHAR_LETTER_C: u16 = 20;
pub const CHAR_LETTER_S: u16 = 21;
pub const CHARSET_LEN: usize = 22;

const MULTICOLOR_CELL: u8 = 0x08;
const TEXT_COLOR: u8 = 1;
const SHADOW_INK: u8 = 2;
const WALL_COLUMNS: [usize; 4] = [0, 1, LEVEL_WIDTH - 2, LEVEL_WIDTH - 1];

// --- Document model ---

/// Top-level fields around the payload. The payload itself (`data`) is
/// handled separately since a compressed one is not valid Unicode text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub app: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
struct WrittenEnvelope<'a> {
    #[serde(flatten)]
    envelope: &'a Envelope,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorProject {
    pub charsets: Vec<Charset>,
    pub screens: Vec<Screen>,
    pub sprite_sets: Vec<SpriteSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charset {
    pub name: String,
    pub multicolor: bool,
    pub chars: Vec<[u8; GLYPH_BYTES]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Index into the project's charsets.
    pub charset: usize,
    pub background_color: u8,
    pub multicolor1: u8,
    pub multicolor2: u8,
    pub cells: Vec<Vec<u16>>,
    #[serde(default)]
    pub colors: Vec<Vec<u8>>,
    #[serde(default)]
    pub sprites: Vec<SpritePlacement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpritePlacement {
    /// Index into the project's sprite sets.
    pub sprite_set: usize,
    pub frame: usize,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub flipped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteSet {
    pub name: String,
    pub color: u8,
    pub multicolor: bool,
    pub sprites: Vec<Vec<u8>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A parsed save file. Envelope fields this codec does not use are kept as
/// they were read.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorDocument {
    pub envelope: Envelope,
    pub project: EditorProject,
}

impl EditorDocument {
    pub fn new(project: EditorProject) -> Self {
        Self {
            envelope: Envelope {
                app: APP_NAME.to_string(),
                extra: Map::new(),
            },
            project,
        }
    }

    /// Reads a save file. The payload is tried as plain JSON first and
    /// decompressed only when that fails.
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields: BTreeMap<String, Box<RawValue>> =
            serde_json::from_str(text).map_err(|e| Error::from(e).context("editor envelope"))?;
        let data = fields
            .remove("data")
            .ok_or_else(|| Error::malformed("editor envelope has no data field"))?;
        let units = string_units(data.get())?;

        let plain = String::from_utf16(&units)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());
        let payload = match plain {
            Some(value) => value,
            None => {
                let expanded = lzw::decompress(&units)?;
                debug!(
                    compressed = units.len(),
                    expanded = expanded.len(),
                    "decompressed editor payload"
                );
                serde_json::from_str(&expanded)
                    .map_err(|e| Error::from(e).context("editor payload"))?
            }
        };
        let project = serde_json::from_value(payload)
            .map_err(|e| Error::from(e).context("editor project"))?;

        let rest = fields
            .into_iter()
            .map(|(key, raw)| Ok((key, serde_json::from_str::<Value>(raw.get())?)))
            .collect::<Result<Map<String, Value>>>()?;
        let envelope = serde_json::from_value(Value::Object(rest))
            .map_err(|e| Error::from(e).context("editor envelope"))?;
        Ok(Self { envelope, project })
    }

    /// Serializes with the payload stored as uncompressed JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        let written = WrittenEnvelope {
            envelope: &self.envelope,
            data: serde_json::to_string(&self.project)?,
        };
        Ok(serde_json::to_string_pretty(&written)?)
    }
}

fn hex_unit(chars: &mut std::str::Chars<'_>) -> Result<u16> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 {
        return Err(Error::malformed("editor payload ends inside a \\u escape"));
    }
    u16::from_str_radix(&hex, 16)
        .map_err(|_| Error::malformed(format!("editor payload has a bad escape \\u{hex}")))
}

/// UTF-16 code units of a JSON string literal. `\u` escapes are kept as
/// written, including unpaired surrogates a compressed payload may hold.
fn string_units(literal: &str) -> Result<Vec<u16>> {
    let inner = literal
        .trim()
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| Error::malformed("editor payload is not a string"))?;

    let mut units = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buf));
            continue;
        }
        let unit = match chars.next() {
            Some('u') => hex_unit(&mut chars)?,
            Some('n') => u16::from(b'\n'),
            Some('t') => u16::from(b'\t'),
            Some('r') => u16::from(b'\r'),
            Some('b') => 0x08,
            Some('f') => 0x0C,
            Some(c @ ('"' | '\\' | '/')) => c as u16,
            other => {
                return Err(Error::malformed(format!(
                    "editor payload has a bad escape {other:?}"
                )));
            }
        };
        units.push(unit);
    }
    Ok(units)
}

// --- Export ---

/// Glyph index drawn for level cell (`x`, `y`).
pub fn classify_cell(tiles: &TileGrid, x: usize, y: usize) -> u16 {
    if tiles.is_solid(x, y) {
        if WALL_COLUMNS.contains(&x) {
            return CHAR_SIDEBAR + ((x % 2) * 2 + (y % 2)) as u16;
        }
        return CHAR_PLATFORM;
    }
    let left = x > 0 && tiles.is_solid(x - 1, y);
    let above = y > 0 && tiles.is_solid(x, y - 1);
    let above_left = x > 0 && y > 0 && tiles.is_solid(x - 1, y - 1);
    match (left, above, above_left) {
        (true, true, _) => CHAR_SHADOW_CORNER,
        (true, false, _) => CHAR_SHADOW_LEFT,
        (false, true, _) => CHAR_SHADOW_TOP,
        (false, false, true) => CHAR_SHADOW_DIAGONAL,
        (false, false, false) => CHAR_EMPTY,
    }
}

fn shadow_glyph(left: bool, top: bool, diagonal: bool) -> Glyph {
    let mut glyph = Glyph::default();
    for (y, row) in glyph.pixels.iter_mut().enumerate() {
        for (x, px) in row.iter_mut().enumerate() {
            let shaded = (left && x == 0) || (top && y < 2) || (diagonal && x == 0 && y < 2);
            if shaded {
                *px = SHADOW_INK;
            }
        }
    }
    glyph
}

fn level_charset(index: usize, level: &Level) -> Charset {
    let sidebar = level
        .sidebar
        .unwrap_or_else(|| GlyphBlock::uniform(level.platform_glyph));

    let mut glyphs = Vec::with_capacity(CHARSET_LEN);
    glyphs.push(Glyph::default());
    glyphs.push(level.platform_glyph);
    glyphs.push(shadow_glyph(true, false, false));
    glyphs.push(shadow_glyph(false, true, false));
    glyphs.push(shadow_glyph(true, true, false));
    glyphs.push(shadow_glyph(false, false, true));
    glyphs.extend(sidebar.glyphs);
    glyphs.extend((0..10).map(font::digit));
    glyphs.push(font::letter_c());
    glyphs.push(font::letter_s());

    Charset {
        name: format!("level {}", index + 1),
        multicolor: true,
        chars: glyphs.iter().map(Glyph::to_bytes).collect(),
        extra: Map::new(),
    }
}

fn text_char(ch: char) -> u16 {
    match ch {
        '0'..='9' => CHAR_DIGITS + (ch as u16 - '0' as u16),
        'C' => CHAR_LETTER_C,
        'S' => CHAR_LETTER_S,
        _ => CHAR_EMPTY,
    }
}

/// Fixed-width printer over the text panel. Output past the last row is
/// dropped.
struct Cursor<'a> {
    cells: &'a mut [Vec<u16>],
    row: usize,
    clipped: usize,
}

impl<'a> Cursor<'a> {
    fn new(cells: &'a mut [Vec<u16>]) -> Self {
        Self {
            cells,
            row: 0,
            clipped: 0,
        }
    }

    fn print_line(&mut self, text: &str) {
        let Some(row) = self.cells.get_mut(self.row) else {
            self.clipped += 1;
            return;
        };
        for (col, ch) in text.chars().take(PANEL_WIDTH).enumerate() {
            row[PANEL_COLUMN + col] = text_char(ch);
        }
        self.row += 1;
    }
}

fn current_lines(currents: &CurrentRectangles) -> Vec<String> {
    match currents {
        CurrentRectangles::Copy { level } => vec![format!("C {level:02}")],
        CurrentRectangles::Entries(entries) => entries
            .iter()
            .map(|entry| match entry {
                CurrentEntry::Mirror => "S".to_string(),
                CurrentEntry::Rectangle(rect) => format!(
                    "{:02}{:02}{}{:02}{}",
                    rect.left,
                    rect.top,
                    rect.width,
                    rect.height,
                    rect.direction.bits()
                ),
            })
            .collect(),
    }
}

fn level_screen(index: usize, level: &Level, sprites: &[SpriteGroup]) -> Result<Screen> {
    let mut cells = vec![vec![CHAR_EMPTY; SCREEN_WIDTH]; SCREEN_HEIGHT];
    for (y, row) in cells.iter_mut().enumerate().take(LEVEL_HEIGHT) {
        for (x, cell) in row.iter_mut().enumerate().take(LEVEL_WIDTH) {
            *cell = classify_cell(&level.tiles, x, y);
        }
    }

    let mut cursor = Cursor::new(&mut cells);
    for line in current_lines(&level.currents) {
        cursor.print_line(&line);
    }
    if cursor.clipped > 0 {
        warn!(
            level = index,
            clipped = cursor.clipped,
            "current list does not fit the text panel"
        );
    }

    let colors = (0..SCREEN_HEIGHT)
        .map(|_| {
            (0..SCREEN_WIDTH)
                .map(|x| {
                    if x < PANEL_COLUMN {
                        MULTICOLOR_CELL | (level.light_color & 0x07)
                    } else {
                        TEXT_COLOR
                    }
                })
                .collect()
        })
        .collect();

    let sprites = level
        .monsters
        .iter()
        .map(|monster| {
            let group = monster.kind.sprite_group();
            let sprite_set = sprites
                .iter()
                .position(|set| set.name == group)
                .ok_or_else(|| {
                    Error::malformed(format!(
                        "level {}: {} needs sprite group {group}, which is not exported",
                        index + 1,
                        monster.kind
                    ))
                })?;
            Ok(SpritePlacement {
                sprite_set,
                frame: 0,
                x: i32::from(monster.x) * CELL_PIXELS,
                y: i32::from(monster.y) * CELL_PIXELS,
                flipped: monster.facing_left,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Screen {
        name: format!("level {}", index + 1),
        width: SCREEN_WIDTH,
        height: SCREEN_HEIGHT,
        charset: index,
        background_color: 0,
        multicolor1: level.light_color,
        multicolor2: level.dark_color,
        cells,
        colors,
        sprites,
        extra: Map::new(),
    })
}

fn sprite_set(group: &SpriteGroup) -> SpriteSet {
    SpriteSet {
        name: group.name.clone(),
        color: group.color,
        multicolor: true,
        sprites: group.sprites.iter().map(Sprite::to_bytes).collect(),
        extra: Map::new(),
    }
}

/// Builds a project from levels and sprite groups. Monster placements point
/// at their group's position in `sprites`, so every monster kind used must
/// have its group there.
pub fn export_project(levels: &LevelSet, sprites: &[SpriteGroup]) -> Result<EditorProject> {
    let charsets = levels
        .iter()
        .enumerate()
        .map(|(i, level)| level_charset(i, level))
        .collect();
    let screens = levels
        .iter()
        .enumerate()
        .map(|(i, level)| level_screen(i, level, sprites))
        .collect::<Result<Vec<_>>>()?;

    Ok(EditorProject {
        charsets,
        screens,
        sprite_sets: sprites.iter().map(sprite_set).collect(),
        extra: Map::new(),
    })
}

// --- Import ---

fn char_glyph(charset: &Charset, index: u16) -> Result<Glyph> {
    charset
        .chars
        .get(index as usize)
        .map(|bytes| Glyph::from_bytes(*bytes))
        .ok_or_else(|| {
            Error::malformed(format!(
                "charset {:?} has {} chars, char {index} is required",
                charset.name,
                charset.chars.len()
            ))
        })
}

fn is_solid_char(cell: u16) -> bool {
    cell == CHAR_PLATFORM || (CHAR_SIDEBAR..CHAR_SIDEBAR + 4).contains(&cell)
}

fn import_tiles(screen: &Screen) -> Result<TileGrid> {
    if screen.cells.len() < LEVEL_HEIGHT {
        return Err(Error::length_mismatch(
            &format!("screen {:?} rows", screen.name),
            LEVEL_HEIGHT,
            screen.cells.len(),
        ));
    }
    let mut tiles = TileGrid::framed();
    for (y, row) in screen.cells.iter().take(LEVEL_HEIGHT).enumerate() {
        if row.len() < LEVEL_WIDTH {
            return Err(Error::length_mismatch(
                &format!("screen {:?} row {y}", screen.name),
                LEVEL_WIDTH,
                row.len(),
            ));
        }
        for (x, &cell) in row.iter().take(LEVEL_WIDTH).enumerate() {
            tiles.set(x, y, is_solid_char(cell));
        }
    }

    // Shadows are drawn from adjacency; a hand-painted screen may disagree.
    let mismatched = (0..LEVEL_HEIGHT)
        .flat_map(|y| (0..LEVEL_WIDTH).map(move |x| (x, y)))
        .filter(|&(x, y)| screen.cells[y][x] != classify_cell(&tiles, x, y))
        .count();
    if mismatched > 0 {
        debug!(
            screen = screen.name.as_str(),
            mismatched, "cells differ from the derived shadows"
        );
    }
    Ok(tiles)
}

fn import_monsters(screen: &Screen, sprite_sets: &[SpriteSet], base: &Level) -> Result<Vec<Monster>> {
    screen
        .sprites
        .iter()
        .enumerate()
        .map(|(i, placement)| {
            let set = sprite_sets.get(placement.sprite_set).ok_or_else(|| {
                Error::malformed(format!(
                    "screen {:?} sprite {i}: sprite set {} does not exist, only {} are defined",
                    screen.name,
                    placement.sprite_set,
                    sprite_sets.len()
                ))
            })?;
            let kind = MonsterKind::from_sprite_group(&set.name).ok_or_else(|| {
                Error::malformed(format!(
                    "screen {:?} sprite {i}: sprite set {:?} is not a monster",
                    screen.name, set.name
                ))
            })?;
            let cell = |pixels: i32, axis: &str| {
                u8::try_from(pixels / CELL_PIXELS)
                    .ok()
                    .filter(|_| pixels >= 0)
                    .ok_or_else(|| {
                        Error::malformed(format!(
                            "screen {:?} sprite {i}: {axis} {pixels} is off screen",
                            screen.name
                        ))
                    })
            };

            // Delay and confirmation bits are not in the format.
            let (delay, confirmation_bits) = match base.monsters.get(i) {
                Some(prev) if prev.kind == kind => (prev.delay, prev.confirmation_bits),
                _ => (0, None),
            };
            Ok(Monster {
                kind,
                x: cell(placement.x, "x")?,
                y: cell(placement.y, "y")?,
                facing_left: placement.flipped,
                delay,
                confirmation_bits,
            })
        })
        .collect()
}

fn import_level(project: &EditorProject, index: usize, base: &Level) -> Result<Level> {
    let screen = &project.screens[index];
    let charset = project.charsets.get(screen.charset).ok_or_else(|| {
        Error::malformed(format!(
            "screen {:?} refers to charset {}, only {} exist",
            screen.name,
            screen.charset,
            project.charsets.len()
        ))
    })?;

    let platform_glyph = char_glyph(charset, CHAR_PLATFORM)?;
    let mut quadrants = [Glyph::default(); 4];
    for (k, glyph) in quadrants.iter_mut().enumerate() {
        *glyph = char_glyph(charset, CHAR_SIDEBAR + k as u16)?;
    }
    let sidebar = if quadrants.iter().all(|glyph| *glyph == platform_glyph) {
        None
    } else {
        Some(GlyphBlock { glyphs: quadrants })
    };

    Ok(Level {
        tiles: import_tiles(screen)?,
        light_color: screen.multicolor1 & 0x0F,
        dark_color: screen.multicolor2 & 0x0F,
        platform_glyph,
        sidebar,
        monsters: import_monsters(screen, &project.sprite_sets, base)?,
        ..base.clone()
    })
}

/// Rebuilds levels from a project. Fields the format does not carry come
/// from `base`.
pub fn import_levels(project: &EditorProject, base: &LevelSet) -> Result<LevelSet> {
    if project.screens.len() != LEVEL_COUNT {
        return Err(Error::length_mismatch(
            "editor screens",
            LEVEL_COUNT,
            project.screens.len(),
        ));
    }
    let levels = base
        .iter()
        .enumerate()
        .map(|(i, level)| import_level(project, i, level).map_err(|e| e.context(format!("level {i}"))))
        .collect::<Result<Vec<_>>>()?;
    LevelSet::from_vec(levels)
}

pub fn import_sprites(project: &EditorProject) -> Result<Vec<SpriteGroup>> {
    project
        .sprite_sets
        .iter()
        .map(|set| {
            let def = sprite_group_def(&set.name)
                .ok_or_else(|| Error::malformed(format!("unknown sprite set {:?}", set.name)))?;
            if set.sprites.len() != def.count {
                return Err(Error::length_mismatch(
                    &format!("sprite set {}", def.name),
                    def.count,
                    set.sprites.len(),
                ));
            }
            let sprites = set
                .sprites
                .iter()
                .map(|bytes| Sprite::from_bytes(bytes))
                .collect::<Result<Vec<_>>>()
                .map_err(|e| e.context(format!("sprite set {}", def.name)))?;
            Ok(SpriteGroup {
                name: def.name.to_string(),
                sprites,
                color: set.color & 0x0F,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{CurrentRectangle, Direction};

    #[test]
    fn shadows_follow_platform_adjacency() {
        let mut tiles = TileGrid::framed();
        tiles.set(10, 10, true);
        assert_eq!(classify_cell(&tiles, 10, 10), CHAR_PLATFORM);
        assert_eq!(classify_cell(&tiles, 11, 10), CHAR_SHADOW_LEFT);
        assert_eq!(classify_cell(&tiles, 10, 11), CHAR_SHADOW_TOP);
        assert_eq!(classify_cell(&tiles, 11, 11), CHAR_SHADOW_DIAGONAL);
        assert_eq!(classify_cell(&tiles, 12, 12), CHAR_EMPTY);
        assert_eq!(classify_cell(&tiles, 2, 1), CHAR_SHADOW_CORNER);
        assert_eq!(classify_cell(&tiles, 0, 3), CHAR_SIDEBAR + 1);
        assert_eq!(classify_cell(&tiles, 31, 4), CHAR_SIDEBAR + 2);
    }

    #[test]
    fn current_list_prints_fixed_width() {
        let currents = CurrentRectangles::Entries(vec![
            CurrentEntry::Rectangle(CurrentRectangle {
                left: 4,
                top: 12,
                width: 8,
                height: 3,
                direction: Direction::Left,
            }),
            CurrentEntry::Mirror,
        ]);
        assert_eq!(current_lines(&currents), vec!["04128033", "S"]);
        assert_eq!(
            current_lines(&CurrentRectangles::Copy { level: 7 }),
            vec!["C 07"]
        );
    }

    #[test]
    fn long_current_list_is_clipped() {
        let mut cells = vec![vec![CHAR_EMPTY; SCREEN_WIDTH]; SCREEN_HEIGHT];
        let mut cursor = Cursor::new(&mut cells);
        for _ in 0..SCREEN_HEIGHT + 3 {
            cursor.print_line("S");
        }
        assert_eq!(cursor.clipped, 3);
        assert!(cells.iter().all(|row| row[PANEL_COLUMN] == CHAR_LETTER_S));
    }
}
