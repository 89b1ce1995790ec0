//! Per-level entities and their bit-level codecs.

mod attributes;
mod codec;
mod currents;
mod monsters;
mod sidebar;
mod tiles;

use std::fmt;
use std::ops::Index;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::glyph::{Glyph, GlyphBlock};

pub use codec::{EncodedLevels, decode_levels, encode_levels};
pub use currents::{decode_current_block, encode_current_block};
pub use monsters::reconstruct_confirmation_bits;

pub const LEVEL_COUNT: usize = 100;
/// The final (boss) level; it never carries a monster list.
pub const BOSS_LEVEL: usize = 99;
pub const LEVEL_WIDTH: usize = 32;
pub const LEVEL_HEIGHT: usize = 25;
/// Rows 1..=23 are stored; rows 0 and 24 are always solid.
pub const STORED_ROWS: std::ops::RangeInclusive<usize> = 1..=23;
/// Tile columns whose storage bits carry the row's default current.
pub const WALL_COLUMNS: [usize; 2] = [0, 1];

pub const MAX_MONSTERS_PER_LEVEL: usize = 6;
pub const MAX_TOTAL_MONSTERS: usize = 572;
pub const MAX_ASYMMETRIC_LEVELS: usize = 45;
pub const MAX_SIDEBAR_LEVELS: usize = 59;
pub const MAX_DELAY: u8 = 63;
pub const MAX_CONFIRMATION_BITS: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Up,
            1 => Self::Right,
            2 => Self::Down,
            _ => Self::Left,
        }
    }

    pub fn bits(&self) -> u8 {
        match *self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        }
    }

    pub fn arrow(&self) -> char {
        match *self {
            Self::Up => '^',
            Self::Right => '>',
            Self::Down => 'v',
            Self::Left => '<',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    ZenChan,
    Mighta,
    Monsta,
    Pulpul,
    Banebou,
    Hidegons,
    Invader,
    Drunk,
}

impl MonsterKind {
    pub const ALL: [MonsterKind; 8] = [
        Self::ZenChan,
        Self::Mighta,
        Self::Monsta,
        Self::Pulpul,
        Self::Banebou,
        Self::Hidegons,
        Self::Invader,
        Self::Drunk,
    ];

    pub fn from_raw(raw: u8) -> Self {
        Self::ALL[(raw & 0b111) as usize]
    }

    pub fn raw(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::ZenChan => "Zen-Chan",
            Self::Mighta => "Mighta",
            Self::Monsta => "Monsta",
            Self::Pulpul => "Pulpul",
            Self::Banebou => "Banebou",
            Self::Hidegons => "Hidegons",
            Self::Invader => "Invader",
            Self::Drunk => "Drunk",
        }
    }

    /// Name of the sprite group that draws this character.
    pub fn sprite_group(&self) -> &'static str {
        match *self {
            Self::ZenChan => "zen_chan",
            Self::Mighta => "mighta",
            Self::Monsta => "monsta",
            Self::Pulpul => "pulpul",
            Self::Banebou => "banebou",
            Self::Hidegons => "hidegons",
            Self::Invader => "invader",
            Self::Drunk => "drunk",
        }
    }

    pub fn from_sprite_group(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.sprite_group() == name)
    }
}

impl fmt::Display for MonsterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub kind: MonsterKind,
    /// Tile column of the spawn point.
    pub x: u8,
    /// Tile row of the spawn point.
    pub y: u8,
    pub facing_left: bool,
    pub delay: u8,
    /// Four bits the game checks before spawning. Their meaning is only
    /// partly understood; decoded monsters always carry the stored value and
    /// `None` asks the encoder for a best-effort reconstruction.
    pub confirmation_bits: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRectangle {
    pub left: u8,
    pub top: u8,
    /// 1..=8
    pub width: u8,
    /// 1..=32
    pub height: u8,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentEntry {
    Rectangle(CurrentRectangle),
    /// Mirror the rectangles so far about the vertical centre line.
    Mirror,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentRectangles {
    /// Reuse another level's rectangle list.
    Copy { level: u8 },
    Entries(Vec<CurrentEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    pub rows: [[bool; LEVEL_WIDTH]; LEVEL_HEIGHT],
}

impl TileGrid {
    /// Solid top and bottom rows plus the two-column walls on each side.
    pub fn framed() -> Self {
        let mut rows = [[false; LEVEL_WIDTH]; LEVEL_HEIGHT];
        rows[0] = [true; LEVEL_WIDTH];
        rows[LEVEL_HEIGHT - 1] = [true; LEVEL_WIDTH];
        for row in rows.iter_mut() {
            for col in [0, 1, LEVEL_WIDTH - 2, LEVEL_WIDTH - 1] {
                row[col] = true;
            }
        }
        Self { rows }
    }

    pub fn is_solid(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, x: usize, y: usize, solid: bool) {
        self.rows[y][x] = solid;
    }

    /// True when every stored row mirrors about the vertical centre line.
    /// Wall columns count as solid since they always decode that way.
    pub fn is_symmetric(&self) -> bool {
        STORED_ROWS.into_iter().all(|y| {
            let row = &self.rows[y];
            let solid = |x: usize| row[x] || WALL_COLUMNS.contains(&x);
            (0..LEVEL_WIDTH / 2).all(|x| solid(x) == solid(LEVEL_WIDTH - 1 - x))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub tiles: TileGrid,
    pub light_color: u8,
    pub dark_color: u8,
    pub platform_glyph: Glyph,
    pub sidebar: Option<GlyphBlock>,
    pub monsters: Vec<Monster>,
    pub currents: CurrentRectangles,
    pub row_currents: [Direction; LEVEL_HEIGHT],
    pub bubble_spawns: [bool; 4],
    pub points_spawn: Point,
    pub powerup_spawn: Point,
}

impl Level {
    /// An empty framed, symmetric level with no monsters or sidebar.
    pub fn blank() -> Self {
        Self {
            tiles: TileGrid::framed(),
            light_color: 0,
            dark_color: 0,
            platform_glyph: Glyph::default(),
            sidebar: None,
            monsters: Vec::new(),
            currents: CurrentRectangles::Entries(vec![CurrentEntry::Mirror]),
            row_currents: [Direction::Up; LEVEL_HEIGHT],
            bubble_spawns: [false; 4],
            points_spawn: Point::default(),
            powerup_spawn: Point::default(),
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.tiles.is_symmetric()
    }
}

/// Exactly [`LEVEL_COUNT`] levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSet(Box<[Level; LEVEL_COUNT]>);

impl LevelSet {
    pub fn from_vec(levels: Vec<Level>) -> Result<Self> {
        let boxed: Box<[Level; LEVEL_COUNT]> = levels
            .into_boxed_slice()
            .try_into()
            .map_err(|rest: Box<[Level]>| Error::length_mismatch("levels", LEVEL_COUNT, rest.len()))?;
        Ok(Self(boxed))
    }

    pub fn blank() -> Self {
        Self(Box::new(std::array::from_fn(|_| Level::blank())))
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.0.get(index)
    }

    /// Replaces one level wholesale.
    pub fn replace(&mut self, index: usize, level: Level) -> Result<Level> {
        let slot = self.0.get_mut(index).ok_or_else(|| {
            Error::out_of_bounds(format!("level index {index}, expected 0..{LEVEL_COUNT}"))
        })?;
        Ok(std::mem::replace(slot, level))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Level> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Level] {
        self.0.as_slice()
    }

    pub fn usage(&self) -> BudgetUsage {
        BudgetUsage::of(self.as_slice())
    }
}

impl Index<usize> for LevelSet {
    type Output = Level;

    fn index(&self, index: usize) -> &Level {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a LevelSet {
    type Item = &'a Level;
    type IntoIter = std::slice::Iter<'a, Level>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for LevelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for LevelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let levels = Vec::<Level>::deserialize(deserializer)?;
        Self::from_vec(levels).map_err(D::Error::custom)
    }
}

/// How much of each shared storage budget a level set uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub monsters: usize,
    pub asymmetric_levels: usize,
    pub sidebar_levels: usize,
}

impl BudgetUsage {
    pub fn of(levels: &[Level]) -> Self {
        Self {
            monsters: levels.iter().map(|l| l.monsters.len()).sum(),
            asymmetric_levels: levels.iter().filter(|l| !l.is_symmetric()).count(),
            sidebar_levels: levels.iter().filter(|l| l.sidebar.is_some()).count(),
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.monsters > MAX_TOTAL_MONSTERS {
            return Err(Error::budget("monsters", self.monsters, MAX_TOTAL_MONSTERS));
        }
        if self.asymmetric_levels > MAX_ASYMMETRIC_LEVELS {
            return Err(Error::budget(
                "asymmetric levels",
                self.asymmetric_levels,
                MAX_ASYMMETRIC_LEVELS,
            ));
        }
        if self.sidebar_levels > MAX_SIDEBAR_LEVELS {
            return Err(Error::budget(
                "levels with custom sidebars",
                self.sidebar_levels,
                MAX_SIDEBAR_LEVELS,
            ));
        }
        Ok(())
    }
}
