use crate::error::{Error, ErrorCode, Result};
use crate::image::ProgramImage;
use crate::segments::Segment;

use super::{
    BOSS_LEVEL, LEVEL_COUNT, Level, MAX_CONFIRMATION_BITS, MAX_DELAY, MAX_MONSTERS_PER_LEVEL,
    MAX_TOTAL_MONSTERS, Monster, MonsterKind,
};

const TERMINATOR: u8 = 0;
const POSITION_SHIFT: u32 = 3;
const KIND_MASK: u8 = 0b0000_0111;
const LOW_CONFIRM_MASK: u8 = 0b0000_0111;
const HIGH_CONFIRM_BIT: u8 = 0b1000_0000;
const FACING_BIT: u8 = 0b0100_0000;
const DELAY_MASK: u8 = 0b0011_1111;
const MAX_POSITION: u8 = 31;

// Values seen on every shipped level for these kinds. The game's use of the
// bits is not understood well enough to derive the others.
const OBSERVED_CONFIRMATION_BITS: [Option<u8>; 8] = [
    Some(0b0001), // Zen-Chan
    Some(0b0011), // Mighta
    Some(0b0001), // Monsta
    Some(0b0101), // Pulpul
    None,
    None,
    Some(0b1000), // Invader
    None,
];

/// Best-effort confirmation bits for a monster created in an editor.
pub fn reconstruct_confirmation_bits(kind: MonsterKind) -> u8 {
    OBSERVED_CONFIRMATION_BITS[kind.raw() as usize].unwrap_or(0)
}

fn decode_monster(bytes: [u8; 3]) -> Monster {
    let [b0, b1, b2] = bytes;
    let confirmation = (b1 & LOW_CONFIRM_MASK) | ((b2 & HIGH_CONFIRM_BIT) >> 4);
    Monster {
        kind: MonsterKind::from_raw(b0 & KIND_MASK),
        x: b0 >> POSITION_SHIFT,
        y: b1 >> POSITION_SHIFT,
        facing_left: b2 & FACING_BIT != 0,
        delay: b2 & DELAY_MASK,
        confirmation_bits: Some(confirmation),
    }
}

fn encode_monster(level: usize, index: usize, monster: &Monster) -> Result<[u8; 3]> {
    let at = || format!("level {level} monster {index}");
    if monster.x > MAX_POSITION || monster.y > MAX_POSITION {
        return Err(Error::malformed(format!(
            "{}: position ({}, {}) outside 0..={MAX_POSITION}",
            at(),
            monster.x,
            monster.y
        )));
    }
    if monster.delay > MAX_DELAY {
        return Err(Error::malformed(format!(
            "{}: delay {} exceeds {MAX_DELAY}",
            at(),
            monster.delay
        )));
    }
    let confirmation = monster
        .confirmation_bits
        .unwrap_or_else(|| reconstruct_confirmation_bits(monster.kind));
    if confirmation > MAX_CONFIRMATION_BITS {
        return Err(Error::malformed(format!(
            "{}: confirmation bits {confirmation:#x} exceed 4 bits",
            at()
        )));
    }

    let b0 = (monster.x << POSITION_SHIFT) | monster.kind.raw();
    if b0 == TERMINATOR {
        return Err(Error::new(
            ErrorCode::StopByteCollision,
            format!(
                "{}: a {} at column 0 encodes to the list terminator",
                at(),
                monster.kind
            ),
        ));
    }
    let b1 = (monster.y << POSITION_SHIFT) | (confirmation & LOW_CONFIRM_MASK);
    let facing = if monster.facing_left { FACING_BIT } else { 0 };
    let b2 = ((confirmation << 4) & HIGH_CONFIRM_BIT) | facing | monster.delay;

    Ok([b0, b1, b2])
}

pub(super) fn decode_monsters(image: &ProgramImage) -> Result<Vec<Vec<Monster>>> {
    let mut r = image.segment(Segment::Monsters)?.reader();
    let mut out = Vec::with_capacity(LEVEL_COUNT);

    for _ in 0..BOSS_LEVEL {
        let mut monsters = Vec::new();
        while r.peek_u8()? != TERMINATOR {
            monsters.push(decode_monster(r.read_array::<3>()?));
        }
        r.skip(1)?;
        out.push(monsters);
    }
    out.push(Vec::new());

    Ok(out)
}

/// Returns the stream bytes and the number of monsters written.
pub(super) fn encode_monsters(levels: &[Level]) -> Result<(Vec<u8>, usize)> {
    let mut bytes = Vec::new();
    let mut total = 0usize;

    for (idx, level) in levels.iter().enumerate() {
        if idx == BOSS_LEVEL {
            if !level.monsters.is_empty() {
                return Err(Error::budget(
                    "monsters on the final level",
                    level.monsters.len(),
                    0,
                ));
            }
            continue;
        }
        if level.monsters.len() > MAX_MONSTERS_PER_LEVEL {
            return Err(Error::budget(
                &format!("monsters on level {idx}"),
                level.monsters.len(),
                MAX_MONSTERS_PER_LEVEL,
            ));
        }
        for (i, monster) in level.monsters.iter().enumerate() {
            bytes.extend_from_slice(&encode_monster(idx, i, monster)?);
        }
        bytes.push(TERMINATOR);
        total += level.monsters.len();
    }

    if total > MAX_TOTAL_MONSTERS {
        return Err(Error::budget("monsters", total, MAX_TOTAL_MONSTERS));
    }

    Ok((bytes, total))
}

#[cfg(test)]
mod tests {
    use super::{decode_monster, encode_monster};
    use crate::error::ErrorCode;
    use crate::level::{Monster, MonsterKind};

    fn monster(kind: MonsterKind, x: u8, y: u8) -> Monster {
        Monster {
            kind,
            x,
            y,
            facing_left: true,
            delay: 42,
            confirmation_bits: Some(0b1010),
        }
    }

    #[test]
    fn confirmation_bits_are_split_across_two_bytes() {
        let bytes = encode_monster(0, 0, &monster(MonsterKind::Pulpul, 12, 7)).unwrap();
        assert_eq!(bytes, [12 << 3 | 3, 7 << 3 | 0b010, 0b1000_0000 | 0b0100_0000 | 42]);
        assert_eq!(decode_monster(bytes), monster(MonsterKind::Pulpul, 12, 7));
    }

    #[test]
    fn zen_chan_at_column_zero_collides_with_the_terminator() {
        let err = encode_monster(3, 1, &monster(MonsterKind::ZenChan, 0, 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::StopByteCollision);
        assert!(err.message.contains("level 3 monster 1"));
    }
}
