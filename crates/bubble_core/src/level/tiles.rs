use crate::error::{Error, Result};
use crate::image::ProgramImage;
use crate::segments::Segment;

use super::{
    Direction, LEVEL_COUNT, LEVEL_HEIGHT, LEVEL_WIDTH, Level, MAX_ASYMMETRIC_LEVELS, STORED_ROWS,
    TileGrid, WALL_COLUMNS,
};

const SYMMETRY_FLAG: u8 = 0x80;
const HALF_ROW_BYTES: usize = 2;
const FULL_ROW_BYTES: usize = 4;
const CURRENT_SHIFT: u32 = 30;

pub(super) struct DecodedTiles {
    pub tiles: TileGrid,
    pub row_currents: [Direction; LEVEL_HEIGHT],
}

pub(super) struct EncodedTiles {
    pub symmetry: Vec<u8>,
    pub tiles: Vec<u8>,
    pub edge_currents: Vec<u8>,
    pub asymmetric_levels: usize,
}

fn row_bits(row: &[bool; LEVEL_WIDTH]) -> u32 {
    row.iter()
        .fold(0u32, |acc, &solid| (acc << 1) | u32::from(solid))
}

pub(super) fn decode_tiles(image: &ProgramImage) -> Result<Vec<DecodedTiles>> {
    let symmetry = image.segment(Segment::Symmetry)?;
    let edges = image.segment(Segment::EdgeCurrents)?;
    let mut r = image.segment(Segment::Tiles)?.reader();

    let mut out = Vec::with_capacity(LEVEL_COUNT);
    for level in 0..LEVEL_COUNT {
        let symmetric = symmetry.get(level)? & SYMMETRY_FLAG != 0;
        let mut tiles = TileGrid::framed();
        let mut row_currents = [Direction::Up; LEVEL_HEIGHT];

        let edge = edges.get(level)?;
        row_currents[0] = Direction::from_bits(edge);
        row_currents[LEVEL_HEIGHT - 1] = Direction::from_bits(edge >> 2);

        for y in STORED_ROWS {
            let bits = if symmetric {
                let [hi, lo] = r.read_array::<HALF_ROW_BYTES>()?;
                u32::from(u16::from_be_bytes([hi, lo])) << 16
            } else {
                u32::from_be_bytes(r.read_array::<FULL_ROW_BYTES>()?)
            };

            // The current must come out before the wall bits are forced solid.
            row_currents[y] = Direction::from_bits((bits >> CURRENT_SHIFT) as u8);

            let stored_width = if symmetric {
                LEVEL_WIDTH / 2
            } else {
                LEVEL_WIDTH
            };
            for x in 0..stored_width {
                tiles.rows[y][x] = (bits >> (LEVEL_WIDTH - 1 - x)) & 1 == 1;
            }
            for x in WALL_COLUMNS {
                tiles.rows[y][x] = true;
            }
            if symmetric {
                for x in LEVEL_WIDTH / 2..LEVEL_WIDTH {
                    tiles.rows[y][x] = tiles.rows[y][LEVEL_WIDTH - 1 - x];
                }
            }
        }

        out.push(DecodedTiles {
            tiles,
            row_currents,
        });
    }

    Ok(out)
}

pub(super) fn encode_tiles(levels: &[Level]) -> Result<EncodedTiles> {
    let mut symmetry = Vec::with_capacity(LEVEL_COUNT);
    let mut tiles = Vec::new();
    let mut edge_currents = Vec::with_capacity(LEVEL_COUNT);
    let mut asymmetric_levels = 0usize;

    for level in levels {
        let symmetric = level.is_symmetric();
        if !symmetric {
            asymmetric_levels += 1;
        }
        symmetry.push(if symmetric { SYMMETRY_FLAG } else { 0 });
        edge_currents.push(
            level.row_currents[0].bits() | (level.row_currents[LEVEL_HEIGHT - 1].bits() << 2),
        );

        for y in STORED_ROWS {
            let bits = (row_bits(&level.tiles.rows[y]) & !(0b11 << CURRENT_SHIFT))
                | (u32::from(level.row_currents[y].bits()) << CURRENT_SHIFT);
            let bytes = bits.to_be_bytes();
            if symmetric {
                tiles.extend_from_slice(&bytes[..HALF_ROW_BYTES]);
            } else {
                tiles.extend_from_slice(&bytes);
            }
        }
    }

    if asymmetric_levels > MAX_ASYMMETRIC_LEVELS {
        return Err(Error::budget(
            "asymmetric levels",
            asymmetric_levels,
            MAX_ASYMMETRIC_LEVELS,
        ));
    }

    Ok(EncodedTiles {
        symmetry,
        tiles,
        edge_currents,
        asymmetric_levels,
    })
}

#[cfg(test)]
mod tests {
    use super::row_bits;

    #[test]
    fn column_zero_is_the_most_significant_bit() {
        let mut row = [false; 32];
        row[0] = true;
        row[31] = true;
        assert_eq!(row_bits(&row), 0x8000_0001);
    }
}
