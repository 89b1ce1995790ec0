use crate::error::{Error, Result};
use crate::segments::{SEGMENT_TABLE, SegmentLocation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Address range covered by a segment, in absolute addresses.
pub fn address_range(loc: &SegmentLocation) -> ByteRange {
    ByteRange {
        start: loc.address as usize,
        end: loc.end_address(),
    }
}

/// Checks that the static segment table is self-consistent.
///
/// Two segments may only share bytes when they cover exactly the same
/// range and their masks are disjoint; that is how aliased bit-fields are
/// declared.
pub fn validate_segment_table(table: &[SegmentLocation]) -> Result<()> {
    if table.is_empty() {
        return Err(Error::malformed("segment table must contain at least one segment"));
    }

    for (idx, a) in table.iter().enumerate() {
        if a.length == 0 {
            return Err(Error::malformed(format!("segment {} is empty", a.name)));
        }
        if a.end_address() > 0x1_0000 {
            return Err(Error::malformed(format!(
                "segment {} runs past the 64K address space: ends at ${:X}",
                a.name,
                a.end_address()
            )));
        }
        let range_a = address_range(a);
        for b in table.iter().skip(idx + 1) {
            let range_b = address_range(b);
            if !range_a.overlaps(&range_b) {
                continue;
            }
            if range_a != range_b {
                return Err(Error::malformed(format!(
                    "segments {} (${:04X}..${:04X}) and {} (${:04X}..${:04X}) partially overlap",
                    a.name, range_a.start, range_a.end, b.name, range_b.start, range_b.end
                )));
            }
            if a.mask_or_full() & b.mask_or_full() != 0 {
                return Err(Error::malformed(format!(
                    "aliased segments {} and {} have overlapping masks ${:02X} and ${:02X}",
                    a.name,
                    b.name,
                    a.mask_or_full(),
                    b.mask_or_full()
                )));
            }
        }
    }

    Ok(())
}

pub fn validate_known_segment_table() -> Result<()> {
    validate_segment_table(&SEGMENT_TABLE)
}
