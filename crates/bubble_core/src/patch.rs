//! Patch-merge engine: serialized segment data becomes a list of masked
//! write operations merged into a fresh copy of the original image.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::image::{ProgramImage, merge_byte};
use crate::segments::Segment;

/// Freshly serialized bytes for (part of) one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentData {
    pub segment: Segment,
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl SegmentData {
    pub fn new(segment: Segment, bytes: Vec<u8>) -> Self {
        Self::at(segment, 0, bytes)
    }

    pub fn at(segment: Segment, offset: usize, bytes: Vec<u8>) -> Self {
        Self {
            segment,
            offset,
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOp {
    pub segment: Segment,
    pub address: usize,
    pub bytes: Vec<u8>,
    pub mask: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segment_data(data: impl IntoIterator<Item = SegmentData>) -> Result<Self> {
        let mut patch = Self::new();
        patch.extend(data)?;
        Ok(patch)
    }

    /// Adds one write, rejecting data that does not fit its segment.
    pub fn push(&mut self, data: SegmentData) -> Result<()> {
        let loc = data.segment.location();
        let end = data.offset + data.bytes.len();
        if end > loc.length {
            return Err(Error::out_of_bounds(format!(
                "writing out of bounds: segment {} has {} bytes, write covers {}..{}",
                loc.name, loc.length, data.offset, end
            )));
        }
        self.ops.push(PatchOp {
            segment: data.segment,
            address: loc.address as usize + data.offset,
            bytes: data.bytes,
            mask: loc.mask_or_full(),
        });
        Ok(())
    }

    pub fn extend(&mut self, data: impl IntoIterator<Item = SegmentData>) -> Result<()> {
        for item in data {
            self.push(item)?;
        }
        Ok(())
    }

    pub fn segments(&self) -> BTreeSet<Segment> {
        self.ops.iter().map(|op| op.segment).collect()
    }

    /// Keeps only the writes that target one of `selection`.
    pub fn restricted_to(mut self, selection: &[Segment]) -> Self {
        self.ops.retain(|op| selection.contains(&op.segment));
        self
    }

    /// Merges every operation into a copy of `original`; `original` itself
    /// is never touched.
    pub fn apply(&self, original: &ProgramImage) -> Result<ProgramImage> {
        let mut bytes = original.as_bytes().to_vec();
        let mut changed = 0usize;

        for op in &self.ops {
            let start = original.offset_of(op.address)?;
            let end = start + op.bytes.len();
            if end > bytes.len() {
                return Err(Error::out_of_bounds(format!(
                    "patch for {} at ${:04X} ends at offset {end}, image has {} bytes",
                    op.segment,
                    op.address,
                    bytes.len()
                )));
            }
            for (slot, &value) in bytes[start..end].iter_mut().zip(&op.bytes) {
                let merged = merge_byte(value, *slot, op.mask);
                if merged != *slot {
                    changed += 1;
                }
                *slot = merged;
            }
        }

        debug!(ops = self.ops.len(), changed, "applied patch");
        ProgramImage::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{Patch, SegmentData};
    use crate::image::ProgramImage;
    use crate::segments::Segment;

    #[test]
    fn masked_write_keeps_bits_outside_the_mask() {
        let mut original = ProgramImage::zeroed();
        original
            .segment_mut(Segment::BgColors)
            .unwrap()
            .write(0, &[0xFF])
            .unwrap();

        let patch =
            Patch::from_segment_data([SegmentData::at(Segment::Symmetry, 0, vec![0x00])]).unwrap();
        let patched = patch.apply(&original).unwrap();
        assert_eq!(patched, original);

        let patch =
            Patch::from_segment_data([SegmentData::at(Segment::SidebarIndex, 0, vec![0xFF])])
                .unwrap();
        let patched = patch.apply(&original).unwrap();
        assert_eq!(patched.segment(Segment::SidebarIndex).unwrap().get(0).unwrap(), 0x7F);
        assert_eq!(patched.segment(Segment::Symmetry).unwrap().get(0).unwrap(), 0x00);
    }

    #[test]
    fn oversized_write_is_rejected() {
        let err = Patch::from_segment_data([SegmentData::at(
            Segment::BonusColors,
            1,
            vec![1, 2],
        )])
        .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::OutOfBounds);
    }
}
