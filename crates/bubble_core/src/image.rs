//! The loaded program image and raw, mask-aware segment access.

use crate::error::{Error, Result};
use crate::layout::ByteRange;
use crate::reader::SegmentReader;
use crate::segments::{KNOWN_LOAD_ADDRESS, Segment, SegmentLocation, image_end_address};

/// Length of the little-endian load-address header in front of the payload.
pub const HEADER_LEN: usize = 2;

/// `(new & mask) | (original & !mask)`.
pub fn merge_byte(new: u8, original: u8, mask: u8) -> u8 {
    (new & mask) | (original & !mask)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    bytes: Vec<u8>,
}

impl ProgramImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::malformed(format!(
                "program image too short for its load address: {} bytes",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// An image of the known build's size with every payload byte zero.
    pub fn zeroed() -> Self {
        let payload = image_end_address() - KNOWN_LOAD_ADDRESS as usize;
        let mut bytes = vec![0u8; HEADER_LEN + payload];
        bytes[..HEADER_LEN].copy_from_slice(&KNOWN_LOAD_ADDRESS.to_le_bytes());
        Self { bytes }
    }

    pub fn load_address(&self) -> u16 {
        u16::from_le_bytes([self.bytes[0], self.bytes[1]])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.len() == HEADER_LEN
    }

    /// Buffer offset of an absolute address.
    pub fn offset_of(&self, address: usize) -> Result<usize> {
        let load = self.load_address() as usize;
        if address < load {
            return Err(Error::out_of_bounds(format!(
                "address ${address:04X} lies below the load address ${load:04X}"
            )));
        }
        Ok(address - load + HEADER_LEN)
    }

    /// Buffer range of a segment; fails if the image does not cover it.
    pub fn range_of(&self, loc: &SegmentLocation) -> Result<ByteRange> {
        let start = self.offset_of(loc.address as usize)?;
        let range = ByteRange {
            start,
            end: start + loc.length,
        };
        if range.end > self.bytes.len() {
            return Err(Error::out_of_bounds(format!(
                "segment {} (${:04X}, {} bytes) runs past the end of a {}-byte image",
                loc.name,
                loc.address,
                loc.length,
                self.bytes.len()
            )));
        }
        Ok(range)
    }

    pub fn segment(&self, segment: Segment) -> Result<SegmentView<'_>> {
        let loc = segment.location();
        let range = self.range_of(loc)?;
        Ok(SegmentView {
            loc,
            bytes: &self.bytes[range.start..range.end],
        })
    }

    pub fn segment_mut(&mut self, segment: Segment) -> Result<SegmentViewMut<'_>> {
        let loc = segment.location();
        let range = self.range_of(loc)?;
        Ok(SegmentViewMut {
            loc,
            bytes: &mut self.bytes[range.start..range.end],
        })
    }
}

fn out_of_bounds(loc: &SegmentLocation, start: usize, len: usize) -> Error {
    Error::out_of_bounds(format!(
        "reading out of bounds: segment {} has {} bytes, requested {}..{}",
        loc.name,
        loc.length,
        start,
        start + len
    ))
}

/// Read-only view of one segment. Every read applies the segment's mask.
#[derive(Debug, Clone, Copy)]
pub struct SegmentView<'a> {
    loc: &'static SegmentLocation,
    bytes: &'a [u8],
}

impl<'a> SegmentView<'a> {
    pub fn location(&self) -> &'static SegmentLocation {
        self.loc
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<u8> {
        self.bytes
            .get(index)
            .map(|b| b & self.loc.mask_or_full())
            .ok_or_else(|| out_of_bounds(self.loc, index, 1))
    }

    pub fn read(&self, start: usize, len: usize) -> Result<Vec<u8>> {
        let end = start.checked_add(len).ok_or_else(|| out_of_bounds(self.loc, start, len))?;
        let mask = self.loc.mask_or_full();
        self.bytes
            .get(start..end)
            .map(|slice| slice.iter().map(|b| b & mask).collect())
            .ok_or_else(|| out_of_bounds(self.loc, start, len))
    }

    /// Unmasked bytes, for callers that need to compare whole segments.
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn reader(&self) -> SegmentReader<'a> {
        SegmentReader::new(self.loc, self.bytes)
    }
}

/// Mutable view of one segment over the image's own storage. Writes merge
/// through the mask so bits owned by an aliased segment survive.
#[derive(Debug)]
pub struct SegmentViewMut<'a> {
    loc: &'static SegmentLocation,
    bytes: &'a mut [u8],
}

impl SegmentViewMut<'_> {
    pub fn location(&self) -> &'static SegmentLocation {
        self.loc
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<u8> {
        self.bytes
            .get(index)
            .map(|b| b & self.loc.mask_or_full())
            .ok_or_else(|| out_of_bounds(self.loc, index, 1))
    }

    pub fn set(&mut self, index: usize, value: u8) -> Result<()> {
        let mask = self.loc.mask_or_full();
        let slot = self
            .bytes
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(self.loc, index, 1))?;
        *slot = merge_byte(value, *slot, mask);
        Ok(())
    }

    pub fn write(&mut self, start: usize, data: &[u8]) -> Result<()> {
        let end = start + data.len();
        if end > self.bytes.len() {
            return Err(out_of_bounds(self.loc, start, data.len()));
        }
        let mask = self.loc.mask_or_full();
        for (slot, &value) in self.bytes[start..end].iter_mut().zip(data) {
            *slot = merge_byte(value, *slot, mask);
        }
        Ok(())
    }
}
