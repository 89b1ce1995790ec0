use crate::error::{Error, Result};
use crate::segments::SegmentLocation;

/// Sequential byte cursor over one segment's bytes.
pub struct SegmentReader<'a> {
    loc: &'static SegmentLocation,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SegmentReader<'a> {
    pub fn new(loc: &'static SegmentLocation, bytes: &'a [u8]) -> Self {
        Self { loc, bytes, pos: 0 }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| self.out_of_bounds(1))?;
        self.pos += 1;
        Ok(b & self.loc.mask_or_full())
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.bytes
            .get(self.pos)
            .map(|b| b & self.loc.mask_or_full())
            .ok_or_else(|| self.out_of_bounds(1))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        for slot in &mut out {
            *slot = self.read_u8()?;
        }
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        if self.pos + n > self.bytes.len() {
            return Err(self.out_of_bounds(n));
        }
        self.pos += n;
        Ok(())
    }

    fn out_of_bounds(&self, n: usize) -> Error {
        Error::out_of_bounds(format!(
            "reading out of bounds: segment {} has {} bytes, requested {}..{}",
            self.loc.name,
            self.loc.length,
            self.pos,
            self.pos + n
        ))
    }
}

/// MSB-first bit stream over a byte slice, for fields that straddle bytes.
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, bit_pos: 0 }
    }

    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.bytes.get(self.bit_pos / 8).ok_or_else(|| {
                Error::out_of_bounds(format!(
                    "reading out of bounds: bit {} of a {}-byte stream",
                    self.bit_pos,
                    self.bytes.len()
                ))
            })?;
            let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
            value = (value << 1) | bit as u32;
            self.bit_pos += 1;
        }
        Ok(value)
    }
}

#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_pos: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bits(&mut self, value: u32, count: u32) {
        for shift in (0..count).rev() {
            if self.bit_pos % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> shift) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (7 - (self.bit_pos % 8));
            }
            self.bit_pos += 1;
        }
    }

    /// Pads the stream with zero bits up to `len` bytes.
    pub fn finish(mut self, len: usize) -> Vec<u8> {
        self.bytes.resize(len.max(self.bytes.len()), 0);
        self.bytes
    }
}
