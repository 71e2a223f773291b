//! Bounds-checked big-endian reads over font program bytes.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutOfBounds;

impl fmt::Display for OutOfBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read past end of data")
    }
}

pub(crate) type ReadResult<T> = Result<T, OutOfBounds>;

/// Cursor over a byte slice. Every read either succeeds in full or fails
/// without advancing.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn at(data: &'a [u8], pos: usize) -> ReadResult<Self> {
        if pos > data.len() {
            return Err(OutOfBounds);
        }
        Ok(Self { data, pos })
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn skip(&mut self, n: usize) -> ReadResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> ReadResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(OutOfBounds)?;
        let slice = self.data.get(self.pos..end).ok_or(OutOfBounds)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> ReadResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_i8(&mut self) -> ReadResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub(crate) fn read_u16(&mut self) -> ReadResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i16(&mut self) -> ReadResult<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_i32(&mut self) -> ReadResult<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// F2Dot14 as used by TrueType component matrices.
    pub(crate) fn read_f2dot14(&mut self) -> ReadResult<f32> {
        Ok(self.read_i16()? as f32 / 16384.0)
    }

    /// Unsigned offset of 1 to 4 bytes, as in CFF INDEX structures.
    pub(crate) fn read_offset(&mut self, size: u8) -> ReadResult<u32> {
        if !(1..=4).contains(&size) {
            return Err(OutOfBounds);
        }
        let bytes = self.read_bytes(size as usize)?;
        Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }
}

/// `data[start..start + len]`, or `None` when the range leaves the buffer.
pub(crate) fn slice(data: &[u8], start: usize, len: usize) -> Option<&[u8]> {
    let end = start.checked_add(len)?;
    data.get(start..end)
}
