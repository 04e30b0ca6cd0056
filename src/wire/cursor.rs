//! Positional reads over a fixed byte buffer.

use thiserror::Error;

/// A read would run past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Read of {needed} bytes at offset {offset} exceeds buffer of {len} bytes.")]
pub struct OutOfBounds {
    pub offset: usize,
    pub needed: usize,
    pub len: usize,
}

/// A cursor over a borrowed byte buffer.
///
/// Sequential reads advance the cursor by their width. The `*_at` methods
/// read at an explicit offset and leave the cursor untouched. A failed read
/// never moves the cursor.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Create a cursor starting at `position`.
    pub fn at(bytes: &'a [u8], position: usize) -> Self {
        Self { bytes, position }
    }

    /// Offset of the next sequential read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Length of the whole buffer, regardless of position.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    /// Move the cursor forward without reading, failing past the end.
    pub fn skip(&mut self, n: usize) -> Result<(), OutOfBounds> {
        self.read_bytes(n).map(|_| ())
    }

    /// Look at the byte `offset` bytes past the cursor without moving it.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.position
            .checked_add(offset)
            .and_then(|i| self.bytes.get(i))
            .copied()
    }

    /// Read the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], OutOfBounds> {
        let bytes = self.bytes_at(self.position, n)?;
        self.position += n;
        Ok(bytes)
    }

    /// Read the next `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OutOfBounds> {
        let r = self.array_at(self.position)?;
        self.position += N;
        Ok(r)
    }

    /// Read the next byte.
    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Read the next two bytes as an integer of the given byte order.
    pub fn read_u16(&mut self, little_endian: bool) -> Result<u16, OutOfBounds> {
        let r = self.read_array()?;
        Ok(if little_endian {
            u16::from_le_bytes(r)
        } else {
            u16::from_be_bytes(r)
        })
    }

    /// Read the next four bytes as an integer of the given byte order.
    pub fn read_u32(&mut self, little_endian: bool) -> Result<u32, OutOfBounds> {
        let r = self.read_array()?;
        Ok(if little_endian {
            u32::from_le_bytes(r)
        } else {
            u32::from_be_bytes(r)
        })
    }

    /// The `n` bytes starting at `offset`.
    pub fn bytes_at(&self, offset: usize, n: usize) -> Result<&'a [u8], OutOfBounds> {
        let error = OutOfBounds {
            offset,
            needed: n,
            len: self.bytes.len(),
        };

        let end = offset.checked_add(n).ok_or(error)?;
        self.bytes.get(offset..end).ok_or(error)
    }

    /// The `N` bytes starting at `offset`, copied into an array.
    pub fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N], OutOfBounds> {
        let mut r = [0; N];
        r.copy_from_slice(self.bytes_at(offset, N)?);
        Ok(r)
    }

    /// The byte at `offset`.
    pub fn u8_at(&self, offset: usize) -> Result<u8, OutOfBounds> {
        self.array_at::<1>(offset).map(|[b]| b)
    }

    /// The two bytes at `offset` as an integer of the given byte order.
    pub fn u16_at(&self, offset: usize, little_endian: bool) -> Result<u16, OutOfBounds> {
        let r = self.array_at(offset)?;
        Ok(if little_endian {
            u16::from_le_bytes(r)
        } else {
            u16::from_be_bytes(r)
        })
    }

    /// The four bytes at `offset` as an integer of the given byte order.
    pub fn u32_at(&self, offset: usize, little_endian: bool) -> Result<u32, OutOfBounds> {
        let r = self.array_at(offset)?;
        Ok(if little_endian {
            u32::from_le_bytes(r)
        } else {
            u32::from_be_bytes(r)
        })
    }
}
