//! Length-prefixed box primitives.
//!
//! Each box follows the standard layout: 4-byte size (big-endian u32),
//! 4-byte type (ASCII), then box-specific content. The same layout is used
//! for the `mdat` wrapper of fragment files and for the bootstrap index
//! (`abst`, `asrt`, `afrt`).

use crate::{Error, Result};
use bytes::BufMut;

/// Size of a box header: u32 length + 4-byte type.
pub const BOX_HEADER_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write a complete box: size (u32 BE) + type (4 ASCII bytes) + content.
///
/// The caller must keep `content` below `u32::MAX - 8` bytes.
pub fn write_box(box_type: &[u8; 4], content: &[u8]) -> Vec<u8> {
    debug_assert!(content.len() <= u32::MAX as usize - BOX_HEADER_SIZE);
    let size = (BOX_HEADER_SIZE + content.len()) as u32;
    let mut out = Vec::with_capacity(size as usize);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(box_type);
    out.extend_from_slice(content);
    out
}

/// Write only the 8-byte header of a box whose content is `content_len` bytes.
pub fn box_header(box_type: &[u8; 4], content_len: usize) -> Result<[u8; 8]> {
    let size = u32::try_from(content_len + BOX_HEADER_SIZE).map_err(|_| Error::Overflow {
        field: "box length",
        value: content_len as u64,
    })?;
    let mut header = [0u8; 8];
    header[..4].copy_from_slice(&size.to_be_bytes());
    header[4..].copy_from_slice(box_type);
    Ok(header)
}

/// Full box header: version (u8) + flags (u24).
pub fn fullbox_header(version: u8, flags: u32) -> [u8; 4] {
    let val = ((version as u32) << 24) | (flags & 0x00FF_FFFF);
    val.to_be_bytes()
}

/// Append the low 24 bits of `value`, big-endian.
pub fn put_u24<B: BufMut>(buf: &mut B, value: u32) {
    buf.put_u8((value >> 16) as u8);
    buf.put_u8((value >> 8) as u8);
    buf.put_u8(value as u8);
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A box located inside a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBox<'a> {
    /// Four-character type.
    pub box_type: [u8; 4],
    /// Content bytes (header excluded).
    pub content: &'a [u8],
}

/// Big-endian cursor over a byte slice with bounds checking.
#[derive(Debug, Clone)]
pub struct BoxReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BoxReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::BufferUnderflow {
                need: n,
                have: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_be_bytes(arr))
    }

    /// Read a NUL-terminated string, returning it without the terminator.
    pub fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::invalid_bootstrap("unterminated string"))?;
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    /// Read one complete box.
    pub fn read_box(&mut self) -> Result<RawBox<'a>> {
        let size = self.read_u32()? as usize;
        let box_type = self.take(4)?;
        if size < BOX_HEADER_SIZE {
            return Err(Error::invalid_bootstrap(format!(
                "box size {size} smaller than its header"
            )));
        }
        let content = self.take(size - BOX_HEADER_SIZE)?;
        Ok(RawBox {
            box_type: [box_type[0], box_type[1], box_type[2], box_type[3]],
            content,
        })
    }

    /// Read one box and require its type to be `expected`.
    pub fn expect_box(&mut self, expected: &[u8; 4]) -> Result<&'a [u8]> {
        let raw = self.read_box()?;
        if &raw.box_type != expected {
            return Err(Error::invalid_bootstrap(format!(
                "expected {} box, found {}",
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(&raw.box_type)
            )));
        }
        Ok(raw.content)
    }
}
