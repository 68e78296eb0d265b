//! Binary wire codec
//!
//! All integers are little-endian. Byte strings are written with a 16-bit
//! length prefix, so no single field may exceed 65535 bytes. The reader
//! consumes fields in exactly the order the writer produced them; that
//! pairing is the wire contract.

use crate::privilege::PrivilegeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A length-prefixed field was larger than the 16-bit prefix can express
    #[error("field of {0} bytes exceeds the 16-bit length prefix")]
    LengthLimitExceeded(usize),

    /// A read ran past the end of the buffer
    #[error("truncated data: needed {needed} bytes, {available} available")]
    TruncatedData { needed: usize, available: usize },
}

/// Append-only binary writer.
///
/// Owned by the caller during construction and consumed by [`ByteBuf::pack`],
/// which returns exactly the bytes written so far.
#[derive(Debug, Default)]
pub struct ByteBuf {
    buf: Vec<u8>,
}

impl ByteBuf {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Write a 16-bit integer, little-endian
    pub fn put_uint16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a 32-bit integer, little-endian
    pub fn put_uint32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a 16-bit length prefix followed by the raw bytes
    pub fn put_bytes(&mut self, raw: &[u8]) -> Result<(), CodecError> {
        if raw.len() > usize::from(u16::MAX) {
            return Err(CodecError::LengthLimitExceeded(raw.len()));
        }
        self.put_uint16(raw.len() as u16);
        self.buf.extend_from_slice(raw);
        Ok(())
    }

    /// Write a string as length-prefixed UTF-8 bytes
    pub fn put_string(&mut self, s: &str) -> Result<(), CodecError> {
        self.put_bytes(s.as_bytes())
    }

    /// Write a privilege map: a 16-bit entry count, then (16-bit id,
    /// 32-bit expiry) pairs in ascending id order
    pub fn put_privilege_map(&mut self, map: &PrivilegeMap) -> Result<(), CodecError> {
        if map.len() > usize::from(u16::MAX) {
            return Err(CodecError::LengthLimitExceeded(map.len()));
        }
        self.put_uint16(map.len() as u16);
        for (id, expire_ts) in map.iter() {
            self.put_uint16(id);
            self.put_uint32(expire_ts);
        }
        Ok(())
    }

    /// Consume the writer and return the bytes written
    pub fn pack(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor reader over a borrowed buffer, the mirror image of [`ByteBuf`].
#[derive(Debug)]
pub struct ReadByteBuf<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ReadByteBuf<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let available = self.bytes.len() - self.position;
        if n > available {
            return Err(CodecError::TruncatedData {
                needed: n,
                available,
            });
        }
        let out = &self.bytes[self.position..self.position + n];
        self.position += n;
        Ok(out)
    }

    pub fn get_uint16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn get_uint32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 16-bit length prefix, then that many raw bytes
    pub fn get_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = usize::from(self.get_uint16()?);
        Ok(self.take(len)?.to_vec())
    }

    /// Read a privilege map written by [`ByteBuf::put_privilege_map`]
    pub fn get_privilege_map(&mut self) -> Result<PrivilegeMap, CodecError> {
        let count = self.get_uint16()?;
        let mut map = PrivilegeMap::new();
        for _ in 0..count {
            let id = self.get_uint16()?;
            let expire_ts = self.get_uint32()?;
            map.insert_raw(id, expire_ts);
        }
        Ok(map)
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }
}
