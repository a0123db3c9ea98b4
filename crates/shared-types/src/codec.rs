//! # Canonical Encoding
//!
//! Fixed-width integers are little-endian, hashes are raw bytes, and
//! variable-length fields are CompactSize-prefixed:
//!
//! | First byte | Value range | Total size |
//! |------------|-------------|------------|
//! | `< 0xfd` | 0..=0xfc | 1 |
//! | `0xfd` | u16 | 3 |
//! | `0xfe` | u32 | 5 |
//! | `0xff` | u64 | 9 |

use crate::errors::DecodeError;
use crate::hash::{double_hash, Hash};
use shared_crypto::DoubleSha256;

/// Which serialization to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    /// Full bytes for storage and transport.
    Wire,
    /// Prunable fields replaced by their hashes.
    Hashing,
}

/// Infallible byte sink for encoders.
pub trait Sink {
    /// Append bytes.
    fn put(&mut self, bytes: &[u8]);
}

impl Sink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl Sink for DoubleSha256 {
    fn put(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

/// Write a CompactSize varint.
pub fn write_varint<S: Sink + ?Sized>(sink: &mut S, n: u64) {
    if n < 0xfd {
        sink.put(&[n as u8]);
    } else if n <= u16::MAX as u64 {
        sink.put(&[0xfd]);
        sink.put(&(n as u16).to_le_bytes());
    } else if n <= u32::MAX as u64 {
        sink.put(&[0xfe]);
        sink.put(&(n as u32).to_le_bytes());
    } else {
        sink.put(&[0xff]);
        sink.put(&n.to_le_bytes());
    }
}

/// Write `varint(len) ++ bytes`.
pub fn write_varbytes<S: Sink + ?Sized>(sink: &mut S, bytes: &[u8]) {
    write_varint(sink, bytes.len() as u64);
    sink.put(bytes);
}

/// Write a prunable field.
///
/// In hashing mode a non-empty field becomes `varbytes(sha256d(bytes))`;
/// an empty field stays empty in both modes.
pub fn write_prunable<S: Sink + ?Sized>(sink: &mut S, bytes: &[u8], mode: EncodeMode) {
    match mode {
        EncodeMode::Wire => write_varbytes(sink, bytes),
        EncodeMode::Hashing if bytes.is_empty() => write_varint(sink, 0),
        EncodeMode::Hashing => write_varbytes(sink, double_hash(bytes).as_bytes()),
    }
}

/// Cursor over wire bytes.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fail if any input is left over.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }

    /// Consume exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a raw 32-byte hash.
    pub fn read_hash(&mut self) -> Result<Hash, DecodeError> {
        Ok(Hash(self.read_array()?))
    }

    /// Read a canonical CompactSize varint.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (n, min) = match self.read_u8()? {
            0xfd => (u16::from_le_bytes(self.read_array()?) as u64, 0xfd),
            0xfe => (u32::from_le_bytes(self.read_array()?) as u64, 0x1_0000),
            0xff => (self.read_u64()?, 0x1_0000_0000),
            b => return Ok(b as u64),
        };
        if n < min {
            return Err(DecodeError::NonCanonicalVarint(n));
        }
        Ok(n)
    }

    /// Read a varint used as a length or count, bounded by the remaining input.
    pub fn read_len(&mut self) -> Result<usize, DecodeError> {
        let n = self.read_varint()?;
        if n > self.remaining() as u64 {
            return Err(DecodeError::LengthOverflow(n));
        }
        Ok(n as usize)
    }

    /// Read `varint(len) ++ bytes`.
    pub fn read_varbytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let len = self.read_len()?;
        Ok(self.read_bytes(len)?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn varint_bytes(n: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_varint(&mut buf, n);
        buf
    }

    #[test]
    fn test_varint_boundaries() {
        assert_eq!(varint_bytes(0xfc), vec![0xfc]);
        assert_eq!(varint_bytes(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(varint_bytes(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(varint_bytes(u64::MAX).len(), 9);
    }

    #[test]
    fn test_non_canonical_varint_rejected() {
        let mut r = Reader::new(&[0xfd, 0x10, 0x00]);
        assert_eq!(r.read_varint(), Err(DecodeError::NonCanonicalVarint(0x10)));
    }

    #[test]
    fn test_truncated_input() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert_eq!(
            r.read_u32(),
            Err(DecodeError::UnexpectedEof {
                needed: 4,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_length_prefix_larger_than_input() {
        let mut r = Reader::new(&[0x05, 1, 2]);
        assert_eq!(r.read_varbytes(), Err(DecodeError::LengthOverflow(5)));
    }

    #[test]
    fn test_prunable_modes() {
        let mut wire = Vec::new();
        write_prunable(&mut wire, b"sig", EncodeMode::Wire);
        assert_eq!(wire, vec![3, b's', b'i', b'g']);

        let mut hashed = Vec::new();
        write_prunable(&mut hashed, b"sig", EncodeMode::Hashing);
        assert_eq!(hashed[0], 32);
        assert_eq!(&hashed[1..], double_hash(b"sig").as_bytes());

        let mut empty = Vec::new();
        write_prunable(&mut empty, b"", EncodeMode::Hashing);
        assert_eq!(empty, vec![0]);
    }

    proptest! {
        #[test]
        fn prop_varint_decodes_to_same_value(n in any::<u64>()) {
            let bytes = varint_bytes(n);
            let mut r = Reader::new(&bytes);
            prop_assert_eq!(r.read_varint().unwrap(), n);
            prop_assert!(r.finish().is_ok());
        }
    }
}
