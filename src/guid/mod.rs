//! GUID codec - canonical text to Windows on-disk byte order
//!
//! Windows stores a GUID as a little-endian `u32`, two little-endian `u16`s
//! and eight raw bytes. The canonical text form writes all five groups
//! big-endian, so the first three groups are byte-reversed on disk:
//!
//! ```text
//! 00020906-0000-0000-C000-000000000046
//! 06 09 02 00  00 00  00 00  C0 00 00 00 00 00 00 46
//! ```

pub mod cache;

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::GuidFormatError;

pub use cache::GuidCache;

/// Length of the canonical text form (`8-4-4-4-12` plus four dashes)
const CANONICAL_LEN: usize = 36;

/// Byte positions of the dashes in the canonical text form
const DASH_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// A 16-byte GUID in Windows / CFBF on-disk order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid([u8; 16]);

impl Guid {
    pub const LEN: usize = 16;

    /// Wrap bytes that are already in on-disk order.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// On-disk bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Parse canonical GUID text into on-disk byte order.
    ///
    /// Hex digits may be upper or lower case. Anything else (braces,
    /// whitespace, misplaced dashes, wrong length) is rejected with
    /// [`GuidFormatError::Format`] carrying the input.
    pub fn parse(text: &str) -> Result<Self, GuidFormatError> {
        let invalid = || GuidFormatError::Format {
            input: text.to_string(),
        };

        let b = text.as_bytes();
        if b.len() != CANONICAL_LEN {
            return Err(invalid());
        }
        if DASH_POSITIONS.iter().any(|&pos| b[pos] != b'-') {
            return Err(invalid());
        }

        let mut out = [0u8; 16];
        hex::decode_to_slice(&b[0..8], &mut out[0..4]).map_err(|_| invalid())?;
        hex::decode_to_slice(&b[9..13], &mut out[4..6]).map_err(|_| invalid())?;
        hex::decode_to_slice(&b[14..18], &mut out[6..8]).map_err(|_| invalid())?;
        hex::decode_to_slice(&b[19..23], &mut out[8..10]).map_err(|_| invalid())?;
        hex::decode_to_slice(&b[24..36], &mut out[10..16]).map_err(|_| invalid())?;

        // First three groups are little-endian integers on disk
        out[0..4].reverse();
        out[4..6].reverse();
        out[6..8].reverse();

        Ok(Self(out))
    }

    /// Compare against the 16 bytes of `buffer` starting at `offset`.
    ///
    /// Returns false, never panics, when `offset` is negative or fewer than
    /// 16 bytes remain. The window is borrowed, not copied.
    #[inline]
    pub fn matches_at(&self, buffer: &[u8], offset: i64) -> bool {
        let Ok(start) = usize::try_from(offset) else {
            return false;
        };
        let Some(end) = start.checked_add(Self::LEN) else {
            return false;
        };
        match buffer.get(start..end) {
            Some(window) => window == self.0,
            None => false,
        }
    }

    fn data1(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    fn data2(&self) -> u16 {
        u16::from_le_bytes([self.0[4], self.0[5]])
    }

    fn data3(&self) -> u16 {
        u16::from_le_bytes([self.0[6], self.0[7]])
    }
}

impl FromStr for Guid {
    type Err = GuidFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&[u8]> for Guid {
    type Error = GuidFormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| GuidFormatError::Length { len: bytes.len() })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{}",
            self.data1(),
            self.data2(),
            self.data3(),
            self.0[8],
            self.0[9],
            hex::encode_upper(&self.0[10..16]),
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
