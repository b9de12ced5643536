//! Minimal CFBF header view.
//!
//! Only the fields needed to locate the root directory entry are read:
//!
//! ```text
//! offset  len  field
//!      0    8  signature D0 CF 11 E0 A1 B1 1A E1
//!     30    1  sector shift (9 -> 512, 12 -> 4096)
//!     48    4  first directory sector, u32 LE
//! ```

/// OLE/CFB signature (DOCFILE)
pub const CFBF_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Bytes needed to read every field of [`CfbfHeader`]
pub const HEADER_PREFIX_LEN: usize = 52;

/// Fixed size of the compound file header
pub const HEADER_LEN: u64 = 512;

/// Offset of the CLSID field inside a 128-byte directory entry
pub const DIR_ENTRY_CLSID_OFFSET: u64 = 80;

/// End of a sector chain
pub const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFF_FFFF;

const SECTOR_SHIFT_OFFSET: usize = 30;
const DIR_START_OFFSET: usize = 48;

/// Why a prefix was rejected as a compound file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderReject {
    TooShort { len: usize },
    BadSignature,
    BadSectorShift { shift: u8 },
    NoDirectory { dir_start: u32 },
}

/// Projection over the first 52 bytes of a compound file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfbfHeader {
    pub sector_shift: u8,
    pub dir_start: u32,
}

impl CfbfHeader {
    /// Validate signature and geometry.
    ///
    /// A sentinel directory start (ENDOFCHAIN or FREESECT) is rejected: there
    /// is no directory sector to look at.
    pub fn parse(prefix: &[u8]) -> Result<Self, HeaderReject> {
        if prefix.len() < HEADER_PREFIX_LEN {
            return Err(HeaderReject::TooShort { len: prefix.len() });
        }

        if prefix[..8] != CFBF_SIGNATURE {
            return Err(HeaderReject::BadSignature);
        }

        let sector_shift = prefix[SECTOR_SHIFT_OFFSET];
        if sector_shift != 9 && sector_shift != 12 {
            return Err(HeaderReject::BadSectorShift {
                shift: sector_shift,
            });
        }

        let dir_start = u32::from_le_bytes([
            prefix[DIR_START_OFFSET],
            prefix[DIR_START_OFFSET + 1],
            prefix[DIR_START_OFFSET + 2],
            prefix[DIR_START_OFFSET + 3],
        ]);
        if dir_start >= ENDOFCHAIN {
            return Err(HeaderReject::NoDirectory { dir_start });
        }

        Ok(Self {
            sector_shift,
            dir_start,
        })
    }

    pub fn sector_size(&self) -> u64 {
        1u64 << self.sector_shift
    }

    /// Absolute offset of the root directory entry's CLSID.
    ///
    /// The root entry is the first entry of the first directory sector.
    /// Computed in u64: the largest directory start times 4096 exceeds u32.
    pub fn clsid_offset(&self) -> u64 {
        HEADER_LEN + u64::from(self.dir_start) * self.sector_size() + DIR_ENTRY_CLSID_OFFSET
    }

    /// Bytes that must be available for the CLSID window to be complete
    pub fn required_len(&self) -> u64 {
        self.clsid_offset() + 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(shift: u8, dir_start: u32) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_PREFIX_LEN];
        h[..8].copy_from_slice(&CFBF_SIGNATURE);
        h[30] = shift;
        h[48..52].copy_from_slice(&dir_start.to_le_bytes());
        h
    }

    #[test]
    fn test_parse_v3_header() {
        let header = CfbfHeader::parse(&prefix(9, 1)).unwrap();
        assert_eq!(header.sector_size(), 512);
        assert_eq!(header.clsid_offset(), 512 + 512 + 80);
        assert_eq!(header.required_len(), 512 + 512 + 96);
    }

    #[test]
    fn test_parse_v4_header() {
        let header = CfbfHeader::parse(&prefix(12, 3)).unwrap();
        assert_eq!(header.sector_size(), 4096);
        assert_eq!(header.clsid_offset(), 512 + 3 * 4096 + 80);
    }

    #[test]
    fn test_too_short() {
        let h = prefix(9, 0);
        assert_eq!(
            CfbfHeader::parse(&h[..51]),
            Err(HeaderReject::TooShort { len: 51 })
        );
        assert_eq!(CfbfHeader::parse(&[]), Err(HeaderReject::TooShort { len: 0 }));
    }

    #[test]
    fn test_bad_signature() {
        let mut h = prefix(9, 0);
        h[7] = 0xE0;
        assert_eq!(CfbfHeader::parse(&h), Err(HeaderReject::BadSignature));
    }

    #[test]
    fn test_bad_sector_shift() {
        for shift in [0u8, 7, 8, 10, 11, 13, 255] {
            assert_eq!(
                CfbfHeader::parse(&prefix(shift, 0)),
                Err(HeaderReject::BadSectorShift { shift })
            );
        }
    }

    #[test]
    fn test_sentinel_dir_start() {
        for dir_start in [ENDOFCHAIN, FREESECT] {
            assert_eq!(
                CfbfHeader::parse(&prefix(9, dir_start)),
                Err(HeaderReject::NoDirectory { dir_start })
            );
        }
    }

    #[test]
    fn test_high_dir_start_is_unsigned() {
        // 0x80000000 would be negative under signed 32-bit arithmetic
        let header = CfbfHeader::parse(&prefix(12, 0x8000_0000)).unwrap();
        assert_eq!(header.clsid_offset(), 512 + 0x8000_0000u64 * 4096 + 80);

        let header = CfbfHeader::parse(&prefix(12, 0xFFFF_FFFD)).unwrap();
        assert_eq!(header.clsid_offset(), 512 + 0xFFFF_FFFDu64 * 4096 + 80);
    }
}
