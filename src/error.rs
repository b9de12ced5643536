//! Error types
//!
//! Format mismatches are not errors: a foreign or truncated stream is a
//! `None` detection. Errors are reserved for broken GUID text (a bad
//! registry entry) and failed reads from the byte source.

use thiserror::Error;

/// Failure to build a [`Guid`](crate::guid::Guid) from text or bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuidFormatError {
    /// Text is not `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
    #[error("Invalid GUID format: {input:?}")]
    Format { input: String },

    /// Raw GUID bytes must be exactly 16 long
    #[error("GUID must be exactly 16 bytes, got {len}")]
    Length { len: usize },
}

/// Library error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Guid(#[from] GuidFormatError),

    #[error("Byte source read failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
