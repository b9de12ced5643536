//! CFBF detector - Identify the application behind a compound file.
//!
//! Reads two bounded peeks from a [`ByteSource`]: the 52-byte header prefix,
//! then the 16-byte CLSID of the root directory entry. The CLSID is matched
//! against [`CFBF_CLSIDS`] in table order.
//!
//! # Design
//!
//! - **No FAT walk**: the root entry is the first entry of the first
//!   directory sector, so its CLSID sits at a fixed offset computed from
//!   the header alone
//! - **Peek only**: the source position is never advanced, so other
//!   detectors can run over the same stream afterwards
//! - **Misses are not errors**: foreign, malformed or truncated input is
//!   `Ok(None)`; only read failures and broken registry text are `Err`

pub mod clsids;
pub mod header;

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::guid::{Guid, GuidCache};
use crate::source::ByteSource;

pub use clsids::{find_by_extension, ClsidRecord, CFBF_CLSIDS};
pub use header::{CfbfHeader, HeaderReject, CFBF_SIGNATURE, HEADER_PREFIX_LEN};

/// A recognized compound file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// Registry label, e.g. "Microsoft Excel 97-2003 Worksheet (Excel.Sheet.8)"
    pub name: &'static str,
    /// Canonical text of the matched CLSID
    pub clsid: &'static str,
    /// Lowercase extension without the dot
    #[serde(rename = "ext")]
    pub extension: &'static str,
    pub mime: &'static str,
}

impl From<&ClsidRecord> for Detection {
    fn from(record: &ClsidRecord) -> Self {
        Self {
            name: record.name,
            clsid: record.clsid,
            extension: record.extension,
            mime: record.mime,
        }
    }
}

/// Options for a detector
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    /// Give up when the CLSID window ends past this many bytes (None = no limit)
    pub max_lookahead: Option<u64>,
}

/// Compound File Binary detector
#[derive(Debug, Clone)]
pub struct CfbfDetector {
    options: DetectOptions,
    records: &'static [ClsidRecord],
    cache: Arc<GuidCache>,
}

impl Default for CfbfDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CfbfDetector {
    /// Identifier under which hosts register this detector
    pub const ID: &'static str = "cfbf";

    /// Detector over [`CFBF_CLSIDS`] with its own empty cache
    pub fn new() -> Self {
        Self::with_options(DetectOptions::default())
    }

    pub fn with_options(options: DetectOptions) -> Self {
        Self {
            options,
            records: CFBF_CLSIDS,
            cache: Arc::new(GuidCache::new()),
        }
    }

    /// Share a GUID cache with other detectors
    pub fn with_cache(mut self, cache: Arc<GuidCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Match against a different CLSID table
    pub fn with_records(mut self, records: &'static [ClsidRecord]) -> Self {
        self.records = records;
        self
    }

    pub fn cache(&self) -> &Arc<GuidCache> {
        &self.cache
    }

    pub fn records(&self) -> &'static [ClsidRecord] {
        self.records
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    /// Detect the document type of the compound file at the source position.
    ///
    /// The source position is left untouched. Read failures propagate as
    /// errors; everything that merely is not a known compound file is
    /// `Ok(None)`.
    pub async fn detect<S: ByteSource>(&self, source: &mut S) -> Result<Option<Detection>> {
        let mut prefix = [0u8; HEADER_PREFIX_LEN];
        let read = source.peek(&mut prefix).await?;

        let Some(header) = Self::check_header(&prefix[..read]) else {
            return Ok(None);
        };
        if !self.within_lookahead(&header) {
            return Ok(None);
        }

        let mut window = [0u8; Guid::LEN];
        let read = source.peek_at(header.clsid_offset(), &mut window).await?;
        if read < Guid::LEN {
            tracing::debug!(
                required = header.required_len(),
                position = source.position(),
                "CFBF stream truncated before root CLSID"
            );
            return Ok(None);
        }

        self.match_clsid(&window, 0)
    }

    /// Same as [`detect`](Self::detect) over an in-memory buffer starting at
    /// offset 0.
    pub fn detect_slice(&self, data: &[u8]) -> Result<Option<Detection>> {
        let Some(header) = Self::check_header(data) else {
            return Ok(None);
        };
        if !self.within_lookahead(&header) {
            return Ok(None);
        }

        if (data.len() as u64) < header.required_len() {
            tracing::debug!(
                required = header.required_len(),
                available = data.len(),
                "CFBF buffer truncated before root CLSID"
            );
            return Ok(None);
        }

        // Fits: the offset is below data.len()
        let offset = header.clsid_offset() as i64;
        self.match_clsid(data, offset)
    }

    fn check_header(prefix: &[u8]) -> Option<CfbfHeader> {
        match CfbfHeader::parse(prefix) {
            Ok(header) => {
                tracing::trace!(
                    sector_shift = header.sector_shift,
                    dir_start = header.dir_start,
                    clsid_offset = header.clsid_offset(),
                    "CFBF header accepted"
                );
                Some(header)
            }
            Err(reason) => {
                tracing::trace!(?reason, "Not a CFBF container");
                None
            }
        }
    }

    fn within_lookahead(&self, header: &CfbfHeader) -> bool {
        match self.options.max_lookahead {
            Some(max) if header.required_len() > max => {
                tracing::debug!(
                    required = header.required_len(),
                    max_lookahead = max,
                    "Root CLSID beyond lookahead limit"
                );
                false
            }
            _ => true,
        }
    }

    /// First registry record whose CLSID equals the 16 bytes at `offset`
    fn match_clsid(&self, buffer: &[u8], offset: i64) -> Result<Option<Detection>> {
        for record in self.records {
            let guid = self.cache.get_or_parse(record.clsid)?;
            if guid.matches_at(buffer, offset) {
                tracing::debug!(name = record.name, clsid = record.clsid, "CFBF root CLSID matched");
                return Ok(Some(Detection::from(record)));
            }
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            let seen = usize::try_from(offset)
                .ok()
                .and_then(|start| buffer.get(start..start + Guid::LEN))
                .and_then(|window| Guid::try_from(window).ok());
            if let Some(seen) = seen {
                tracing::debug!(clsid = %seen, "CFBF root CLSID not in registry");
            }
        }
        Ok(None)
    }
}
