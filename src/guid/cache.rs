//! Memoized GUID parsing
//!
//! Registry CLSIDs are stored as canonical text. Each detector owns a cache
//! so the text is parsed once per string, not once per detection call.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::Guid;
use crate::error::GuidFormatError;

/// Append-only map from canonical GUID text to parsed [`Guid`].
///
/// Keys are the exact input strings (case as supplied). Unbounded: the
/// registry is small and fixed. Failed parses are never stored.
#[derive(Debug, Default)]
pub struct GuidCache {
    entries: RwLock<HashMap<String, Guid>>,
}

impl GuidCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached GUID for `text`, parsing and storing it on first use.
    pub fn get_or_parse(&self, text: &str) -> Result<Guid, GuidFormatError> {
        if let Some(guid) = self.entries.read().get(text) {
            return Ok(*guid);
        }

        let guid = Guid::parse(text)?;
        // Two threads may race to insert the same key; both values are identical
        self.entries.write().entry(text.to_string()).or_insert(guid);
        tracing::trace!(guid = text, "Cached parsed GUID");
        Ok(guid)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.read().contains_key(text)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
