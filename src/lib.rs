//! cfbf-sniff Library
//!
//! Identifies the document type inside a legacy Compound File Binary
//! (OLE2 / Structured Storage) container - Word, Excel, PowerPoint, Visio,
//! Publisher or Windows Installer - from the CLSID of its root storage
//! entry, reading only a bounded prefix of the stream.
//!
//! # Features
//!
//! - **Two peeks**: the 52-byte header, then the 16-byte root CLSID
//! - **Non-consuming**: the source position never moves, so detectors can
//!   share one stream
//! - **Byte-exact GUIDs**: canonical text is converted to the Windows
//!   mixed-endian layout and cached per detector
//! - **Data-only registry**: new formats are one table entry
//!
//! # Example
//!
//! ```no_run
//! use cfbf_sniff::{CfbfDetector, FileSource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let detector = CfbfDetector::new();
//!     let mut source = FileSource::open("report.doc").await?;
//!
//!     if let Some(found) = detector.detect(&mut source).await? {
//!         println!("{} ({})", found.extension, found.mime);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod guid;
pub mod scan;
pub mod source;

// Re-export commonly used types
pub use config::Config;
pub use detect::{CfbfDetector, ClsidRecord, DetectOptions, Detection, CFBF_CLSIDS};
pub use error::{Error, GuidFormatError, Result};
pub use guid::{Guid, GuidCache};
pub use scan::{sniff_file, sniff_paths, ScanOptions, SniffReport};
pub use source::{ByteSource, FileSource, SliceSource, PEEK_STEP};
